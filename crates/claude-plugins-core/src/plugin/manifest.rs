//! Plugin manifest parsing and validation for plugin.json
//!
//! The file is parsed leniently into [`RawManifest`] so that a missing
//! mandatory field is reported by name instead of as a JSON error.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::{IoContext, PluginError, Result};
use crate::plugin::types::{PluginManifest, PluginTool};

pub const MANIFEST_FILE: &str = "plugin.json";

static PLUGIN_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").expect("valid regex"));

/// plugin.json as found on disk, before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawManifest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub license: Option<String>,
    pub homepage: Option<String>,
    pub repository: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub tools: Option<Vec<PluginTool>>,
    pub dependencies: Option<BTreeMap<String, String>>,
    pub entry_point: Option<String>,
    pub python_version: Option<String>,
}

impl RawManifest {
    /// Parse plugin.json contents
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| PluginError::invalid(format!("{} is not valid JSON: {}", MANIFEST_FILE, e)))
    }

    /// Read plugin.json from a plugin directory
    ///
    /// Returns `Ok(None)` when the directory has no manifest file.
    pub fn load(plugin_dir: &Path) -> Result<Option<Self>> {
        let path = manifest_path(plugin_dir);
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).at(&path)?;
        Self::parse(&content).map(Some)
    }
}

/// Path of the manifest inside a plugin directory
pub fn manifest_path(plugin_dir: &Path) -> PathBuf {
    plugin_dir.join(MANIFEST_FILE)
}

/// Check if a directory carries a manifest
pub fn exists(plugin_dir: &Path) -> bool {
    manifest_path(plugin_dir).is_file()
}

/// Check a plugin id against `^[a-z0-9-]+$`
pub fn is_valid_id(id: &str) -> bool {
    PLUGIN_ID_PATTERN.is_match(id)
}

/// Validate a raw manifest
///
/// - `id`, `name`, `version`, `description`, `author`, `entryPoint` must be
///   present and non-empty; the first missing one is named
/// - `id` must match `^[a-z0-9-]+$`
/// - absent `tools` becomes an empty list
pub fn validate(raw: RawManifest) -> Result<PluginManifest> {
    let id = required(raw.id, "id")?;
    let name = required(raw.name, "name")?;
    let version = required(raw.version, "version")?;
    let description = required(raw.description, "description")?;
    let author = required(raw.author, "author")?;
    let entry_point = required(raw.entry_point, "entryPoint")?;

    if !is_valid_id(&id) {
        return Err(PluginError::invalid(format!(
            "plugin id '{}' must contain only lowercase letters, numbers, and hyphens",
            id
        )));
    }

    Ok(PluginManifest {
        id,
        name,
        version,
        description,
        author,
        license: raw.license.unwrap_or_default(),
        homepage: raw.homepage,
        repository: raw.repository,
        keywords: raw.keywords,
        tools: raw.tools.unwrap_or_default(),
        dependencies: raw.dependencies,
        entry_point,
        python_version: raw.python_version,
    })
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(PluginError::invalid(format!(
            "manifest is missing required field '{}'",
            field
        ))),
    }
}

/// Load and validate plugin.json from a plugin directory
///
/// A missing manifest is reported as `InvalidPlugin`; resolvers that treat
/// it differently check [`exists`] first.
pub fn load_validated(plugin_dir: &Path) -> Result<PluginManifest> {
    let raw = RawManifest::load(plugin_dir)?.ok_or_else(|| {
        PluginError::invalid(format!(
            "{} not found in {}",
            MANIFEST_FILE,
            plugin_dir.display()
        ))
    })?;
    validate(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn complete() -> RawManifest {
        RawManifest {
            id: Some("my-plugin-2".to_string()),
            name: Some("My Plugin".to_string()),
            version: Some("1.0.0".to_string()),
            description: Some("Does things".to_string()),
            author: Some("Dadam".to_string()),
            entry_point: Some("main.py".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_lowercase_hyphenated_id() {
        let manifest = validate(complete()).unwrap();
        assert_eq!(manifest.id, "my-plugin-2");
        assert!(manifest.tools.is_empty());
        assert_eq!(manifest.license, "");
    }

    #[test]
    fn rejects_uppercase_and_underscore_id() {
        let raw = RawManifest {
            id: Some("My_Plugin".to_string()),
            ..complete()
        };
        let err = validate(raw).unwrap_err();
        assert!(matches!(err, PluginError::InvalidPlugin { .. }));
    }

    #[test]
    fn rejects_missing_entry_point() {
        let raw = RawManifest {
            entry_point: None,
            ..complete()
        };
        let err = validate(raw).unwrap_err();
        assert!(err.to_string().contains("entryPoint"));
    }

    #[test]
    fn rejects_empty_mandatory_field() {
        let raw = RawManifest {
            author: Some("  ".to_string()),
            ..complete()
        };
        let err = validate(raw).unwrap_err();
        assert!(err.to_string().contains("'author'"));
    }

    #[test]
    fn names_first_missing_field() {
        let raw = RawManifest {
            name: None,
            entry_point: None,
            ..complete()
        };
        let err = validate(raw).unwrap_err();
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn id_pattern() {
        assert!(is_valid_id("abc-123"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("abc.def"));
        assert!(!is_valid_id("abc/def"));
        assert!(!is_valid_id("Abc"));
    }

    #[test]
    fn parse_ignores_unknown_keys() {
        let raw = RawManifest::parse(
            r#"{"id": "x", "main": "index.js", "tools": [{"name": "t"}]}"#,
        )
        .unwrap();
        assert_eq!(raw.id.as_deref(), Some("x"));
        assert_eq!(raw.tools.unwrap()[0].name, "t");
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let err = RawManifest::parse("{ not json").unwrap_err();
        assert!(matches!(err, PluginError::InvalidPlugin { .. }));
    }

    #[test]
    fn load_from_directory() {
        let temp = TempDir::new().unwrap();
        assert!(!exists(temp.path()));
        assert!(RawManifest::load(temp.path()).unwrap().is_none());
        assert!(load_validated(temp.path()).is_err());

        fs::write(
            temp.path().join(MANIFEST_FILE),
            r#"{"id": "sample-tool", "name": "Sample", "version": "1.0.0",
                "description": "d", "author": "a", "entryPoint": "main.py"}"#,
        )
        .unwrap();

        assert!(exists(temp.path()));
        let manifest = load_validated(temp.path()).unwrap();
        assert_eq!(manifest.id, "sample-tool");
    }
}
