//! Plugin type definitions
//!
//! Types for plugin manifests, installed plugin records, the per-scope
//! registry document and remote registry entries.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Current schema version of `registry.json`
pub const REGISTRY_SCHEMA_VERSION: &str = "1.0.0";

/// Installation scope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Project scope (<cwd>/.claude-plugins)
    #[default]
    Local,
    /// User scope (~/.claude-plugins)
    Global,
}

impl Scope {
    /// Lookup order used by commands that search both scopes
    pub const SEARCH_ORDER: [Scope; 2] = [Scope::Local, Scope::Global];

    pub fn from_global_flag(global: bool) -> Self {
        if global {
            Self::Global
        } else {
            Self::Local
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Local => "Local (project)",
            Self::Global => "Global",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Global => write!(f, "global"),
        }
    }
}

/// A tool exposed by a plugin
///
/// `input_schema` is kept as the raw JSON from plugin.json so every key
/// reaches `registry.json` and the integration descriptor untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginTool {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_input_schema")]
    pub input_schema: Value,
}

impl Default for PluginTool {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            input_schema: empty_input_schema(),
        }
    }
}

fn empty_input_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// Display view of one schema property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParameter {
    pub name: String,
    /// `type` rendered as text; union types are joined with `|`
    pub kind: String,
    pub description: String,
    pub required: bool,
}

impl PluginTool {
    /// Top-level properties of the input schema, sorted by name
    pub fn parameters(&self) -> Vec<ToolParameter> {
        let Some(properties) = self.input_schema.get("properties").and_then(Value::as_object)
        else {
            return Vec::new();
        };
        let required: Vec<&str> = self
            .input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        properties
            .iter()
            .map(|(name, prop)| ToolParameter {
                name: name.clone(),
                kind: schema_type_label(prop.get("type")),
                description: prop
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                required: required.contains(&name.as_str()),
            })
            .collect()
    }
}

fn schema_type_label(kind: Option<&Value>) -> String {
    match kind {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(kinds)) => kinds
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("|"),
        _ => "any".to_string(),
    }
}

/// Validated plugin manifest (plugin.json)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    #[serde(default)]
    pub license: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub tools: Vec<PluginTool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<BTreeMap<String, String>>,
    pub entry_point: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,
}

impl PluginManifest {
    /// Declared dependencies, `None` when absent or empty
    pub fn declared_dependencies(&self) -> Option<&BTreeMap<String, String>> {
        self.dependencies.as_ref().filter(|d| !d.is_empty())
    }
}

/// Installed plugin record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledPlugin {
    pub manifest: PluginManifest,
    pub installed_at: DateTime<Utc>,
    pub path: PathBuf,
    pub enabled: bool,
}

impl InstalledPlugin {
    pub fn id(&self) -> &str {
        &self.manifest.id
    }
}

/// registry.json structure (one per scope)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    pub version: String,
    #[serde(default)]
    pub plugins: BTreeMap<String, InstalledPlugin>,
    pub last_updated: DateTime<Utc>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            version: REGISTRY_SCHEMA_VERSION.to_string(),
            plugins: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

/// Plugin entry served by the remote registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePluginInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub rating: f64,
    pub tarball_url: String,
    /// Hex encoded SHA-256 of the archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub manifest: PluginManifest,
}

/// Remote plugin annotated with local installation status
#[derive(Debug, Clone)]
pub struct AvailablePlugin {
    pub info: RemotePluginInfo,
    pub installed_local: bool,
    pub installed_global: bool,
}

impl AvailablePlugin {
    pub fn is_installed(&self) -> bool {
        self.installed_local || self.installed_global
    }
}
