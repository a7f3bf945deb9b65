use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IoContext, PluginError, Result};
use crate::plugin::remote::DEFAULT_REGISTRY_URL;

const CONFIG_FILE: &str = "config.toml";

pub const REGISTRY_ENV: &str = "CLAUDE_PLUGINS_REGISTRY";
pub const INTEGRATION_DIR_ENV: &str = "CLAUDE_PLUGINS_INTEGRATION_DIR";

/// Integration directory relative to the working directory when unset
pub const DEFAULT_INTEGRATION_DIR: &str = "dadam-ai-agent/backend/plugins";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# claude-plugins configuration file
# Location: ~/.claude-plugins/config.toml

[registry]
# Remote plugin registry used by install/info/list --all/search
# Default: https://registry.claude-plugins.dev
# url = "https://registry.claude-plugins.dev"

[integration]
# Directory receiving the generated integration.py
# Relative paths are resolved against the current directory
# Default: dadam-ai-agent/backend/plugins
# output_dir = "dadam-ai-agent/backend/plugins"

[dependencies]
# Install declared Python dependencies after a plugin is installed
enabled = true
# Package installer executable
pip = "pip"

[install]
# Directories skipped when copying a local plugin
exclude = [".git"]
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub integration: IntegrationConfig,
    #[serde(default)]
    pub dependencies: DependenciesConfig,
    #[serde(default)]
    pub install: InstallConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RegistryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct IntegrationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependenciesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_pip")]
    pub pip: String,
}

impl Default for DependenciesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pip: default_pip(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstallConfig {
    /// Directories to exclude
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_pip() -> String {
    "pip".to_string()
}

fn default_exclude() -> Vec<String> {
    vec![".git".to_string()]
}

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).at(&path)?;
        let config: Config = toml::from_str(&content).map_err(|e| PluginError::Config {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir).at(base_dir)?;

        let content = toml::to_string_pretty(self).map_err(|e| PluginError::Config {
            path: path.clone(),
            message: e.to_string(),
        })?;

        fs::write(&path, content).at(&path)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir).at(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE).at(&path)?;
        }

        Ok(path)
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        self.list()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "registry.url" => {
                self.registry.url = non_empty(value);
                Ok(())
            }
            "integration.output_dir" => {
                self.integration.output_dir = non_empty(value).map(PathBuf::from);
                Ok(())
            }
            "dependencies.enabled" => {
                self.dependencies.enabled = parse_bool(key, value)?;
                Ok(())
            }
            "dependencies.pip" => {
                self.dependencies.pip = non_empty(value).unwrap_or_else(default_pip);
                Ok(())
            }
            "install.exclude" => {
                self.install.exclude = parse_string_list(value);
                Ok(())
            }
            _ => Err(PluginError::ConfigKeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            (
                "registry.url".to_string(),
                self.registry.url.clone().unwrap_or_default(),
            ),
            (
                "integration.output_dir".to_string(),
                self.integration
                    .output_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
            (
                "dependencies.enabled".to_string(),
                self.dependencies.enabled.to_string(),
            ),
            ("dependencies.pip".to_string(), self.dependencies.pip.clone()),
            (
                "install.exclude".to_string(),
                format!("{:?}", self.install.exclude),
            ),
        ]
    }

    /// Registry URL: explicit override, then config, then environment, then default
    pub fn registry_url(&self, override_url: Option<&str>) -> String {
        override_url
            .map(str::to_string)
            .or_else(|| self.registry.url.clone())
            .or_else(|| std::env::var(REGISTRY_ENV).ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string())
    }

    /// Directory receiving integration.py
    pub fn integration_dir(&self, cwd: &Path) -> PathBuf {
        let configured = self.integration.output_dir.clone().or_else(|| {
            std::env::var(INTEGRATION_DIR_ENV)
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        });

        match configured {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => cwd.join(dir),
            None => cwd.join(DEFAULT_INTEGRATION_DIR),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(PluginError::ConfigValue {
            key: key.to_string(),
            message: format!("expected true or false, got '{}'", other),
        }),
    }
}

/// Parse a comma-separated or JSON-like list string
fn parse_string_list(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    inner
        .split(',')
        .map(|s| s.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
