//! Remote plugin registry client
//!
//! Endpoints, relative to the registry base URL:
//! - `GET /api/plugins/{id}[@version]` single plugin, 404 when unknown
//! - `GET /api/plugins` full index
//!
//! Archives are downloaded from the entry's `tarballUrl`.

use std::fs;
use std::path::Path;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{IoContext, PluginError, Result};
use crate::plugin::types::{AvailablePlugin, RemotePluginInfo};

pub const DEFAULT_REGISTRY_URL: &str = "https://registry.claude-plugins.dev";

/// Access to a remote plugin index
pub trait RegistryClient {
    /// Look up a single plugin; `Ok(None)` when the registry has no entry
    fn fetch_plugin(
        &self,
        base_url: &str,
        id: &str,
        version: Option<&str>,
    ) -> Result<Option<RemotePluginInfo>>;

    /// Fetch the full plugin index
    fn fetch_all(&self, base_url: &str) -> Result<Vec<RemotePluginInfo>>;

    /// Download `url` into the file at `dest`
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// URL of a single plugin entry
pub fn plugin_url(base_url: &str, id: &str, version: Option<&str>) -> String {
    let base = base_url.trim_end_matches('/');
    match version {
        Some(v) => format!("{}/api/plugins/{}@{}", base, id, v),
        None => format!("{}/api/plugins/{}", base, id),
    }
}

/// URL of the plugin index
pub fn index_url(base_url: &str) -> String {
    format!("{}/api/plugins", base_url.trim_end_matches('/'))
}

/// RegistryClient speaking HTTP
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    client: Client,
}

impl HttpRegistryClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("claude-plugins/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PluginError::fetch("registry", format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        debug!(url, "GET");
        self.client
            .get(url)
            .send()
            .map_err(|e| PluginError::fetch(url, e.to_string()))
    }
}

impl RegistryClient for HttpRegistryClient {
    fn fetch_plugin(
        &self,
        base_url: &str,
        id: &str,
        version: Option<&str>,
    ) -> Result<Option<RemotePluginInfo>> {
        let url = plugin_url(base_url, id, version);
        let response = self.get(&url)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(PluginError::fetch(&url, format!("HTTP {}", response.status())));
        }

        let info = response
            .json::<RemotePluginInfo>()
            .map_err(|e| PluginError::fetch(&url, format!("invalid registry response: {}", e)))?;
        Ok(Some(info))
    }

    fn fetch_all(&self, base_url: &str) -> Result<Vec<RemotePluginInfo>> {
        let url = index_url(base_url);
        let response = self.get(&url)?;

        if !response.status().is_success() {
            return Err(PluginError::fetch(&url, format!("HTTP {}", response.status())));
        }

        response
            .json::<Vec<RemotePluginInfo>>()
            .map_err(|e| PluginError::fetch(&url, format!("invalid registry response: {}", e)))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self.get(url)?;

        if !response.status().is_success() {
            return Err(PluginError::fetch(url, format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .map_err(|e| PluginError::fetch(url, e.to_string()))?;
        fs::write(dest, &bytes).at(dest)?;
        debug!(url, bytes = bytes.len(), "downloaded archive");
        Ok(())
    }
}

/// Filter the remote index by a case-insensitive query
pub fn search_plugins<'a>(
    plugins: &'a [RemotePluginInfo],
    query: &str,
) -> Vec<&'a RemotePluginInfo> {
    let query_lower = query.to_lowercase();
    plugins
        .iter()
        .filter(|p| matches_query(p, &query_lower))
        .collect()
}

/// Check if a plugin matches a search query
fn matches_query(plugin: &RemotePluginInfo, query: &str) -> bool {
    if plugin.id.to_lowercase().contains(query) || plugin.name.to_lowercase().contains(query) {
        return true;
    }

    if plugin.description.to_lowercase().contains(query) {
        return true;
    }

    if let Some(keywords) = &plugin.manifest.keywords {
        for keyword in keywords {
            if keyword.to_lowercase().contains(query) {
                return true;
            }
        }
    }

    plugin
        .manifest
        .tools
        .iter()
        .any(|t| t.name.to_lowercase().contains(query))
}

/// Annotate remote entries with installation status
pub fn annotate(
    plugins: Vec<RemotePluginInfo>,
    local_ids: &[String],
    global_ids: &[String],
) -> Vec<AvailablePlugin> {
    plugins
        .into_iter()
        .map(|info| AvailablePlugin {
            installed_local: local_ids.contains(&info.id),
            installed_global: global_ids.contains(&info.id),
            info,
        })
        .collect()
}
