//! Plugin Registry Store
//!
//! Manages registry.json for each scope. Every operation takes the scope
//! explicitly; the two documents never share state.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{IoContext, PluginError, Result};
use crate::fs_util::write_atomic;
use crate::plugin::paths::PluginPaths;
use crate::plugin::types::{InstalledPlugin, PluginManifest, Registry, Scope};

/// Registry Store - durable id -> installed plugin mapping per scope
#[derive(Debug, Clone)]
pub struct RegistryStore {
    paths: PluginPaths,
}

impl RegistryStore {
    pub fn new(paths: PluginPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &PluginPaths {
        &self.paths
    }

    /// Load registry.json
    ///
    /// A missing or unparsable document yields a fresh empty registry that is
    /// not written back.
    pub fn load(&self, scope: Scope) -> Result<Registry> {
        let path = self.paths.registry_file(scope);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Registry::default()),
            Err(e) => return Err(PluginError::storage(path, e)),
        };

        match serde_json::from_str(&content) {
            Ok(registry) => Ok(registry),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "registry document is corrupt, using an empty registry");
                Ok(Registry::default())
            }
        }
    }

    /// Create the scope root, the installed/ directory and an initial
    /// registry.json if missing
    pub fn ensure_exists(&self, scope: Scope) -> Result<()> {
        let root = self.paths.root(scope);
        fs::create_dir_all(root).at(root)?;

        let installed = self.paths.installed_dir(scope);
        fs::create_dir_all(&installed).at(&installed)?;

        let registry_file = self.paths.registry_file(scope);
        if !registry_file.exists() {
            debug!(scope = %scope, path = %registry_file.display(), "initializing registry");
            self.write(&Registry::default(), &registry_file)?;
        }

        Ok(())
    }

    /// Save registry.json, stamping `lastUpdated`
    pub fn save(&self, registry: &mut Registry, scope: Scope) -> Result<()> {
        registry.last_updated = Utc::now();
        let path = self.paths.registry_file(scope);
        self.write(registry, &path)?;
        debug!(scope = %scope, plugins = registry.plugins.len(), "registry saved");
        Ok(())
    }

    fn write(&self, registry: &Registry, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(registry).map_err(|e| PluginError::StorageParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        write_atomic(path, content.as_bytes())
    }

    /// Check if a plugin is installed
    pub fn is_installed(&self, id: &str, scope: Scope) -> Result<bool> {
        Ok(self.load(scope)?.plugins.contains_key(id))
    }

    /// Get an installed plugin by id
    pub fn get(&self, id: &str, scope: Scope) -> Result<Option<InstalledPlugin>> {
        Ok(self.load(scope)?.plugins.remove(id))
    }

    /// Insert or overwrite the record for `manifest.id`
    pub fn upsert(
        &self,
        manifest: PluginManifest,
        path: PathBuf,
        scope: Scope,
    ) -> Result<InstalledPlugin> {
        let mut registry = self.load(scope)?;

        let plugin = InstalledPlugin {
            manifest,
            installed_at: Utc::now(),
            path,
            enabled: true,
        };

        registry
            .plugins
            .insert(plugin.manifest.id.clone(), plugin.clone());
        self.save(&mut registry, scope)?;

        Ok(plugin)
    }

    /// Remove an entry; returns whether it existed
    ///
    /// Plugin files are left alone.
    pub fn delete(&self, id: &str, scope: Scope) -> Result<bool> {
        let mut registry = self.load(scope)?;

        if registry.plugins.remove(id).is_none() {
            return Ok(false);
        }

        self.save(&mut registry, scope)?;
        Ok(true)
    }

    /// Toggle the enabled flag; returns the updated record if present
    pub fn set_enabled(
        &self,
        id: &str,
        enabled: bool,
        scope: Scope,
    ) -> Result<Option<InstalledPlugin>> {
        let mut registry = self.load(scope)?;

        let updated = match registry.plugins.get_mut(id) {
            Some(plugin) => {
                plugin.enabled = enabled;
                plugin.clone()
            }
            None => return Ok(None),
        };

        self.save(&mut registry, scope)?;
        Ok(Some(updated))
    }

    /// List all installed plugins in a scope
    pub fn list_all(&self, scope: Scope) -> Result<Vec<InstalledPlugin>> {
        Ok(self.load(scope)?.plugins.into_values().collect())
    }

    /// Find a plugin in local scope first, then global
    pub fn find(&self, id: &str) -> Result<Option<(InstalledPlugin, Scope)>> {
        for scope in Scope::SEARCH_ORDER {
            if let Some(plugin) = self.get(id, scope)? {
                return Ok(Some((plugin, scope)));
            }
        }
        Ok(None)
    }
}
