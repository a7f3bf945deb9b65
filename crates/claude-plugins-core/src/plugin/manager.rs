//! Install/remove orchestration
//!
//! `PluginManager` ties the identifier parser, resolvers, registry store,
//! dependency installer and integration generator together. Every mutating
//! operation ends by regenerating the integration descriptor for the scope it
//! touched.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{PluginError, Result};
use crate::fs_util::remove_dir_if_exists;
use crate::plugin::dependencies::{DependencyInstaller, PipInstaller};
use crate::plugin::git::{CommandGitClient, GitClient};
use crate::plugin::identifier::{self, ParsedSource};
use crate::plugin::integration::IntegrationGenerator;
use crate::plugin::paths::PluginPaths;
use crate::plugin::registry::RegistryStore;
use crate::plugin::remote::{self, HttpRegistryClient, RegistryClient};
use crate::plugin::resolver::{Resolved, SourceResolver};
use crate::plugin::types::{AvailablePlugin, InstalledPlugin, RemotePluginInfo, Scope};

/// Options for [`PluginManager::install`]
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub scope: Scope,
    /// Reinstall even when the id is already recorded in the scope
    pub force: bool,
    /// Registry base URL override
    pub registry_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
    /// Skip the confirmation prompt
    pub force: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// List the remote index instead of installed plugins
    pub all: bool,
    pub registry_url: Option<String>,
}

/// Non-fatal problem encountered during an install
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallWarning {
    DependencyInstallFailed { plugin_id: String, message: String },
}

impl fmt::Display for InstallWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DependencyInstallFailed { plugin_id, message } => write!(
                f,
                "Failed to install dependencies for {}: {}",
                plugin_id, message
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub enum InstallOutcome {
    /// Nothing was changed
    AlreadyInstalled { id: String, scope: Scope },
    Installed {
        plugin: InstalledPlugin,
        scope: Scope,
        warnings: Vec<InstallWarning>,
        /// Regenerated integration descriptor
        descriptor: PathBuf,
    },
}

#[derive(Debug, Clone)]
pub enum RemoveOutcome {
    Removed { plugin: InstalledPlugin, scope: Scope },
    Cancelled,
}

#[derive(Debug, Clone)]
pub enum PluginInfo {
    Installed { plugin: InstalledPlugin, scope: Scope },
    Remote(RemotePluginInfo),
    NotFound { identifier: String },
}

#[derive(Debug, Clone)]
pub enum PluginListing {
    Installed {
        local: Vec<InstalledPlugin>,
        global: Vec<InstalledPlugin>,
    },
    Available(Vec<AvailablePlugin>),
}

/// Plugin lifecycle orchestrator
pub struct PluginManager {
    store: RegistryStore,
    config: Config,
    cwd: PathBuf,
    git: Box<dyn GitClient>,
    registry: Box<dyn RegistryClient>,
    deps: Box<dyn DependencyInstaller>,
    integration: IntegrationGenerator,
}

impl PluginManager {
    /// Create a manager with the default git, HTTP and pip collaborators
    pub fn new(paths: PluginPaths, config: Config, cwd: PathBuf) -> Result<Self> {
        let integration = IntegrationGenerator::new(config.integration_dir(&cwd));
        let deps = PipInstaller::new(config.dependencies.pip.clone());

        Ok(Self {
            store: RegistryStore::new(paths),
            config,
            cwd,
            git: Box::new(CommandGitClient),
            registry: Box::new(HttpRegistryClient::new()?),
            deps: Box::new(deps),
            integration,
        })
    }

    pub fn with_git_client(mut self, git: impl GitClient + 'static) -> Self {
        self.git = Box::new(git);
        self
    }

    pub fn with_registry_client(mut self, registry: impl RegistryClient + 'static) -> Self {
        self.registry = Box::new(registry);
        self
    }

    pub fn with_dependency_installer(mut self, deps: impl DependencyInstaller + 'static) -> Self {
        self.deps = Box::new(deps);
        self
    }

    pub fn with_integration_dir(mut self, dir: PathBuf) -> Self {
        self.integration = IntegrationGenerator::new(dir);
        self
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    fn registry_url(&self, override_url: Option<&str>) -> String {
        self.config.registry_url(override_url)
    }

    fn resolver(&self, scope: Scope, registry_url: String) -> SourceResolver<'_> {
        SourceResolver::new(
            self.store.paths().installed_dir(scope),
            &self.cwd,
            self.git.as_ref(),
            self.registry.as_ref(),
            registry_url,
        )
        .with_skip_dirs(&self.config.install.exclude)
    }

    // =========================================================================
    // Install
    // =========================================================================

    /// Install a plugin from any supported identifier
    pub fn install(&self, identifier: &str, options: &InstallOptions) -> Result<InstallOutcome> {
        let scope = options.scope;
        self.store.ensure_exists(scope)?;

        let source = identifier::parse(identifier);
        let resolver = self.resolver(scope, self.registry_url(options.registry_url.as_deref()));

        if !options.force {
            let known_id = match &source {
                ParsedSource::Local { path } => resolver.peek_local_id(path),
                other => other.id().map(str::to_string),
            };
            if let Some(id) = known_id {
                if self.store.is_installed(&id, scope)? {
                    debug!(id = %id, scope = %scope, "already installed");
                    return Ok(InstallOutcome::AlreadyInstalled { id, scope });
                }
            }
        }

        info!(source = %source.describe(), scope = %scope, "installing plugin");
        let resolved = resolver.resolve(&source)?;

        let mut warnings = Vec::new();
        if let Some(warning) = self.install_dependencies(&resolved) {
            warnings.push(warning);
        }

        let plugin = self.store.upsert(resolved.manifest, resolved.path, scope)?;
        let descriptor = self.integration.generate(&self.store, scope)?;

        info!(id = %plugin.id(), version = %plugin.manifest.version, scope = %scope, "plugin installed");
        Ok(InstallOutcome::Installed {
            plugin,
            scope,
            warnings,
            descriptor,
        })
    }

    /// Best effort; a failure becomes a warning
    fn install_dependencies(&self, resolved: &Resolved) -> Option<InstallWarning> {
        if !self.config.dependencies.enabled {
            return None;
        }
        let deps = resolved.manifest.declared_dependencies()?;
        let plugin_id = resolved.manifest.id.as_str();

        debug!(id = plugin_id, count = deps.len(), "installing dependencies");
        match self.deps.install(&resolved.path, deps) {
            Ok(()) => None,
            Err(e) => {
                warn!(id = plugin_id, error = %e, "dependency installation failed");
                Some(InstallWarning::DependencyInstallFailed {
                    plugin_id: plugin_id.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    // =========================================================================
    // Remove
    // =========================================================================

    /// Remove an installed plugin, local scope first
    ///
    /// `confirm` is consulted unless `options.force` is set.
    pub fn remove<F>(&self, id: &str, options: &RemoveOptions, confirm: F) -> Result<RemoveOutcome>
    where
        F: FnOnce(&InstalledPlugin) -> Result<bool>,
    {
        let (plugin, scope) = self
            .store
            .find(id)?
            .ok_or_else(|| PluginError::not_found(id))?;

        if !options.force && !confirm(&plugin)? {
            return Ok(RemoveOutcome::Cancelled);
        }

        if remove_dir_if_exists(&plugin.path)? {
            debug!(path = %plugin.path.display(), "removed plugin directory");
        }
        self.store.delete(id, scope)?;
        self.integration.generate(&self.store, scope)?;

        info!(id, scope = %scope, "plugin removed");
        Ok(RemoveOutcome::Removed { plugin, scope })
    }

    // =========================================================================
    // Query
    // =========================================================================

    /// Show an installed plugin, falling back to the remote registry
    pub fn info(&self, identifier: &str, registry_url: Option<&str>) -> Result<PluginInfo> {
        let source = identifier::parse(identifier);
        let id = source.id().unwrap_or(identifier);

        if let Some((plugin, scope)) = self.store.find(id)? {
            return Ok(PluginInfo::Installed { plugin, scope });
        }

        let version = match &source {
            ParsedSource::Registry { version, .. } => version.as_deref(),
            ParsedSource::Local { .. } => {
                return Ok(PluginInfo::NotFound {
                    identifier: identifier.to_string(),
                })
            }
            ParsedSource::GitHub { .. } => None,
        };

        match self
            .registry
            .fetch_plugin(&self.registry_url(registry_url), id, version)?
        {
            Some(info) => Ok(PluginInfo::Remote(info)),
            None => Ok(PluginInfo::NotFound {
                identifier: identifier.to_string(),
            }),
        }
    }

    /// Installed plugins of both scopes, or the annotated remote index
    pub fn list(&self, options: &ListOptions) -> Result<PluginListing> {
        if options.all {
            let index = self
                .registry
                .fetch_all(&self.registry_url(options.registry_url.as_deref()))?;
            return Ok(PluginListing::Available(self.annotate(index)?));
        }

        Ok(PluginListing::Installed {
            local: self.store.list_all(Scope::Local)?,
            global: self.store.list_all(Scope::Global)?,
        })
    }

    /// Search the remote index
    pub fn search(&self, query: &str, registry_url: Option<&str>) -> Result<Vec<AvailablePlugin>> {
        let index = self.registry.fetch_all(&self.registry_url(registry_url))?;
        let matches = remote::search_plugins(&index, query)
            .into_iter()
            .cloned()
            .collect();
        self.annotate(matches)
    }

    fn annotate(&self, plugins: Vec<RemotePluginInfo>) -> Result<Vec<AvailablePlugin>> {
        let ids = |scope: Scope| -> Result<Vec<String>> {
            Ok(self
                .store
                .load(scope)?
                .plugins
                .into_keys()
                .collect())
        };
        Ok(remote::annotate(
            plugins,
            &ids(Scope::Local)?,
            &ids(Scope::Global)?,
        ))
    }

    // =========================================================================
    // Enable / Disable
    // =========================================================================

    /// Toggle whether a plugin appears in the integration descriptor
    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<(InstalledPlugin, Scope)> {
        let (_, scope) = self
            .store
            .find(id)?
            .ok_or_else(|| PluginError::not_found(id))?;

        let plugin = self
            .store
            .set_enabled(id, enabled, scope)?
            .ok_or_else(|| PluginError::not_found(id))?;
        self.integration.generate(&self.store, scope)?;

        info!(id, enabled, scope = %scope, "plugin state changed");
        Ok((plugin, scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::resolver::tests::{
        manifest_json, write_plugin_source, FakeGit, FakeRegistry,
    };
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct FailingInstaller;

    impl DependencyInstaller for FailingInstaller {
        fn install(&self, _plugin_dir: &Path, _deps: &BTreeMap<String, String>) -> Result<()> {
            Err(PluginError::fetch("dependencies", "pip exited with status 1"))
        }
    }

    struct Fixture {
        temp: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            fs::create_dir_all(temp.path().join("project")).unwrap();
            Self { temp }
        }

        fn cwd(&self) -> PathBuf {
            self.temp.path().join("project")
        }

        fn paths(&self) -> PluginPaths {
            PluginPaths::new(
                self.cwd().join(".claude-plugins"),
                self.temp.path().join("home/.claude-plugins"),
            )
        }

        fn out_dir(&self) -> PathBuf {
            self.cwd().join("backend/plugins")
        }

        fn manager_with(&self, config: Config, registry: FakeRegistry) -> PluginManager {
            PluginManager::new(self.paths(), config, self.cwd())
                .unwrap()
                .with_git_client(FakeGit::default())
                .with_registry_client(registry)
                .with_dependency_installer(FailingInstaller)
                .with_integration_dir(self.out_dir())
        }

        fn manager(&self) -> PluginManager {
            self.manager_with(Config::default(), FakeRegistry::default())
        }

        fn write_source(&self, dir: &str, id: &str) {
            write_plugin_source(&self.cwd().join(dir), &manifest_json(id));
        }

        fn registry_bytes(&self, scope: Scope) -> Option<Vec<u8>> {
            fs::read(self.paths().registry_file(scope)).ok()
        }

        fn descriptor(&self) -> String {
            fs::read_to_string(self.out_dir().join("integration.py")).unwrap()
        }
    }

    fn local(scope: Scope) -> InstallOptions {
        InstallOptions {
            scope,
            ..Default::default()
        }
    }

    fn no_prompt(_: &InstalledPlugin) -> Result<bool> {
        panic!("confirmation should not be requested");
    }

    #[test]
    fn test_install_local_path() {
        let fx = Fixture::new();
        fx.write_source("sample-plugin", "sample-tool");
        let manager = fx.manager();

        let outcome = manager
            .install("./sample-plugin", &local(Scope::Local))
            .unwrap();

        let InstallOutcome::Installed {
            plugin,
            scope,
            warnings,
            descriptor,
        } = outcome
        else {
            panic!("expected install");
        };
        assert_eq!(scope, Scope::Local);
        assert!(warnings.is_empty());
        assert_eq!(
            plugin.path,
            fx.cwd().join(".claude-plugins/installed/sample-tool")
        );
        assert!(plugin.enabled);
        assert!(plugin.path.join("main.py").exists());
        assert_eq!(descriptor, fx.out_dir().join("integration.py"));

        let content = fx.descriptor();
        assert!(content.contains("\"sample-tool\": {"));
        assert!(content.contains("\"measure_room\""));
        assert!(fx.out_dir().join("__init__.py").exists());

        let stored = manager.store().get("sample-tool", Scope::Local).unwrap();
        assert_eq!(stored.unwrap().manifest.name, "sample-tool plugin");
        assert!(fx.registry_bytes(Scope::Global).is_none());
    }

    #[test]
    fn test_install_keeps_tool_schema_verbatim() {
        let fx = Fixture::new();
        let manifest = r#"{
            "id": "schema-tool",
            "name": "Schema Tool",
            "version": "1.0.0",
            "description": "d",
            "author": "a",
            "tools": [{
                "name": "pick",
                "description": "Pick a level",
                "input_schema": {
                    "type": "object",
                    "properties": {
                        "level": { "type": ["integer", "null"], "enum": [1, 2], "minimum": 0, "default": 10 }
                    }
                }
            }],
            "entryPoint": "main.py"
        }"#;
        write_plugin_source(&fx.cwd().join("src"), manifest);
        let manager = fx.manager();

        manager.install("./src", &local(Scope::Local)).unwrap();

        let stored = manager.store().get("schema-tool", Scope::Local).unwrap().unwrap();
        let level = &stored.manifest.tools[0].input_schema["properties"]["level"];
        assert_eq!(level["enum"], serde_json::json!([1, 2]));
        assert_eq!(level["default"], 10);

        let content = fx.descriptor();
        assert!(content.contains("\"minimum\": 0"));
        assert!(content.contains("\"default\": 10"));
    }

    #[test]
    fn test_install_then_info() {
        let fx = Fixture::new();
        fx.write_source("src", "sample-tool");
        let manager = fx.manager();

        manager.install("./src", &local(Scope::Global)).unwrap();

        match manager.info("sample-tool", None).unwrap() {
            PluginInfo::Installed { plugin, scope } => {
                assert_eq!(scope, Scope::Global);
                assert_eq!(plugin.manifest.version, "1.0.0");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_install_twice_without_force_changes_nothing() {
        let fx = Fixture::new();
        fx.write_source("src", "sample-tool");
        let manager = fx.manager();

        manager.install("./src", &local(Scope::Local)).unwrap();
        let before = fx.registry_bytes(Scope::Local).unwrap();

        let outcome = manager.install("./src", &local(Scope::Local)).unwrap();

        assert!(matches!(
            outcome,
            InstallOutcome::AlreadyInstalled { ref id, scope: Scope::Local } if id == "sample-tool"
        ));
        assert_eq!(fx.registry_bytes(Scope::Local).unwrap(), before);
    }

    #[test]
    fn test_force_reinstall_overwrites_record() {
        let fx = Fixture::new();
        fx.write_source("src", "sample-tool");
        let manager = fx.manager();

        manager.install("./src", &local(Scope::Local)).unwrap();
        manager.set_enabled("sample-tool", false).unwrap();

        let options = InstallOptions {
            scope: Scope::Local,
            force: true,
            ..Default::default()
        };
        let outcome = manager.install("./src", &options).unwrap();

        assert!(matches!(outcome, InstallOutcome::Installed { ref plugin, .. } if plugin.enabled));
        assert!(fx.descriptor().contains("\"sample-tool\": {"));
    }

    #[test]
    fn test_install_invalid_local_records_nothing() {
        let fx = Fixture::new();
        write_plugin_source(
            &fx.cwd().join("bad"),
            r#"{"id": "bad", "name": "Bad", "version": "1.0.0", "description": "d", "author": "a"}"#,
        );
        let manager = fx.manager();

        let err = manager.install("./bad", &local(Scope::Local)).unwrap_err();

        assert!(matches!(err, PluginError::InvalidPlugin { ref message } if message.contains("entryPoint")));
        assert!(manager.store().list_all(Scope::Local).unwrap().is_empty());
    }

    #[test]
    fn test_remove_then_info_is_not_found() {
        let fx = Fixture::new();
        fx.write_source("src", "sample-tool");
        let manager = fx.manager();
        manager.install("./src", &local(Scope::Local)).unwrap();

        let outcome = manager
            .remove("sample-tool", &RemoveOptions { force: true }, no_prompt)
            .unwrap();

        let RemoveOutcome::Removed { plugin, scope } = outcome else {
            panic!("expected removal");
        };
        assert_eq!(scope, Scope::Local);
        assert!(!plugin.path.exists());
        assert!(!fx.descriptor().contains("\"sample-tool\": {"));
        assert!(matches!(
            manager.info("sample-tool", None).unwrap(),
            PluginInfo::NotFound { .. }
        ));
    }

    #[test]
    fn test_remove_nonexistent_leaves_registries_untouched() {
        let fx = Fixture::new();
        fx.write_source("src", "sample-tool");
        let manager = fx.manager();
        manager.install("./src", &local(Scope::Local)).unwrap();
        let before = fx.registry_bytes(Scope::Local);

        let err = manager
            .remove("nonexistent-plugin", &RemoveOptions::default(), no_prompt)
            .unwrap_err();

        assert!(matches!(err, PluginError::NotFound { ref identifier } if identifier == "nonexistent-plugin"));
        assert_eq!(fx.registry_bytes(Scope::Local), before);
        assert!(fx.registry_bytes(Scope::Global).is_none());
    }

    #[test]
    fn test_remove_cancelled_keeps_plugin() {
        let fx = Fixture::new();
        fx.write_source("src", "sample-tool");
        let manager = fx.manager();
        manager.install("./src", &local(Scope::Local)).unwrap();

        let mut prompted = None;
        let outcome = manager
            .remove("sample-tool", &RemoveOptions::default(), |p| {
                prompted = Some(p.id().to_string());
                Ok(false)
            })
            .unwrap();

        assert!(matches!(outcome, RemoveOutcome::Cancelled));
        assert_eq!(prompted.as_deref(), Some("sample-tool"));
        assert!(manager.store().is_installed("sample-tool", Scope::Local).unwrap());
    }

    #[test]
    fn test_remove_prefers_local_scope() {
        let fx = Fixture::new();
        fx.write_source("src", "shared");
        let manager = fx.manager();
        manager.install("./src", &local(Scope::Local)).unwrap();
        manager.install("./src", &local(Scope::Global)).unwrap();

        manager
            .remove("shared", &RemoveOptions { force: true }, no_prompt)
            .unwrap();

        assert!(!manager.store().is_installed("shared", Scope::Local).unwrap());
        assert!(manager.store().is_installed("shared", Scope::Global).unwrap());
    }

    #[test]
    fn test_install_from_github() {
        let fx = Fixture::new();
        let manager = fx
            .manager()
            .with_git_client(FakeGit::with_repo(
                "https://github.com/acme/room-tools.git",
                &manifest_json("room-tools"),
            ));

        let outcome = manager
            .install("github:acme/room-tools#main", &local(Scope::Local))
            .unwrap();

        assert!(matches!(outcome, InstallOutcome::Installed { ref plugin, .. } if plugin.id() == "room-tools"));
        assert!(fx
            .cwd()
            .join(".claude-plugins/installed/room-tools/main.py")
            .exists());
    }

    #[test]
    fn test_install_from_registry_with_failing_dependencies() {
        let fx = Fixture::new();
        let manifest = r#"{
            "id": "calc", "name": "Calc", "version": "2.0.0",
            "description": "Calculator", "author": "Tester",
            "dependencies": {"numpy": ">=1.24"},
            "entryPoint": "main.py"
        }"#;
        let mut registry = FakeRegistry::default();
        registry.add(
            "calc",
            vec![
                ("package/plugin.json", manifest.to_string()),
                ("package/main.py", "pass\n".to_string()),
            ],
        );
        let manager = fx.manager_with(Config::default(), registry);

        let outcome = manager.install("calc", &local(Scope::Local)).unwrap();

        let InstallOutcome::Installed { plugin, warnings, .. } = outcome else {
            panic!("expected install");
        };
        assert_eq!(plugin.manifest.version, "2.0.0");
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            InstallWarning::DependencyInstallFailed { plugin_id, .. } if plugin_id == "calc"
        ));
        assert!(manager.store().is_installed("calc", Scope::Local).unwrap());
    }

    #[test]
    fn test_dependencies_disabled_skips_installer() {
        let fx = Fixture::new();
        write_plugin_source(
            &fx.cwd().join("src"),
            r#"{
                "id": "calc", "name": "Calc", "version": "1.0.0",
                "description": "d", "author": "a",
                "dependencies": {"numpy": ""},
                "entryPoint": "main.py"
            }"#,
        );
        let mut config = Config::default();
        config.dependencies.enabled = false;
        let manager = fx.manager_with(config, FakeRegistry::default());

        let outcome = manager.install("./src", &local(Scope::Local)).unwrap();

        assert!(matches!(outcome, InstallOutcome::Installed { ref warnings, .. } if warnings.is_empty()));
    }

    #[test]
    fn test_install_unknown_registry_plugin() {
        let fx = Fixture::new();
        let manager = fx.manager();

        let err = manager.install("ghost", &local(Scope::Local)).unwrap_err();

        assert!(matches!(err, PluginError::NotFound { .. }));
        assert!(manager.store().list_all(Scope::Local).unwrap().is_empty());
    }

    #[test]
    fn test_info_falls_back_to_remote() {
        let fx = Fixture::new();
        let mut registry = FakeRegistry::default();
        registry.add("remote-only", vec![]);
        let manager = fx.manager_with(Config::default(), registry);

        match manager.info("remote-only", None).unwrap() {
            PluginInfo::Remote(info) => assert_eq!(info.id, "remote-only"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(fx.registry_bytes(Scope::Local).is_none());
    }

    #[test]
    fn test_list_installed_and_all() {
        let fx = Fixture::new();
        fx.write_source("src", "listed");
        let mut registry = FakeRegistry::default();
        registry.add("listed", vec![]);
        registry.add("other", vec![]);
        let manager = fx.manager_with(Config::default(), registry);
        manager.install("./src", &local(Scope::Global)).unwrap();

        match manager.list(&ListOptions::default()).unwrap() {
            PluginListing::Installed { local, global } => {
                assert!(local.is_empty());
                assert_eq!(global.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }

        let PluginListing::Available(available) = manager
            .list(&ListOptions {
                all: true,
                registry_url: Some("https://mirror.example".to_string()),
            })
            .unwrap()
        else {
            panic!("expected remote listing");
        };
        let listed = available.iter().find(|p| p.info.id == "listed").unwrap();
        assert!(listed.installed_global && !listed.installed_local);
        assert!(!available.iter().find(|p| p.info.id == "other").unwrap().is_installed());
    }

    #[test]
    fn test_search_annotates_matches() {
        let fx = Fixture::new();
        let mut registry = FakeRegistry::default();
        registry.add("room-measure", vec![]);
        registry.add("paint-mixer", vec![]);
        let manager = fx.manager_with(Config::default(), registry);

        let found = manager.search("ROOM", None).unwrap();

        assert_eq!(found.len(), 2);
        let found = manager.search("paint", None).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].info.id, "paint-mixer");
        assert!(!found[0].is_installed());
    }

    #[test]
    fn test_set_enabled_regenerates_descriptor() {
        let fx = Fixture::new();
        fx.write_source("src", "toggle-me");
        let manager = fx.manager();
        manager.install("./src", &local(Scope::Local)).unwrap();

        let (plugin, scope) = manager.set_enabled("toggle-me", false).unwrap();
        assert!(!plugin.enabled);
        assert_eq!(scope, Scope::Local);
        assert!(!fx.descriptor().contains("\"toggle-me\": {"));

        manager.set_enabled("toggle-me", true).unwrap();
        assert!(fx.descriptor().contains("\"toggle-me\": {"));

        assert!(matches!(
            manager.set_enabled("missing", true),
            Err(PluginError::NotFound { .. })
        ));
    }
}
