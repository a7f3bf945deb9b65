//! Plugin Module
//!
//! - `identifier`: classify install identifiers (local path, GitHub, registry)
//! - `manifest`: `plugin.json` parsing and validation
//! - `registry`: per-scope `registry.json` store
//! - `resolver`: materialize plugin sources into `installed/<id>`
//! - `manager`: install/remove/info/list orchestration
//! - `integration`: `integration.py` descriptor generation

pub mod archive;
pub mod dependencies;
pub mod git;
pub mod identifier;
pub mod integration;
pub mod manager;
pub mod manifest;
pub mod paths;
pub mod registry;
pub mod remote;
pub mod resolver;
pub mod types;

// Re-exports
pub use dependencies::{DependencyInstaller, PipInstaller};
pub use git::{CommandGitClient, GitClient};
pub use identifier::ParsedSource;
pub use integration::IntegrationGenerator;
pub use manager::{
    InstallOptions, InstallOutcome, InstallWarning, ListOptions, PluginInfo, PluginListing,
    PluginManager, RemoveOptions, RemoveOutcome,
};
pub use paths::PluginPaths;
pub use registry::RegistryStore;
pub use remote::{HttpRegistryClient, RegistryClient, DEFAULT_REGISTRY_URL};
pub use resolver::{Resolved, SourceResolver};
pub use types::{
    AvailablePlugin, InstalledPlugin, PluginManifest, PluginTool, Registry, RemotePluginInfo,
    Scope, ToolParameter,
};
