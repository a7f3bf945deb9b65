pub mod config;
pub mod error;
pub mod fs_util;
pub mod plugin;

pub use config::Config;
pub use error::{PluginError, Result};
pub use plugin::{
    AvailablePlugin, InstallOptions, InstallOutcome, InstallWarning, InstalledPlugin, ListOptions,
    PluginInfo, PluginListing, PluginManager, PluginManifest, PluginPaths, RemoveOptions,
    RemoveOutcome, RemotePluginInfo, Scope,
};
