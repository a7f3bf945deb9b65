//! Per-scope directory layout
//!
//! ```text
//! <root>/registry.json
//! <root>/installed/<plugin-id>/
//! ```
//!
//! The local root is `<cwd>/.claude-plugins`, the global root is
//! `~/.claude-plugins`.

use std::path::{Path, PathBuf};

use crate::plugin::types::Scope;

pub const PLUGINS_DIR_NAME: &str = ".claude-plugins";
pub const REGISTRY_FILE: &str = "registry.json";
pub const INSTALLED_DIR: &str = "installed";

/// Root directories of both scopes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginPaths {
    local_root: PathBuf,
    global_root: PathBuf,
}

impl PluginPaths {
    /// Project root under `cwd`, global root as given
    pub fn for_project(cwd: &Path, global_root: PathBuf) -> Self {
        Self::new(cwd.join(PLUGINS_DIR_NAME), global_root)
    }

    /// Create with explicit roots
    pub fn new(local_root: PathBuf, global_root: PathBuf) -> Self {
        Self {
            local_root,
            global_root,
        }
    }

    pub fn root(&self, scope: Scope) -> &Path {
        match scope {
            Scope::Local => &self.local_root,
            Scope::Global => &self.global_root,
        }
    }

    pub fn registry_file(&self, scope: Scope) -> PathBuf {
        self.root(scope).join(REGISTRY_FILE)
    }

    pub fn installed_dir(&self, scope: Scope) -> PathBuf {
        self.root(scope).join(INSTALLED_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_per_scope() {
        let paths = PluginPaths::new(PathBuf::from("/proj/.cp"), PathBuf::from("/home/u/.cp"));

        assert_eq!(
            paths.registry_file(Scope::Local),
            PathBuf::from("/proj/.cp/registry.json")
        );
        assert_eq!(
            paths.installed_dir(Scope::Global),
            PathBuf::from("/home/u/.cp/installed")
        );

        let project = PluginPaths::for_project(Path::new("/proj"), PathBuf::from("/g"));
        assert_eq!(project.root(Scope::Local), Path::new("/proj/.claude-plugins"));
    }
}
