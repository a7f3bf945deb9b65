//! Source resolvers
//!
//! Turn a parsed identifier into plugin files under `installed/<id>` plus a
//! validated manifest. Local and registry sources are staged in a scratch
//! directory and only moved into place after validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{IoContext, PluginError, Result};
use crate::fs_util::{copy_dir_recursive, remove_dir_if_exists, replace_dir};
use crate::plugin::archive;
use crate::plugin::git::{github_url, GitClient};
use crate::plugin::identifier::ParsedSource;
use crate::plugin::manifest::{self, RawManifest};
use crate::plugin::paths::PLUGINS_DIR_NAME;
use crate::plugin::remote::RegistryClient;
use crate::plugin::types::PluginManifest;

/// Materialized plugin files and their manifest
#[derive(Debug, Clone)]
pub struct Resolved {
    pub manifest: PluginManifest,
    pub path: PathBuf,
}

/// Resolves plugin sources into one scope's installed/ directory
pub struct SourceResolver<'a> {
    installed_dir: PathBuf,
    cwd: &'a Path,
    skip_dirs: Vec<String>,
    git: &'a dyn GitClient,
    registry: &'a dyn RegistryClient,
    registry_url: String,
}

/// Scratch path removed on drop; already moved paths are left alone
struct Scratch(PathBuf);

impl Scratch {
    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        if self.0.is_dir() {
            let _ = std::fs::remove_dir_all(&self.0);
        } else if self.0.exists() {
            let _ = std::fs::remove_file(&self.0);
        }
    }
}

impl<'a> SourceResolver<'a> {
    pub fn new(
        installed_dir: PathBuf,
        cwd: &'a Path,
        git: &'a dyn GitClient,
        registry: &'a dyn RegistryClient,
        registry_url: String,
    ) -> Self {
        Self {
            installed_dir,
            cwd,
            skip_dirs: vec![".git".to_string()],
            git,
            registry,
            registry_url,
        }
    }

    /// Additional directory names skipped when copying local sources
    pub fn with_skip_dirs(mut self, dirs: &[String]) -> Self {
        for dir in dirs {
            if !self.skip_dirs.contains(dir) {
                self.skip_dirs.push(dir.clone());
            }
        }
        self
    }

    /// Dispatch to the resolver matching the parsed source
    pub fn resolve(&self, source: &ParsedSource) -> Result<Resolved> {
        match source {
            ParsedSource::Local { path } => self.resolve_local(path),
            ParsedSource::GitHub { repo, git_ref, id } => {
                self.resolve_github(repo, git_ref.as_deref(), id)
            }
            ParsedSource::Registry { id, version } => {
                self.resolve_registry(id, version.as_deref())
            }
        }
    }

    fn scratch_dir(&self, prefix: &str) -> PathBuf {
        self.installed_dir
            .join(format!(".{}-{}", prefix, uuid::Uuid::new_v4()))
    }

    fn final_dir(&self, id: &str) -> PathBuf {
        self.installed_dir.join(id)
    }

    /// Absolute form of a local source path
    pub fn absolute(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.cwd.join(p)
        }
    }

    /// Id declared by a local source's plugin.json, if readable
    pub fn peek_local_id(&self, path: &str) -> Option<String> {
        RawManifest::load(&self.absolute(path))
            .ok()
            .flatten()
            .and_then(|raw| raw.id)
    }

    // =========================================================================
    // Local
    // =========================================================================

    /// Copy a local plugin directory into installed/<id>
    pub fn resolve_local(&self, path: &str) -> Result<Resolved> {
        let source = self.absolute(path);

        if !source.is_dir() {
            return Err(PluginError::not_found(source.display().to_string()));
        }
        if !manifest::exists(&source) {
            return Err(PluginError::not_found(
                manifest::manifest_path(&source).display().to_string(),
            ));
        }

        let manifest = manifest::load_validated(&source)?;

        let staging = Scratch(self.scratch_dir("staging"));
        let mut skip = self.skip_dirs.clone();
        skip.push(PLUGINS_DIR_NAME.to_string());
        let copied = copy_dir_recursive(&source, staging.path(), &skip)?;
        debug!(source = %source.display(), files = copied, "copied local plugin");

        let dest = self.final_dir(&manifest.id);
        replace_dir(staging.path(), &dest)?;

        info!(id = %manifest.id, path = %dest.display(), "resolved local plugin");
        Ok(Resolved {
            manifest,
            path: dest,
        })
    }

    // =========================================================================
    // GitHub
    // =========================================================================

    /// Shallow clone a GitHub repository and move it to installed/<id>
    pub fn resolve_github(
        &self,
        repo: &str,
        git_ref: Option<&str>,
        repo_id: &str,
    ) -> Result<Resolved> {
        // Nested repo ids keep a '/', which must not create a parent directory
        let scratch_name = format!("clone-{}", repo_id.replace('/', "-"));
        let clone_dir = Scratch(self.scratch_dir(&scratch_name));
        let url = github_url(repo);

        self.git
            .clone_shallow(&url, git_ref, clone_dir.path())
            .map_err(|e| match e {
                e @ PluginError::FetchFailed { .. } => e,
                other => PluginError::fetch(repo, other.to_string()),
            })?;

        if !manifest::exists(clone_dir.path()) {
            return Err(PluginError::invalid(format!(
                "{} not found in the repository {}",
                manifest::MANIFEST_FILE,
                repo
            )));
        }

        let manifest = manifest::load_validated(clone_dir.path())?;
        remove_dir_if_exists(&clone_dir.path().join(".git"))?;

        let dest = self.final_dir(&manifest.id);
        replace_dir(clone_dir.path(), &dest)?;

        info!(id = %manifest.id, repo, "resolved GitHub plugin");
        Ok(Resolved {
            manifest,
            path: dest,
        })
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Download and unpack a plugin archive from the remote registry
    pub fn resolve_registry(&self, id: &str, version: Option<&str>) -> Result<Resolved> {
        let info = self
            .registry
            .fetch_plugin(&self.registry_url, id, version)?
            .ok_or_else(|| match version {
                Some(v) => PluginError::not_found(format!("{}@{}", id, v)),
                None => PluginError::not_found(id),
            })?;

        std::fs::create_dir_all(&self.installed_dir).at(&self.installed_dir)?;

        let download = Scratch(self.scratch_dir("download").with_extension("tar.gz"));
        self.registry.download(&info.tarball_url, download.path())?;

        if let Some(expected) = &info.sha256 {
            archive::verify_sha256(download.path(), expected)?;
        }

        let staging = Scratch(self.scratch_dir("staging"));
        archive::unpack_tar_gz(download.path(), staging.path())?;

        let root = archive::plugin_root(staging.path())?;
        let manifest = manifest::load_validated(&root)?;

        let dest = self.final_dir(&manifest.id);
        replace_dir(&root, &dest)?;

        info!(id = %manifest.id, version = %manifest.version, "resolved registry plugin");
        Ok(Resolved {
            manifest,
            path: dest,
        })
    }
}
