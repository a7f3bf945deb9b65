//! Git operations used by the GitHub resolver

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{IoContext, PluginError, Result};

/// Shallow clone abstraction so resolvers can be exercised without a network
pub trait GitClient {
    /// Clone `url` at `git_ref` (default branch when `None`) into `target`
    fn clone_shallow(&self, url: &str, git_ref: Option<&str>, target: &Path) -> Result<()>;
}

/// Clone URL for a GitHub `owner/repo`
pub fn github_url(repo: &str) -> String {
    format!("https://github.com/{}.git", repo)
}

/// GitClient backed by the `git` executable
#[derive(Debug, Clone, Default)]
pub struct CommandGitClient;

impl GitClient for CommandGitClient {
    fn clone_shallow(&self, url: &str, git_ref: Option<&str>, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).at(parent)?;
        }

        let mut args = vec!["clone", "--depth", "1"];

        if let Some(git_ref) = git_ref {
            args.push("--branch");
            args.push(git_ref);
        }

        args.push(url);

        debug!(url, git_ref, target = %target.display(), "git clone");
        let output = Command::new("git")
            .args(&args)
            .arg(target)
            .output()
            .map_err(|e| PluginError::fetch(url, format!("failed to run git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PluginError::fetch(
                url,
                format!("git clone failed: {}", stderr.trim()),
            ));
        }

        Ok(())
    }
}
