//! Best-effort installation of a plugin's declared Python dependencies

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{IoContext, PluginError, Result};
use crate::fs_util::write_atomic;

pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Installs the dependencies a manifest declares
pub trait DependencyInstaller {
    fn install(&self, plugin_dir: &Path, dependencies: &BTreeMap<String, String>) -> Result<()>;
}

/// Render requirements.txt lines (`name` followed by its version spec)
pub fn requirements(dependencies: &BTreeMap<String, String>) -> String {
    dependencies
        .iter()
        .map(|(name, spec)| format!("{}{}", name, spec.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes requirements.txt and runs `<pip> install -r requirements.txt`
#[derive(Debug, Clone)]
pub struct PipInstaller {
    command: String,
}

impl PipInstaller {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for PipInstaller {
    fn default() -> Self {
        Self::new("pip")
    }
}

impl DependencyInstaller for PipInstaller {
    fn install(&self, plugin_dir: &Path, dependencies: &BTreeMap<String, String>) -> Result<()> {
        let requirements_path = plugin_dir.join(REQUIREMENTS_FILE);
        write_atomic(&requirements_path, requirements(dependencies).as_bytes())?;

        debug!(command = %self.command, path = %requirements_path.display(), "installing dependencies");
        let output = Command::new(&self.command)
            .arg("install")
            .arg("-r")
            .arg(&requirements_path)
            .current_dir(plugin_dir)
            .output()
            .at(Path::new(&self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PluginError::fetch(
                "dependencies",
                format!("{} install failed: {}", self.command, stderr.trim()),
            ));
        }

        Ok(())
    }
}
