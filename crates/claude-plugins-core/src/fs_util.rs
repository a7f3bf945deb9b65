//! Filesystem helpers shared by the registry store and resolvers

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{IoContext, PluginError, Result};

/// Write a file by writing a sibling temp file and renaming it over the target
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).at(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    fs::write(&tmp, content).at(&tmp)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(PluginError::storage(path, e));
    }
    Ok(())
}

/// Remove a directory tree; a missing directory is not an error
pub fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(PluginError::storage(path, e)),
    }
}

/// Copy a directory tree, skipping directories whose name is in `skip_dirs`
pub fn copy_dir_recursive(src: &Path, dst: &Path, skip_dirs: &[String]) -> Result<usize> {
    fs::create_dir_all(dst).at(dst)?;
    let mut copied = 0;

    let walker = WalkDir::new(src).min_depth(1).into_iter().filter_entry(|e| {
        !(e.file_type().is_dir()
            && skip_dirs
                .iter()
                .any(|s| e.file_name().to_string_lossy() == s.as_str()))
    });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            PluginError::storage(path, e.into())
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| PluginError::invalid(format!("unexpected path in copy: {}", e)))?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).at(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).at(parent)?;
            }
            fs::copy(entry.path(), &target).at(entry.path())?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Move a directory to `dst`, replacing whatever is there
///
/// Falls back to copy + delete when a rename is not possible.
pub fn replace_dir(src: &Path, dst: &Path) -> Result<()> {
    remove_dir_if_exists(dst)?;
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).at(parent)?;
    }

    if fs::rename(src, dst).is_err() {
        copy_dir_recursive(src, dst, &[])?;
        remove_dir_if_exists(src)?;
    }
    Ok(())
}
