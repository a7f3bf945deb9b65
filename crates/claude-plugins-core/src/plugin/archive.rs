//! Plugin archive handling: checksum verification and gzip tar unpacking

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use tar::Archive;

use crate::error::{IoContext, PluginError, Result};
use crate::plugin::manifest;

/// Hex SHA-256 of a file
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).at(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).at(path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compare a file against an expected hex digest
pub fn verify_sha256(path: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(path)?;
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(PluginError::fetch(
            path.display().to_string(),
            format!("checksum mismatch: expected {}, got {}", expected, actual),
        ));
    }
    Ok(())
}

/// Strip `.` components and reject entries that escape the destination
fn sanitize_entry_path(path: &Path) -> Result<PathBuf> {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => cleaned.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(PluginError::invalid(format!(
                    "archive entry escapes destination: {}",
                    path.display()
                )));
            }
        }
    }
    Ok(cleaned)
}

/// Unpack a `.tar.gz` into `dest_dir`
pub fn unpack_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<usize> {
    let file = File::open(archive_path).at(archive_path)?;
    unpack_tar(GzDecoder::new(file), dest_dir)
        .map_err(|e| match e {
            PluginError::Io(io) => PluginError::invalid(format!(
                "failed to unpack {}: {}",
                archive_path.display(),
                io
            )),
            other => other,
        })
}

fn unpack_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<usize> {
    fs::create_dir_all(dest_dir).at(dest_dir)?;
    let mut archive = Archive::new(reader);
    let mut files = 0;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let raw_path = entry.path()?.to_path_buf();
        let rel = sanitize_entry_path(&raw_path)?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let out = dest_dir.join(&rel);

        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() {
            fs::create_dir_all(&out).at(&out)?;
        } else if entry_type.is_file() {
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent).at(parent)?;
            }
            let mut out_file = File::create(&out).at(&out)?;
            io::copy(&mut entry, &mut out_file).at(&out)?;
            files += 1;
        }
        // links and special files are skipped
    }

    Ok(files)
}

/// Directory inside an unpacked archive that holds plugin.json
///
/// Archives commonly wrap everything in one top-level directory such as
/// `package/`; in that case the wrapper is the plugin root.
pub fn plugin_root(unpacked: &Path) -> Result<PathBuf> {
    if manifest::exists(unpacked) {
        return Ok(unpacked.to_path_buf());
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(unpacked).at(unpacked)? {
        entries.push(entry.at(unpacked)?.path());
    }

    match entries.as_slice() {
        [only] if only.is_dir() && manifest::exists(only) => Ok(only.clone()),
        _ => Ok(unpacked.to_path_buf()),
    }
}
