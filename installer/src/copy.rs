//! Filesystem copy helpers for the stager.
//!
//! Directory trees are walked in file-name order so that two runs over the
//! same input produce the same output and the same digest. Symlinks in a
//! source tree are followed and their targets copied as regular files.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read};
use walkdir::WalkDir;

/// Copy a single file, creating the destination's parent directory.
///
/// Returns the number of bytes copied.
///
/// # Errors
///
/// Returns [`InstallerError::CopyFailed`] naming both paths on failure.
pub fn copy_file(from: &Utf8Path, to: &Utf8Path) -> Result<u64> {
    let copy = || -> io::Result<u64> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(from, to)
    };
    let bytes = copy().map_err(|source| copy_failed(from, to, source))?;
    debug!("copied {from} -> {to} ({bytes} bytes)");
    Ok(bytes)
}

/// Recursively copy the directory `from` to `to`.
///
/// `to` must not exist yet or must be an empty directory. Returns the
/// number of files copied.
///
/// # Errors
///
/// Returns [`InstallerError::CopyFailed`] naming the failing entry.
pub fn copy_tree(from: &Utf8Path, to: &Utf8Path) -> Result<usize> {
    fs::create_dir_all(to).map_err(|source| copy_failed(from, to, source))?;

    let mut files = 0;
    for entry in WalkDir::new(from)
        .follow_links(true)
        .sort_by_file_name()
        .min_depth(1)
    {
        let entry = entry.map_err(|e| copy_failed(from, to, walk_error(e)))?;
        let source = utf8_path(entry.path())?;
        let relative = source
            .strip_prefix(from)
            .map_err(|e| copy_failed(from, to, io::Error::other(e)))?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| copy_failed(&source, &target, e))?;
        } else {
            fs::copy(&source, &target).map_err(|e| copy_failed(&source, &target, e))?;
            files += 1;
        }
    }

    debug!("copied tree {from} -> {to} ({files} files)");
    Ok(files)
}

/// Compute a SHA-256 digest over a directory tree.
///
/// The digest covers every relative path (directories included) and the
/// contents of every file, visited in file-name order. Two trees with the
/// same digest have the same listing and the same bytes.
///
/// # Errors
///
/// Returns an I/O error if any entry cannot be read.
pub fn tree_digest(root: &Utf8Path) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    for entry in WalkDir::new(root).sort_by_file_name().min_depth(1) {
        let entry = entry.map_err(walk_error)?;
        let path = utf8_path(entry.path())?;
        let relative = path.strip_prefix(root).map_err(io::Error::other)?;

        // Separators keep "a" + "bc" distinct from "ab" + "c".
        if entry.file_type().is_dir() {
            hasher.update(b"d\0");
            hasher.update(relative.as_str().as_bytes());
            hasher.update(b"\0");
            continue;
        }

        hasher.update(b"f\0");
        hasher.update(relative.as_str().as_bytes());
        hasher.update(b"\0");
        let mut file = fs::File::open(&path)?;
        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}

fn copy_failed(from: &Utf8Path, to: &Utf8Path, source: io::Error) -> InstallerError {
    InstallerError::CopyFailed {
        from: from.to_owned(),
        to: to.to_owned(),
        source,
    }
}

fn walk_error(error: walkdir::Error) -> io::Error {
    error
        .into_io_error()
        .unwrap_or_else(|| io::Error::other("symlink loop in source tree"))
}

pub(crate) fn utf8_path(path: &std::path::Path) -> Result<Utf8PathBuf> {
    Utf8PathBuf::try_from(path.to_path_buf()).map_err(|e| InstallerError::NonUtf8Path {
        path: e.into_path_buf().display().to_string(),
    })
}
