//! Guarded removal and recreation of the staging root.
//!
//! # Warning
//!
//! [`StagingRoot::reset`] and [`StagingRoot::remove`] recursively delete a
//! directory tree. The deletion cannot be undone. Before anything is
//! touched, the path must pass every check below, in order:
//!
//! 1. it is not empty and not a filesystem root;
//! 2. its text contains the package name token (`panda` by default);
//! 3. if it exists, it is a directory;
//! 4. if that directory is not empty, it carries the ownership marker
//!    written by a previous [`StagingRoot::reset`].
//!
//! Any failure aborts with an error and leaves the filesystem unchanged.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;

/// File written into a staging root when it is created.
pub const OWNERSHIP_MARKER: &str = ".panda-installer-owned";

/// Name token required in the staging root path by default.
pub const DEFAULT_PACKAGE_TOKEN: &str = "panda";

/// Name recorded in the ownership marker.
const TOOL_NAME: &str = "panda-installer";

/// Content of the ownership marker.
///
/// Holds no timestamps, so repeated staging runs write identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipMarker {
    /// Package the directory belongs to.
    pub package: String,
    /// Tool that created the directory.
    pub tool: String,
}

/// The directory a staging run owns, threaded explicitly through staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingRoot {
    path: Utf8PathBuf,
    token: String,
}

impl StagingRoot {
    /// Wrap `path`, requiring `token` in its text before any deletion.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, token: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            token: token.into(),
        }
    }

    /// The guarded path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The package name token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Path of the ownership marker inside this root.
    #[must_use]
    pub fn marker_path(&self) -> Utf8PathBuf {
        self.path.join(OWNERSHIP_MARKER)
    }

    /// Run every safety check without modifying anything.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::UnsafeStagingRoot`] when the path fails a
    /// naming or type check and [`InstallerError::UnownedStagingRoot`] when
    /// a populated directory lacks the ownership marker.
    pub fn check(&self) -> Result<()> {
        self.check_path_text()?;

        if !self.path.exists() {
            return Ok(());
        }
        if !self.path.is_dir() {
            return Err(self.unsafe_root("path exists but is not a directory"));
        }
        if self.marker_path().is_file() || is_empty_dir(&self.path)? {
            return Ok(());
        }
        Err(InstallerError::UnownedStagingRoot {
            path: self.path.clone(),
            marker: OWNERSHIP_MARKER,
        })
    }

    /// Delete the root if present, then recreate it empty with a marker.
    ///
    /// Returns `true` when a previous tree was removed.
    ///
    /// # Errors
    ///
    /// Returns a safety error from [`Self::check`] before any deletion, or
    /// an I/O error if deletion or creation fails.
    pub fn reset(&self) -> Result<bool> {
        let removed = self.remove()?;
        fs::create_dir_all(&self.path)?;
        self.write_marker()?;
        info!("created staging root {}", self.path);
        Ok(removed)
    }

    /// Delete the root if present without recreating it.
    ///
    /// Returns `true` when something was removed.
    ///
    /// # Errors
    ///
    /// Returns a safety error from [`Self::check`] before any deletion, or
    /// an I/O error if deletion fails.
    pub fn remove(&self) -> Result<bool> {
        self.check()?;
        if !self.path.exists() {
            return Ok(false);
        }
        warn!("removing staging root {}", self.path);
        fs::remove_dir_all(&self.path)?;
        Ok(true)
    }

    fn write_marker(&self) -> Result<()> {
        let marker = OwnershipMarker {
            package: self.token.clone(),
            tool: TOOL_NAME.to_owned(),
        };
        let mut json = serde_json::to_string_pretty(&marker)
            .map_err(|e| InstallerError::Io(std::io::Error::other(e)))?;
        json.push('\n');
        fs::write(self.marker_path(), json)?;
        Ok(())
    }

    fn check_path_text(&self) -> Result<()> {
        if self.path.as_str().trim().is_empty() {
            return Err(self.unsafe_root("path is empty"));
        }
        if self.path.parent().is_none() {
            return Err(self.unsafe_root("path is a filesystem root"));
        }
        if self.token.is_empty() {
            return Err(self.unsafe_root("package name token is empty"));
        }
        if !self.path.as_str().contains(&self.token) {
            return Err(self.unsafe_root(&format!("path does not contain \"{}\"", self.token)));
        }
        Ok(())
    }

    fn unsafe_root(&self, reason: &str) -> InstallerError {
        InstallerError::UnsafeStagingRoot {
            path: self.path.clone(),
            reason: reason.to_owned(),
        }
    }
}

/// Read the ownership marker of `root`, if it has one.
///
/// Returns `None` for a missing or unreadable marker.
#[must_use]
pub fn read_marker(root: &Utf8Path) -> Option<OwnershipMarker> {
    let content = fs::read_to_string(root.join(OWNERSHIP_MARKER)).ok()?;
    serde_json::from_str(&content).ok()
}

fn is_empty_dir(path: &Utf8Path) -> Result<bool> {
    Ok(path.read_dir_utf8()?.next().is_none())
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
