//! PANDA checkout discovery.
//!
//! The installer runs from anywhere inside a PANDA checkout. The checkout
//! root is the nearest ancestor that carries `panda-installer.toml`, or
//! both the `pc-bios/` directory and the `panda/pypanda/` package.

use crate::config::CONFIG_FILE_NAME;
use crate::error::{InstallerError, Result};
use crate::layout::BIOS_DIR_NAME;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;

/// Python package directory every PANDA checkout contains.
const PYPANDA_DIR: &str = "panda/pypanda";

/// Checks whether `dir` is the root of a PANDA checkout.
#[must_use]
pub fn is_panda_checkout(dir: &Utf8Path) -> bool {
    if dir.join(CONFIG_FILE_NAME).is_file() {
        return true;
    }
    dir.join(BIOS_DIR_NAME).is_dir() && dir.join(PYPANDA_DIR).is_dir()
}

/// Walk up from `start` to the nearest PANDA checkout root.
///
/// # Errors
///
/// Returns [`InstallerError::RepoRootNotFound`] when no ancestor qualifies.
pub fn find_repo_root(start: &Utf8Path) -> Result<Utf8PathBuf> {
    let found = start.ancestors().find(|dir| is_panda_checkout(dir));
    match found {
        Some(root) => {
            debug!("found PANDA checkout at {root}");
            Ok(root.to_owned())
        }
        None => Err(InstallerError::RepoRootNotFound {
            reason: format!(
                "no directory above {start} contains {CONFIG_FILE_NAME} or both \
                 {BIOS_DIR_NAME}/ and {PYPANDA_DIR}/; pass --repo-root"
            ),
        }),
    }
}

/// Resolve the checkout root from an explicit override or the current
/// directory.
///
/// An override is taken as given as long as it is a directory.
///
/// # Errors
///
/// Returns [`InstallerError::RepoRootNotFound`] if the override is not a
/// directory, the current directory is not UTF-8, or discovery fails.
pub fn resolve_repo_root(repo_root: Option<&Utf8Path>) -> Result<Utf8PathBuf> {
    if let Some(root) = repo_root {
        if root.is_dir() {
            return Ok(root.to_owned());
        }
        return Err(InstallerError::RepoRootNotFound {
            reason: format!("{root} is not a directory"),
        });
    }
    find_repo_root(&current_dir_utf8()?)
}

/// Gets the current directory as a UTF-8 path.
fn current_dir_utf8() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::try_from(cwd).map_err(|e| InstallerError::RepoRootNotFound {
        reason: format!("current directory is not valid UTF-8: {e}"),
    })
}
