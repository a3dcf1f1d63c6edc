//! Staging state inspection.
//!
//! Reports whether the staging root holds a complete bundle for the
//! configured architectures, and renders that report for humans or as JSON.

use crate::arch::Architecture;
use crate::copy::tree_digest;
use crate::error::{InstallerError, Result};
use crate::stager::Stager;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::fmt;

/// Coarse state of the staging root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StagingState {
    /// The staging root does not exist.
    Absent,
    /// Marker, BIOS images and every architecture's artefacts are present.
    Complete,
    /// The staging root exists but something is missing.
    Partial,
}

impl fmt::Display for StagingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Absent => "absent",
            Self::Complete => "complete",
            Self::Partial => "partial",
        };
        f.write_str(label)
    }
}

/// Result of inspecting a staging root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagingStatus {
    /// The inspected directory.
    pub staging_root: Utf8PathBuf,
    /// Overall state.
    pub state: StagingState,
    /// Architectures whose artefacts are all present, in set order.
    pub staged: Vec<Architecture>,
    /// Expected entries that do not exist.
    pub missing: Vec<Utf8PathBuf>,
    /// SHA-256 over the staged tree, when it exists.
    pub digest: Option<String>,
}

/// Inspect the staging root the stager would populate.
///
/// # Errors
///
/// Returns an I/O error if the existing tree cannot be read for hashing.
pub fn inspect(stager: &Stager) -> Result<StagingStatus> {
    let root = stager.staging_root();
    let staging_root = root.path().to_owned();

    if !staging_root.exists() {
        return Ok(StagingStatus {
            staging_root,
            state: StagingState::Absent,
            staged: Vec::new(),
            missing: Vec::new(),
            digest: None,
        });
    }

    let mut missing = Vec::new();
    record_if_absent(&root.marker_path(), &mut missing);
    let bios = stager.layout().bios_destination();
    if !bios.is_dir() {
        missing.push(bios);
    }

    let mut staged = Vec::new();
    for resolved in stager.plan() {
        let dest = &resolved.destinations;
        let before = missing.len();
        record_if_absent(&dest.library, &mut missing);
        record_if_absent(&dest.bindings, &mut missing);
        if !dest.plugins.is_dir() {
            missing.push(dest.plugins.clone());
        }
        if missing.len() == before {
            staged.push(resolved.arch);
        }
    }

    let state = if missing.is_empty() {
        StagingState::Complete
    } else {
        StagingState::Partial
    };

    Ok(StagingStatus {
        digest: Some(tree_digest(&staging_root)?),
        staging_root,
        state,
        staged,
        missing,
    })
}

fn record_if_absent(path: &Utf8Path, missing: &mut Vec<Utf8PathBuf>) {
    if !path.is_file() {
        missing.push(path.to_owned());
    }
}

/// Format a status report for human-readable output.
///
/// # Examples
///
/// ```
/// use panda_installer::status::{StagingState, StagingStatus, format_human};
///
/// let status = StagingStatus {
///     staging_root: "/src/panda/panda/pypanda/panda/data".into(),
///     state: StagingState::Absent,
///     staged: Vec::new(),
///     missing: Vec::new(),
///     digest: None,
/// };
/// assert!(format_human(&status).contains("Nothing is staged"));
/// ```
#[must_use]
pub fn format_human(status: &StagingStatus) -> String {
    if status.state == StagingState::Absent {
        return format!(
            "Nothing is staged at {}.\n\nRun `panda-installer stage` to stage the build outputs.",
            status.staging_root
        );
    }

    let mut output = format!(
        "Staging root: {}\nState: {}\n",
        status.staging_root, status.state
    );

    let staged: Vec<&str> = status.staged.iter().map(Architecture::as_str).collect();
    if staged.is_empty() {
        output.push_str("Architectures: none\n");
    } else {
        output.push_str(&format!("Architectures: {}\n", staged.join(", ")));
    }

    if !status.missing.is_empty() {
        output.push_str("Missing:\n");
        for path in &status.missing {
            output.push_str(&format!("  - {path}\n"));
        }
    }

    if let Some(digest) = &status.digest {
        output.push_str(&format!("Digest: sha256:{digest}\n"));
    }

    output
}

/// Format a status report as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`InstallerError::SerializeStatus`] if serialisation fails.
///
/// # Examples
///
/// ```
/// use panda_installer::status::{StagingState, StagingStatus, format_json};
///
/// let status = StagingStatus {
///     staging_root: "/tmp/panda/data".into(),
///     state: StagingState::Absent,
///     staged: Vec::new(),
///     missing: Vec::new(),
///     digest: None,
/// };
/// let json = format_json(&status)?;
/// assert!(json.contains("\"state\": \"absent\""));
/// # Ok::<(), panda_installer::error::InstallerError>(())
/// ```
pub fn format_json(status: &StagingStatus) -> Result<String> {
    to_json(status)
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|source| InstallerError::SerializeStatus { source })
}
