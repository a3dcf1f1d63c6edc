//! Error types for the PANDA installer.
//!
//! Each variant names the offending path or command and, where the operator
//! can do something about it, says what to run next.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while staging artefacts or driving the install
/// lifecycle.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// A build output required for staging does not exist.
    #[error("missing file {path} - {hint}")]
    MissingArtefact {
        /// Path where the artefact was expected.
        path: Utf8PathBuf,
        /// Corrective action for the operator.
        hint: &'static str,
    },

    /// A deletion target failed the path-naming safety check.
    #[error("refusing to remove {path}: {reason}")]
    UnsafeStagingRoot {
        /// The rejected staging root.
        path: Utf8PathBuf,
        /// Which part of the check failed.
        reason: String,
    },

    /// A non-empty directory lacks the ownership marker written at creation.
    #[error(
        "refusing to remove {path}: directory is not empty and has no {marker} marker; \
         remove it by hand if it is safe to do so"
    )]
    UnownedStagingRoot {
        /// The rejected staging root.
        path: Utf8PathBuf,
        /// File name of the expected marker.
        marker: &'static str,
    },

    /// Copying a file or directory tree into the staging root failed.
    #[error("failed to copy {from} to {to}")]
    CopyFailed {
        /// Source path.
        from: Utf8PathBuf,
        /// Destination path.
        to: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An architecture name cannot be used as a path component.
    #[error("invalid architecture name \"{name}\": {reason}")]
    InvalidArchitecture {
        /// The rejected name.
        name: String,
        /// Description of the validation failure.
        reason: &'static str,
    },

    /// A naming template would place artefacts outside their directory.
    #[error("invalid naming.{field} template \"{template}\": {reason}")]
    InvalidNamingTemplate {
        /// The `[naming]` key holding the template.
        field: &'static str,
        /// The rejected template.
        template: String,
        /// Description of the validation failure.
        reason: &'static str,
    },

    /// The same architecture was listed twice.
    #[error("architecture {name} is listed more than once")]
    DuplicateArchitecture {
        /// The repeated name.
        name: String,
    },

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration at {path}: {reason}")]
    InvalidConfig {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// No PANDA checkout could be located.
    #[error("PANDA repository not found: {reason}")]
    RepoRootNotFound {
        /// Description of why discovery failed.
        reason: String,
    },

    /// The code generation step exited unsuccessfully.
    #[error("code generation ({command}) failed: {message}")]
    CodegenFailed {
        /// The command line that was run.
        command: String,
        /// Trimmed stderr of the command.
        message: String,
    },

    /// The underlying installer framework exited unsuccessfully.
    #[error("{mode} install ({command}) failed: {message}")]
    FrameworkFailed {
        /// The lifecycle mode being installed.
        mode: &'static str,
        /// The command line that was run.
        command: String,
        /// Trimmed stderr of the command.
        message: String,
    },

    /// A path could not be represented as UTF-8.
    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path {
        /// Lossy rendering of the path.
        path: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialising the staging status failed.
    #[error("failed to serialize staging status: {source}")]
    SerializeStatus {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Hint attached to [`InstallerError::MissingArtefact`] for build outputs.
pub const RUN_BUILD_FIRST: &str = "did you run build.sh from the panda/build directory?";

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
