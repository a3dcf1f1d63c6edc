//! User-facing output for the installer CLI.
//!
//! Progress and summaries go to stderr so stdout stays free for machine
//! readable output such as `status --json`.

use crate::exec::Invocation;
use crate::layout::ArchitectureLayout;
use crate::lifecycle::{InstallMode, LifecycleOutcome};
use crate::stager::StageReport;
use camino::Utf8Path;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort progress output; ignore write failures.
    }
}

/// Format a success message after staging.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use panda_installer::arch::Architecture;
/// use panda_installer::output::stage_success_message;
/// use panda_installer::stager::StageReport;
///
/// let report = StageReport {
///     staging_root: Utf8PathBuf::from("/src/panda/panda/pypanda/panda/data"),
///     architectures: vec![Architecture::try_from("arm").expect("valid")],
///     files_copied: 12,
///     replaced_previous: false,
/// };
/// assert_eq!(
///     stage_success_message(&report),
///     "Staged 1 architecture (12 files) to /src/panda/panda/pypanda/panda/data"
/// );
/// ```
#[must_use]
pub fn stage_success_message(report: &StageReport) -> String {
    let count = report.architectures.len();
    let plural = if count == 1 {
        "architecture"
    } else {
        "architectures"
    };
    format!(
        "Staged {count} {plural} ({} files) to {}",
        report.files_copied, report.staging_root
    )
}

/// Format a success message after a full lifecycle run.
#[must_use]
pub fn lifecycle_success_message(outcome: &LifecycleOutcome, staging_root: &Utf8Path) -> String {
    match outcome.mode {
        InstallMode::Distribution => "Distribution install complete".to_owned(),
        InstallMode::Development if outcome.removed_stale => format!(
            "Development install complete; removed stale artefacts from {staging_root}"
        ),
        InstallMode::Development => "Development install complete".to_owned(),
    }
}

/// Format the result of a `clean` run.
#[must_use]
pub fn clean_message(removed: bool, staging_root: &Utf8Path) -> String {
    if removed {
        format!("Removed {staging_root}")
    } else {
        format!("Nothing to remove at {staging_root}")
    }
}

/// What a run would do, for `--dry-run`.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use panda_installer::output::DryRunInfo;
///
/// let info = DryRunInfo {
///     action: "stage",
///     repo_root: Utf8Path::new("/src/panda"),
///     staging_root: Utf8Path::new("/src/panda/panda/pypanda/panda/data"),
///     bios_dir: Some(Utf8Path::new("/src/panda/pc-bios")),
///     plan: &[],
///     codegen: None,
///     framework: None,
/// };
/// let text = info.display_text();
/// assert!(text.contains("Dry run"));
/// assert!(text.contains("Action: stage"));
/// ```
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// Subcommand being previewed.
    pub action: &'a str,
    /// Root of the PANDA checkout.
    pub repo_root: &'a Utf8Path,
    /// Directory that would be reset or removed.
    pub staging_root: &'a Utf8Path,
    /// BIOS directory that would be copied, when staging.
    pub bios_dir: Option<&'a Utf8Path>,
    /// Per-architecture copies, when staging.
    pub plan: &'a [ArchitectureLayout],
    /// Code generation command, unless skipped.
    pub codegen: Option<&'a Invocation>,
    /// Installer framework command, for lifecycle runs.
    pub framework: Option<&'a Invocation>,
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - no files will be modified".to_owned(),
            String::new(),
            format!("Action: {}", self.action),
            format!("Repository root: {}", self.repo_root),
            format!("Staging root: {}", self.staging_root),
        ];

        if let Some(codegen) = self.codegen {
            lines.push(format!("Code generation: {codegen} (in {})", codegen.cwd));
        }

        if let Some(bios_dir) = self.bios_dir {
            lines.push(String::new());
            lines.push("Copies:".to_owned());
            lines.push(format!("  {bios_dir}/"));
            for resolved in self.plan {
                let sources = &resolved.sources;
                let destinations = &resolved.destinations;
                lines.push(format!("  [{}]", resolved.arch));
                lines.push(format!("    {} -> {}", sources.library, destinations.library));
                lines.push(format!("    {} -> {}", sources.bindings, destinations.bindings));
                lines.push(format!("    {}/ -> {}/", sources.plugins, destinations.plugins));
            }
        }

        if let Some(framework) = self.framework {
            lines.push(String::new());
            lines.push(format!("Then: {framework} (in {})", framework.cwd));
        }

        lines.join("\n")
    }
}
