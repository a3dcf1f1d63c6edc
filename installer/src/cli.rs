//! CLI argument definitions for the PANDA installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint so the behaviour tests can parse the same
//! arguments the binary does.

use crate::arch::Architecture;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};

/// Stage PANDA build outputs into the Python package and install it.
#[derive(Parser, Debug)]
#[command(name = "panda-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Stage PANDA build outputs into the Python package and install it.\n\n",
    "A distribution install copies the BIOS images and, for every architecture, ",
    "libpanda, its plugins and the generated plog bindings into ",
    "panda/pypanda/panda/data before running the Python installer. A development ",
    "install removes that directory instead, so the panda Python package loads ",
    "everything from the build tree. Relative --build-dir and --staging-dir paths ",
    "are resolved against the repository root, not the current directory.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Stage and install for all default architectures:\n",
    "    $ panda-installer install\n\n",
    "  Editable install against the build tree:\n",
    "    $ panda-installer develop\n\n",
    "  Stage two architectures from an out-of-tree build:\n",
    "    $ panda-installer stage --build-dir /scratch/panda-build --arch arm --arch x86_64\n\n",
    "  Inspect the staged bundle:\n",
    "    $ panda-installer status --json",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options accepted before or after the subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// PANDA checkout root [default: discovered from the current directory].
    #[arg(long, value_name = "DIR", global = true)]
    pub repo_root: Option<Utf8PathBuf>,

    /// Configuration file [default: <repo-root>/panda-installer.toml].
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Increase diagnostic output (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet",
        global = true
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Stage artefacts, then run the Python installer.
    Install(InstallArgs),

    /// Remove staged artefacts, then run an editable install.
    Develop(DevelopArgs),

    /// Stage artefacts without installing.
    Stage(StageArgs),

    /// Remove the staging directory.
    Clean(CleanArgs),

    /// Report what is currently staged.
    Status(StatusArgs),
}

/// Where build outputs come from and which architectures to stage.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Build output root, relative to the repository root [default: build].
    #[arg(short, long, value_name = "DIR")]
    pub build_dir: Option<Utf8PathBuf>,

    /// Stage only this architecture (can be repeated).
    #[arg(short, long, value_name = "NAME", value_parser = parse_architecture)]
    pub arch: Vec<Architecture>,
}

/// Arguments for the install command.
#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// Build outputs and architectures.
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Package data directory, relative to the repository root
    /// [default: panda/pypanda/panda/data].
    #[arg(short, long, value_name = "DIR")]
    pub staging_dir: Option<Utf8PathBuf>,

    /// Do not run the data bindings generator first.
    #[arg(long)]
    pub skip_codegen: bool,

    /// Show what would happen and exit without changing anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the develop command.
#[derive(Args, Debug, Clone, Default)]
pub struct DevelopArgs {
    /// Package data directory, relative to the repository root
    /// [default: panda/pypanda/panda/data].
    #[arg(short, long, value_name = "DIR")]
    pub staging_dir: Option<Utf8PathBuf>,

    /// Do not run the data bindings generator first.
    #[arg(long)]
    pub skip_codegen: bool,

    /// Show what would happen and exit without changing anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the stage command.
#[derive(Args, Debug, Clone, Default)]
pub struct StageArgs {
    /// Build outputs and architectures.
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Package data directory, relative to the repository root
    /// [default: panda/pypanda/panda/data].
    #[arg(short, long, value_name = "DIR")]
    pub staging_dir: Option<Utf8PathBuf>,

    /// Show what would happen and exit without changing anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the clean command.
#[derive(Args, Debug, Clone, Default)]
pub struct CleanArgs {
    /// Package data directory, relative to the repository root
    /// [default: panda/pypanda/panda/data].
    #[arg(short, long, value_name = "DIR")]
    pub staging_dir: Option<Utf8PathBuf>,
}

/// Arguments for the status command.
#[derive(Args, Debug, Clone, Default)]
pub struct StatusArgs {
    /// Package data directory, relative to the repository root
    /// [default: panda/pypanda/panda/data].
    #[arg(short, long, value_name = "DIR")]
    pub staging_dir: Option<Utf8PathBuf>,

    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,
}

impl Command {
    /// The `--staging-dir` override, whichever subcommand carries it.
    #[must_use]
    pub fn staging_dir(&self) -> Option<&Utf8Path> {
        let dir = match self {
            Self::Install(args) => &args.staging_dir,
            Self::Develop(args) => &args.staging_dir,
            Self::Stage(args) => &args.staging_dir,
            Self::Clean(args) => &args.staging_dir,
            Self::Status(args) => &args.staging_dir,
        };
        dir.as_deref()
    }

    /// Build output and architecture overrides, for subcommands that stage.
    #[must_use]
    pub fn selection(&self) -> Option<&SelectionArgs> {
        match self {
            Self::Install(args) => Some(&args.selection),
            Self::Stage(args) => Some(&args.selection),
            Self::Develop(_) | Self::Clean(_) | Self::Status(_) => None,
        }
    }

    /// Whether `--dry-run` was given.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        match self {
            Self::Install(args) => args.dry_run,
            Self::Develop(args) => args.dry_run,
            Self::Stage(args) => args.dry_run,
            Self::Clean(_) | Self::Status(_) => false,
        }
    }

    /// Subcommand name as typed on the command line.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Install(_) => "install",
            Self::Develop(_) => "develop",
            Self::Stage(_) => "stage",
            Self::Clean(_) => "clean",
            Self::Status(_) => "status",
        }
    }
}

fn parse_architecture(value: &str) -> Result<Architecture, String> {
    Architecture::try_from(value).map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
