//! Subcommand orchestration.
//!
//! Turns parsed CLI arguments plus the checkout configuration into a
//! [`Stager`] and the external collaborators, then runs the requested
//! subcommand. Lives in the library so the behaviour tests drive exactly
//! what the binary runs, with a stub executor in place of real processes.

use crate::arch::{Architecture, ArchitectureSet};
use crate::cli::{Cli, Command, SelectionArgs};
use crate::config::{CONFIG_FILE_NAME, InstallerConfig};
use crate::error::{InstallerError, Result};
use crate::exec::{CommandExecutor, Invocation};
use crate::layout::ProjectLayout;
use crate::lifecycle::{CommandCodeGenerator, CommandFramework, InstallMode, Lifecycle};
use crate::output::{
    DryRunInfo, clean_message, lifecycle_success_message, stage_success_message,
    write_stderr_line,
};
use crate::stager::Stager;
use crate::status::{format_human, format_json, inspect};
use crate::workspace::resolve_repo_root;
use camino::Utf8PathBuf;
use log::debug;
use std::io::Write;

/// Everything a subcommand needs, resolved from the CLI and configuration.
#[derive(Debug)]
pub struct RunContext {
    /// Root of the PANDA checkout.
    pub repo_root: Utf8PathBuf,
    /// Where the configuration was (or would have been) read from.
    pub config_path: Utf8PathBuf,
    /// Effective configuration.
    pub config: InstallerConfig,
    /// Stager for the effective layout and architectures.
    pub stager: Stager,
    /// Working directory of the external commands.
    pub package_dir: Utf8PathBuf,
    /// Suppress progress output.
    pub quiet: bool,
}

impl RunContext {
    /// Resolve the checkout, load its configuration and apply CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkout cannot be found, the configuration
    /// is invalid, or the architecture selection is malformed.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let repo_root = resolve_repo_root(cli.global.repo_root.as_deref())?;
        let (config_path, config) = match &cli.global.config {
            Some(path) => (path.clone(), InstallerConfig::load_from(path)?),
            None => (
                repo_root.join(CONFIG_FILE_NAME),
                InstallerConfig::load(&repo_root)?,
            ),
        };

        let selection = cli.command.selection();
        let build_dir = selection
            .and_then(|s| s.build_dir.as_deref())
            .unwrap_or(config.build_dir.as_path());
        let staging_dir = cli.command.staging_dir().unwrap_or(config.staging_dir.as_path());
        let layout = ProjectLayout::new(&repo_root, build_dir, &config.bios_dir, staging_dir);
        let architectures = select_architectures(selection, &config)?;
        debug!(
            "staging {} architecture(s) from {} into {}",
            architectures.len(),
            layout.build_root,
            layout.staging_root
        );

        let stager = Stager::new(
            layout,
            config.naming.clone(),
            architectures,
            &config.package_token,
        );
        let package_dir = repo_root.join(&config.package_dir);

        Ok(Self {
            repo_root,
            config_path,
            config,
            stager,
            package_dir,
            quiet: cli.global.quiet,
        })
    }

    /// The configured command for `argv`, run in the package directory.
    fn invocation(&self, name: &str, argv: &[String]) -> Result<Invocation> {
        Invocation::from_argv(argv, &self.package_dir).ok_or_else(|| {
            InstallerError::InvalidConfig {
                path: self.config_path.clone(),
                reason: format!("commands.{name} must not be empty"),
            }
        })
    }

    fn codegen_invocation(&self) -> Result<Invocation> {
        self.invocation("codegen", &self.config.commands.codegen)
    }

    fn framework_invocations(&self) -> Result<(Invocation, Invocation)> {
        Ok((
            self.invocation("install", &self.config.commands.install)?,
            self.invocation("develop", &self.config.commands.develop)?,
        ))
    }

    fn progress(&self, stderr: &mut dyn Write, message: impl std::fmt::Display) {
        if !self.quiet {
            write_stderr_line(stderr, message);
        }
    }
}

fn select_architectures(
    selection: Option<&SelectionArgs>,
    config: &InstallerConfig,
) -> Result<ArchitectureSet> {
    match selection {
        Some(selection) if !selection.arch.is_empty() => {
            ArchitectureSet::from_names(selection.arch.iter().map(Architecture::as_str))
        }
        _ => config.architecture_set(),
    }
}

/// Run the subcommand in `cli` with `executor` standing in for processes.
///
/// Machine-readable output goes to `stdout`; progress goes to `stderr`.
///
/// # Errors
///
/// Returns the first error raised by the subcommand.
pub fn run(
    cli: &Cli,
    executor: &dyn CommandExecutor,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    let context = RunContext::resolve(cli)?;

    if cli.command.is_dry_run() {
        return run_dry(cli, &context, stderr);
    }

    match &cli.command {
        Command::Install(args) => run_lifecycle(
            &context,
            executor,
            InstallMode::Distribution,
            args.skip_codegen,
            stderr,
        ),
        Command::Develop(args) => run_lifecycle(
            &context,
            executor,
            InstallMode::Development,
            args.skip_codegen,
            stderr,
        ),
        Command::Stage(_) => run_stage(&context, stderr),
        Command::Clean(_) => run_clean(&context, stderr),
        Command::Status(args) => run_status(&context, args.json, stdout),
    }
}

fn run_lifecycle(
    context: &RunContext,
    executor: &dyn CommandExecutor,
    mode: InstallMode,
    skip_codegen: bool,
    stderr: &mut dyn Write,
) -> Result<()> {
    let (install, develop) = context.framework_invocations()?;
    let framework = CommandFramework::new(executor, install, develop);
    let codegen = if skip_codegen {
        None
    } else {
        Some(CommandCodeGenerator::new(
            executor,
            context.codegen_invocation()?,
        ))
    };

    let mut lifecycle = Lifecycle::new(&context.stager, &framework);
    if let Some(codegen) = &codegen {
        lifecycle = lifecycle.with_codegen(codegen);
    }

    let staging_root = context.stager.staging_root().path();
    context.progress(stderr, format!("Running {mode} install..."));
    let outcome = lifecycle.run(mode)?;

    if let Some(report) = &outcome.staged {
        context.progress(stderr, stage_success_message(report));
    }
    context.progress(stderr, lifecycle_success_message(&outcome, staging_root));
    Ok(())
}

fn run_stage(context: &RunContext, stderr: &mut dyn Write) -> Result<()> {
    let staging_root = context.stager.staging_root().path();
    context.progress(stderr, format!("Staging artefacts to {staging_root}..."));
    let report = context.stager.stage()?;
    context.progress(stderr, stage_success_message(&report));
    Ok(())
}

fn run_clean(context: &RunContext, stderr: &mut dyn Write) -> Result<()> {
    let staging_root = context.stager.staging_root();
    let removed = staging_root.remove()?;
    context.progress(stderr, clean_message(removed, staging_root.path()));
    Ok(())
}

fn run_status(context: &RunContext, json: bool, stdout: &mut dyn Write) -> Result<()> {
    let status = inspect(&context.stager)?;
    let text = if json {
        format_json(&status)?
    } else {
        format_human(&status)
    };
    writeln!(stdout, "{text}").map_err(|source| InstallerError::WriteFailed { source })
}

/// Print what the subcommand would do without touching anything.
fn run_dry(cli: &Cli, context: &RunContext, stderr: &mut dyn Write) -> Result<()> {
    let stages = matches!(cli.command, Command::Install(_) | Command::Stage(_));
    let skip_codegen = match &cli.command {
        Command::Install(args) => args.skip_codegen,
        Command::Develop(args) => args.skip_codegen,
        Command::Stage(_) | Command::Clean(_) | Command::Status(_) => true,
    };

    let plan = if stages {
        context.stager.plan()
    } else {
        Vec::new()
    };
    let codegen = if skip_codegen {
        None
    } else {
        Some(context.codegen_invocation()?)
    };
    let framework = match &cli.command {
        Command::Install(_) => Some(context.framework_invocations()?.0),
        Command::Develop(_) => Some(context.framework_invocations()?.1),
        Command::Stage(_) | Command::Clean(_) | Command::Status(_) => None,
    };

    let layout = context.stager.layout();
    let info = DryRunInfo {
        action: cli.command.name(),
        repo_root: &context.repo_root,
        staging_root: &layout.staging_root,
        bios_dir: stages.then_some(layout.bios_dir.as_path()),
        plan: &plan,
        codegen: codegen.as_ref(),
        framework: framework.as_ref(),
    };
    write_stderr_line(stderr, info.display_text());
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
