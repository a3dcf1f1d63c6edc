//! Lifecycle coordination for the two install modes.
//!
//! A distribution install stages a self-contained bundle and then hands
//! over to the Python installer framework. A development install clears
//! any bundle left by an earlier distribution install, so the runtime
//! falls back to reading artefacts from the build tree, and then hands
//! over. Code generation runs first in both modes.

use crate::error::{InstallerError, Result};
use crate::exec::{CommandExecutor, Invocation, run_checked};
use crate::stager::{StageReport, Stager};
use log::info;
use std::fmt;

/// The two mutually exclusive install modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// Stage artefacts into the package, then install it.
    Distribution,
    /// Remove staged artefacts, then install the package in editable mode.
    Development,
}

impl InstallMode {
    /// Lowercase name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Distribution => "distribution",
            Self::Development => "development",
        }
    }
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produces the generated Python data bindings before staging.
#[cfg_attr(test, mockall::automock)]
pub trait CodeGenerator {
    /// Run the generator.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::CodegenFailed`] if generation fails.
    fn generate(&self) -> Result<()>;
}

/// The Python packaging machinery the lifecycle delegates to.
#[cfg_attr(test, mockall::automock)]
pub trait InstallerFramework {
    /// Perform the framework's own install for `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::FrameworkFailed`] if the install fails.
    fn install(&self, mode: InstallMode) -> Result<()>;
}

/// Code generator backed by an external command.
pub struct CommandCodeGenerator<'a> {
    executor: &'a dyn CommandExecutor,
    invocation: Invocation,
}

impl<'a> CommandCodeGenerator<'a> {
    /// Run `invocation` through `executor` when asked to generate.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, invocation: Invocation) -> Self {
        Self {
            executor,
            invocation,
        }
    }
}

impl CodeGenerator for CommandCodeGenerator<'_> {
    fn generate(&self) -> Result<()> {
        info!("generating data bindings with `{}`", self.invocation);
        run_checked(self.executor, &self.invocation, |message| {
            InstallerError::CodegenFailed {
                command: self.invocation.to_string(),
                message,
            }
        })?;
        Ok(())
    }
}

/// Installer framework backed by one external command per mode.
pub struct CommandFramework<'a> {
    executor: &'a dyn CommandExecutor,
    install: Invocation,
    develop: Invocation,
}

impl<'a> CommandFramework<'a> {
    /// Use `install` for distribution installs and `develop` for
    /// development installs.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, install: Invocation, develop: Invocation) -> Self {
        Self {
            executor,
            install,
            develop,
        }
    }

    fn invocation(&self, mode: InstallMode) -> &Invocation {
        match mode {
            InstallMode::Distribution => &self.install,
            InstallMode::Development => &self.develop,
        }
    }
}

impl InstallerFramework for CommandFramework<'_> {
    fn install(&self, mode: InstallMode) -> Result<()> {
        let invocation = self.invocation(mode);
        info!("running {mode} install: `{invocation}`");
        run_checked(self.executor, invocation, |message| {
            InstallerError::FrameworkFailed {
                mode: mode.as_str(),
                command: invocation.to_string(),
                message,
            }
        })?;
        Ok(())
    }
}

/// What a lifecycle run did before handing over to the framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleOutcome {
    /// The mode that ran.
    pub mode: InstallMode,
    /// Staging report for distribution installs.
    pub staged: Option<StageReport>,
    /// Whether a development install removed a stale bundle.
    pub removed_stale: bool,
}

/// Binds code generation, staging and the framework into one run.
pub struct Lifecycle<'a> {
    stager: &'a Stager,
    codegen: Option<&'a dyn CodeGenerator>,
    framework: &'a dyn InstallerFramework,
}

impl<'a> Lifecycle<'a> {
    /// Create a lifecycle without a code generation step.
    #[must_use]
    pub fn new(stager: &'a Stager, framework: &'a dyn InstallerFramework) -> Self {
        Self {
            stager,
            codegen: None,
            framework,
        }
    }

    /// Run `codegen` before anything else.
    #[must_use]
    pub fn with_codegen(mut self, codegen: &'a dyn CodeGenerator) -> Self {
        self.codegen = Some(codegen);
        self
    }

    /// Execute the lifecycle for `mode`.
    ///
    /// The framework is only reached when every earlier step succeeded.
    ///
    /// # Errors
    ///
    /// Returns the first failure from code generation, staging or removal,
    /// or the framework's own failure.
    pub fn run(&self, mode: InstallMode) -> Result<LifecycleOutcome> {
        if let Some(codegen) = self.codegen {
            codegen.generate()?;
        }

        let mut outcome = LifecycleOutcome {
            mode,
            staged: None,
            removed_stale: false,
        };
        match mode {
            InstallMode::Distribution => {
                outcome.staged = Some(self.stager.stage()?);
            }
            InstallMode::Development => {
                outcome.removed_stale = self.stager.staging_root().remove()?;
                if outcome.removed_stale {
                    info!("cleared staged artefacts; runtime will read the build tree");
                }
            }
        }

        self.framework.install(mode)?;
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
