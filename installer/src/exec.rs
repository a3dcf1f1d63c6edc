//! External command execution.
//!
//! The code generator and the Python installer framework are opaque
//! collaborators: the installer only needs to run them in the right
//! directory and know whether they succeeded.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fmt;
use std::process::{Command, Output};

/// A program, its arguments, and the directory to run it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// Working directory for the process.
    pub cwd: Utf8PathBuf,
}

impl Invocation {
    /// Build an invocation from an argv list.
    ///
    /// Returns `None` when `argv` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use panda_installer::exec::Invocation;
    ///
    /// let argv = ["python3", "-m", "pip", "install", "."].map(String::from);
    /// let invocation = Invocation::from_argv(&argv, Utf8Path::new("/src/panda/pypanda"))
    ///     .expect("non-empty argv");
    /// assert_eq!(invocation.program, "python3");
    /// assert_eq!(invocation.to_string(), "python3 -m pip install .");
    /// ```
    #[must_use]
    pub fn from_argv(argv: &[String], cwd: &Utf8Path) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            cwd: cwd.to_owned(),
        })
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs the invocation and returns its captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camino::Utf8Path;
    /// use panda_installer::exec::{CommandExecutor, Invocation, SystemCommandExecutor};
    ///
    /// let argv = ["python3".to_owned(), "--version".to_owned()];
    /// let invocation = Invocation::from_argv(&argv, Utf8Path::new(".")).expect("argv");
    /// let output = SystemCommandExecutor.run(&invocation)?;
    /// assert!(output.status.success());
    /// # Ok::<(), panda_installer::error::InstallerError>(())
    /// ```
    fn run(&self, invocation: &Invocation) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, invocation: &Invocation) -> Result<Output> {
        debug!("running `{invocation}` in {}", invocation.cwd);
        Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .output()
            .map_err(InstallerError::from)
    }
}

/// Run `invocation` and turn a non-zero exit into the error built by
/// `on_failure` from the trimmed stderr.
///
/// # Errors
///
/// Returns the spawn error, or the error produced by `on_failure`.
pub fn run_checked<F>(
    executor: &dyn CommandExecutor,
    invocation: &Invocation,
    on_failure: F,
) -> Result<Output>
where
    F: FnOnce(String) -> InstallerError,
{
    let output = executor.run(invocation)?;
    if output.status.success() {
        return Ok(output);
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
    let message = if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    };
    Err(on_failure(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{failure_output, success_output};
    use rstest::rstest;

    fn invocation() -> Invocation {
        let argv = ["python3", "-m", "pip", "install", "."].map(String::from);
        Invocation::from_argv(&argv, Utf8Path::new("/src/panda/pypanda")).expect("argv")
    }

    #[test]
    fn from_argv_rejects_empty_argv() {
        assert!(Invocation::from_argv(&[], Utf8Path::new("/")).is_none());
    }

    #[test]
    fn display_joins_program_and_args() {
        assert_eq!(invocation().to_string(), "python3 -m pip install .");
    }

    #[test]
    fn run_checked_passes_through_success() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run()
            .withf(|inv| inv.program == "python3" && inv.cwd == "/src/panda/pypanda")
            .times(1)
            .returning(|_| Ok(success_output()));

        let result = run_checked(&executor, &invocation(), |message| {
            InstallerError::StubMismatch { message }
        });

        assert!(result.is_ok());
    }

    #[rstest]
    #[case::with_stderr("  error: no setup.py\n", "error: no setup.py")]
    #[case::silent_failure("", "exited with")]
    fn run_checked_maps_failures(#[case] stderr: &'static str, #[case] expected: &str) {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run()
            .times(1)
            .returning(move |_| Ok(failure_output(stderr)));

        let err = run_checked(&executor, &invocation(), |message| {
            InstallerError::StubMismatch { message }
        })
        .expect_err("expected failure");

        assert!(
            matches!(err, InstallerError::StubMismatch { ref message } if message.contains(expected)),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn run_checked_propagates_spawn_errors() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run()
            .returning(|_| Err(std::io::Error::from(std::io::ErrorKind::NotFound).into()));

        let err = run_checked(&executor, &invocation(), |message| {
            InstallerError::StubMismatch { message }
        })
        .expect_err("spawn failure");

        assert!(matches!(err, InstallerError::Io(_)));
    }
}
