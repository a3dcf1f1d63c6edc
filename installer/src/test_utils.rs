//! Shared test utilities for the installer crate.
//!
//! Available to unit tests and, through the `test-support` feature, to the
//! behaviour tests under `tests/`.

use crate::arch::{ArchitectureSet, NamingRules};
use crate::error::{InstallerError, Result};
use crate::exec::{CommandExecutor, Invocation};
use crate::layout::{ProjectLayout, resolve};
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.unsigned_abs())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The program to execute (e.g. "python3").
    pub program: &'static str,
    /// The arguments to pass to the program.
    pub args: Vec<&'static str>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Expect `program args...` and answer with a successful exit.
    #[must_use]
    pub fn succeeding(program: &'static str, args: &[&'static str]) -> Self {
        Self {
            program,
            args: args.to_vec(),
            result: Ok(success_output()),
        }
    }

    /// Expect `program args...` and answer with exit code 1 and `stderr`.
    #[must_use]
    pub fn failing(program: &'static str, args: &[&'static str], stderr: &str) -> Self {
        Self {
            program,
            args: args.to_vec(),
            result: Ok(failure_output(stderr)),
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Replays the expected invocations in order and records every invocation
/// it receives, including their working directories.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    received: RefCell<Vec<Invocation>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            received: RefCell::new(Vec::new()),
        }
    }

    /// Returns `true` when every expected invocation has been consumed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.expected.borrow().is_empty()
    }

    /// Invocations received so far, in order.
    #[must_use]
    pub fn received(&self) -> Vec<Invocation> {
        self.received.borrow().clone()
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, invocation: &Invocation) -> Result<Output> {
        self.received.borrow_mut().push(invocation.clone());

        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(InstallerError::StubMismatch {
                message: format!("unexpected invocation: {invocation}"),
            });
        };

        let args: Vec<&str> = invocation.args.iter().map(String::as_str).collect();
        if call.program != invocation.program || call.args != args {
            return Err(InstallerError::StubMismatch {
                message: format!(
                    "expected `{} {}`, got `{invocation}`",
                    call.program,
                    call.args.join(" ")
                ),
            });
        }

        call.result
    }
}

/// A fake PANDA checkout with build outputs for a set of architectures.
#[derive(Debug, Clone)]
pub struct FakeCheckout {
    /// Resolved layout of the checkout.
    pub layout: ProjectLayout,
}

impl FakeCheckout {
    /// Populate `repo_root` with BIOS images and complete build outputs for
    /// every architecture in `architectures`.
    ///
    /// The staging root is `panda/pypanda/panda/data` inside `repo_root`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while writing the tree.
    pub fn create(
        repo_root: &Utf8Path,
        architectures: &ArchitectureSet,
        rules: &NamingRules,
    ) -> io::Result<Self> {
        let layout = ProjectLayout::new(
            repo_root,
            Utf8Path::new("build"),
            Utf8Path::new("pc-bios"),
            Utf8Path::new("panda/pypanda/panda/data"),
        );

        fs::create_dir_all(layout.bios_dir.join("keymaps"))?;
        fs::write(layout.bios_dir.join("bios-256k.bin"), b"seabios")?;
        fs::write(layout.bios_dir.join("keymaps/en-us"), b"map 0x409")?;
        fs::create_dir_all(repo_root.join("panda/pypanda"))?;

        for arch in architectures {
            let sources = resolve(arch, rules, &layout.build_root, &layout.staging_root).sources;
            fs::create_dir_all(sources.plugins.join("osi"))?;
            fs::write(&sources.library, format!("ELF libpanda-{arch}"))?;
            fs::write(&sources.bindings, format!("# plog bindings for {arch}\n"))?;
            fs::write(
                sources.plugins.join(format!("panda_syscalls2-{arch}.so")),
                format!("syscalls2 {arch}"),
            )?;
            fs::write(
                sources.plugins.join("osi").join("osi.so"),
                format!("osi {arch}"),
            )?;
        }

        Ok(Self { layout })
    }

    /// Delete one build output, relative to the build root.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised by the removal.
    pub fn remove_build_output(&self, relative: &str) -> io::Result<Utf8PathBuf> {
        let path = self.layout.build_root.join(relative);
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        Ok(path)
    }
}
