//! Test support utilities for installer behavioural tests.
//!
//! Provides a throwaway PANDA checkout with complete build outputs and a
//! helper that runs a CLI invocation against it through a stub executor.

// Each behaviour binary uses a different subset of these helpers.
#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use panda_installer::arch::{ArchitectureSet, NamingRules};
use panda_installer::cli::Cli;
use panda_installer::commands::run;
use panda_installer::copy::tree_digest;
use panda_installer::error::InstallerError;
use panda_installer::exec::Invocation;
use panda_installer::test_utils::{ExpectedCall, FakeCheckout, StubExecutor};
use tempfile::TempDir;

/// A PANDA checkout in a temporary directory.
pub struct Sandbox {
    _temp: TempDir,
    checkout: FakeCheckout,
}

impl Sandbox {
    /// Create a checkout with build outputs for the default architectures.
    pub fn new() -> Self {
        let temp = tempfile::Builder::new()
            .prefix("bdd-")
            .tempdir()
            .expect("failed to create temp dir");
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("temp dir not UTF-8");
        let checkout =
            FakeCheckout::create(&root, &ArchitectureSet::default(), &NamingRules::default())
                .expect("failed to create fake checkout");
        Self {
            _temp: temp,
            checkout,
        }
    }

    /// Root of the checkout.
    pub fn root(&self) -> &Utf8Path {
        &self.checkout.layout.repo_root
    }

    /// Default staging root, `panda/pypanda/panda/data`.
    pub fn staging_root(&self) -> &Utf8Path {
        &self.checkout.layout.staging_root
    }

    /// Delete one build output, relative to the build root.
    pub fn remove_build_output(&self, relative: &str) {
        self.checkout
            .remove_build_output(relative)
            .expect("failed to remove build output");
    }

    /// Digest of the default staging root.
    pub fn bundle_digest(&self) -> String {
        tree_digest(self.staging_root()).expect("failed to hash staging root")
    }

    /// Run `panda-installer --repo-root <root> <args>` with scripted commands.
    pub fn run(&self, args: &[&str], expected: Vec<ExpectedCall>) -> RunOutcome {
        let mut argv = vec!["panda-installer", "--repo-root", self.root().as_str()];
        argv.extend_from_slice(args);
        let cli = Cli::parse_from(argv);

        let executor = StubExecutor::new(expected);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let result = run(&cli, &executor, &mut stdout, &mut stderr);

        RunOutcome {
            result,
            received: executor.received(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        }
    }
}

/// What a CLI run produced.
pub struct RunOutcome {
    /// The run's result.
    pub result: Result<(), InstallerError>,
    /// Invocations the stub executor received, in order.
    pub received: Vec<Invocation>,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

impl RunOutcome {
    /// The error of a failed run.
    pub fn error(&self) -> &InstallerError {
        self.result
            .as_ref()
            .err()
            .expect("expected the run to fail")
    }
}

/// Code generation with the default configuration.
pub fn codegen_call() -> ExpectedCall {
    ExpectedCall::succeeding("python3", &["utils/create_panda_datatypes.py"])
}
