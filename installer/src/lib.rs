//! PANDA installer library.
//!
//! This crate stages prebuilt PANDA artefacts (per-architecture shared
//! libraries, plugin trees, generated plog bindings and the shared BIOS
//! images) into the data directory of the `panda` Python package, and
//! coordinates that staging with the Python installer in distribution and
//! development modes.
//! It is used by the `panda-installer` CLI binary and can be consumed
//! programmatically for testing.
//!
//! # Modules
//!
//! - [`arch`] - Architecture names and artefact naming rules
//! - [`cli`] - Command-line argument definitions
//! - [`commands`] - Subcommand orchestration shared by the binary and tests
//! - [`config`] - `panda-installer.toml` configuration
//! - [`copy`] - Deterministic file and tree copies, tree digests
//! - [`error`] - Semantic error types with recovery hints
//! - [`exec`] - External command execution
//! - [`guard`] - Guarded removal of the staging root
//! - [`layout`] - Source and destination path resolution
//! - [`lifecycle`] - Distribution and development install coordination
//! - [`logging`] - Stderr diagnostics through the `log` facade
//! - [`output`] - User-facing messages and dry-run rendering
//! - [`stager`] - Artefact staging
//! - [`status`] - Staging state inspection
//! - [`workspace`] - PANDA checkout discovery

pub mod arch;
pub mod cli;
pub mod commands;
pub mod config;
pub mod copy;
pub mod error;
pub mod exec;
pub mod guard;
pub mod layout;
pub mod lifecycle;
pub mod logging;
pub mod output;
pub mod stager;
pub mod status;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod workspace;
