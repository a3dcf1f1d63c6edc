//! Artefact staging.
//!
//! Assembles a self-contained bundle in the package data directory: the
//! shared BIOS images once, then for each architecture its shared library,
//! generated bindings module and plugin tree. The staging root is always
//! rebuilt from scratch; nothing is ever staged on top of a previous tree.

use crate::arch::{Architecture, ArchitectureSet, NamingRules};
use crate::copy::{copy_file, copy_tree};
use crate::error::{InstallerError, RUN_BUILD_FIRST, Result};
use crate::guard::StagingRoot;
use crate::layout::{ArchitectureLayout, ProjectLayout};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fs;

/// Hint attached to a missing BIOS directory.
const BIOS_HINT: &str = "the pc-bios directory ships with the PANDA checkout; is --repo-root correct?";

/// Summary of a completed staging run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    /// The populated staging root.
    pub staging_root: Utf8PathBuf,
    /// Architectures staged, in staging order.
    pub architectures: Vec<Architecture>,
    /// Number of files copied, BIOS images included.
    pub files_copied: usize,
    /// Whether a previous bundle was removed first.
    pub replaced_previous: bool,
}

/// Stages build outputs into the package data directory.
#[derive(Debug, Clone)]
pub struct Stager {
    layout: ProjectLayout,
    rules: NamingRules,
    architectures: ArchitectureSet,
    staging_root: StagingRoot,
}

impl Stager {
    /// Create a stager for `layout`, guarding its staging root with `token`.
    #[must_use]
    pub fn new(
        layout: ProjectLayout,
        rules: NamingRules,
        architectures: ArchitectureSet,
        token: &str,
    ) -> Self {
        let staging_root = StagingRoot::new(layout.staging_root.clone(), token);
        Self {
            layout,
            rules,
            architectures,
            staging_root,
        }
    }

    /// The guarded staging root.
    #[must_use]
    pub fn staging_root(&self) -> &StagingRoot {
        &self.staging_root
    }

    /// The layout this stager resolves paths against.
    #[must_use]
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Resolve every architecture without touching the filesystem.
    #[must_use]
    pub fn plan(&self) -> Vec<ArchitectureLayout> {
        self.architectures
            .iter()
            .map(|arch| self.layout.resolve(arch, &self.rules))
            .collect()
    }

    /// Rebuild the staging root from the build outputs.
    ///
    /// Steps run strictly in order: the staging root is reset, the BIOS
    /// directory is copied, then each architecture is validated and copied
    /// in set order. The first missing artefact aborts the whole run; a
    /// failing architecture never gets a directory in the bundle, but
    /// architectures staged before it remain for inspection.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::MissingArtefact`] naming the first absent
    /// build output, a safety error if the staging root may not be reset
    /// or overlaps a source directory, [`InstallerError::InvalidNamingTemplate`]
    /// for a template that leaves its directory, or
    /// [`InstallerError::CopyFailed`] on I/O failure.
    pub fn stage(&self) -> Result<StageReport> {
        self.layout.check_disjoint()?;
        self.rules.validate()?;
        let replaced_previous = self.staging_root.reset()?;
        let mut files_copied = self.stage_bios()?;

        let mut architectures = Vec::with_capacity(self.architectures.len());
        for arch in &self.architectures {
            let resolved = self.layout.resolve(arch, &self.rules);
            files_copied += stage_architecture(&resolved)?;
            architectures.push(arch.clone());
        }

        info!(
            "staged {} architecture(s) into {}",
            architectures.len(),
            self.staging_root.path()
        );

        Ok(StageReport {
            staging_root: self.staging_root.path().to_owned(),
            architectures,
            files_copied,
            replaced_previous,
        })
    }

    fn stage_bios(&self) -> Result<usize> {
        let source = &self.layout.bios_dir;
        require_dir(source, BIOS_HINT)?;
        let destination = self.layout.bios_destination();
        debug!("staging BIOS images from {source}");
        copy_tree(source, &destination)
    }
}

/// Validate and copy one architecture's artefacts.
///
/// Returns the number of files copied.
fn stage_architecture(resolved: &ArchitectureLayout) -> Result<usize> {
    let sources = &resolved.sources;
    let destinations = &resolved.destinations;

    if let Some(missing) = sources.first_missing() {
        return Err(InstallerError::MissingArtefact {
            path: missing.to_owned(),
            hint: RUN_BUILD_FIRST,
        });
    }

    info!("staging {}", resolved.arch);
    fs::create_dir_all(&destinations.dir).map_err(|source| InstallerError::CopyFailed {
        from: sources.library.clone(),
        to: destinations.dir.clone(),
        source,
    })?;

    copy_file(&sources.bindings, &destinations.bindings)?;
    copy_file(&sources.library, &destinations.library)?;
    let plugins = copy_tree(&sources.plugins, &destinations.plugins)?;

    Ok(plugins + 2)
}

fn require_dir(path: &Utf8Path, hint: &'static str) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(InstallerError::MissingArtefact {
            path: path.to_owned(),
            hint,
        })
    }
}

#[cfg(test)]
#[path = "stager_tests.rs"]
mod tests;
