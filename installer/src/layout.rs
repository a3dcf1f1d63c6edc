//! Directory layout for staging.
//!
//! Resolves where each architecture's build outputs are expected and where
//! their staged copies go. Resolution is a pure function of its inputs;
//! nothing in here touches the filesystem except
//! [`ArtefactManifest::first_missing`], which the stager calls when it
//! validates an architecture.

use crate::arch::{Architecture, NamingRules};
use crate::error::{InstallerError, Result};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Name of the BIOS directory, both in the checkout and in the bundle.
pub const BIOS_DIR_NAME: &str = "pc-bios";

/// Resolved top-level locations for one staging run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Root of the PANDA checkout.
    pub repo_root: Utf8PathBuf,
    /// Build output root containing the `<arch>-softmmu` directories.
    pub build_root: Utf8PathBuf,
    /// Firmware and BIOS image directory shared by every architecture.
    pub bios_dir: Utf8PathBuf,
    /// Package data directory the bundle is assembled in.
    pub staging_root: Utf8PathBuf,
}

impl ProjectLayout {
    /// Build a layout from the checkout root and paths relative to it.
    ///
    /// Absolute relative-path arguments replace the root rather than being
    /// appended, matching [`Utf8Path::join`].
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use panda_installer::layout::ProjectLayout;
    ///
    /// let layout = ProjectLayout::new(
    ///     Utf8Path::new("/src/panda"),
    ///     Utf8Path::new("build"),
    ///     Utf8Path::new("pc-bios"),
    ///     Utf8Path::new("panda/pypanda/panda/data"),
    /// );
    /// assert_eq!(layout.build_root, "/src/panda/build");
    /// assert_eq!(layout.staging_root, "/src/panda/panda/pypanda/panda/data");
    /// ```
    #[must_use]
    pub fn new(
        repo_root: &Utf8Path,
        build_dir: &Utf8Path,
        bios_dir: &Utf8Path,
        staging_dir: &Utf8Path,
    ) -> Self {
        Self {
            repo_root: repo_root.to_owned(),
            build_root: repo_root.join(build_dir),
            bios_dir: repo_root.join(bios_dir),
            staging_root: repo_root.join(staging_dir),
        }
    }

    /// Destination of the shared BIOS directory inside the bundle.
    #[must_use]
    pub fn bios_destination(&self) -> Utf8PathBuf {
        bios_destination(&self.staging_root)
    }

    /// Resolve one architecture against this layout.
    #[must_use]
    pub fn resolve(&self, arch: &Architecture, rules: &NamingRules) -> ArchitectureLayout {
        resolve(arch, rules, &self.build_root, &self.staging_root)
    }

    /// Check that the staging root neither sits inside a source directory
    /// nor contains one.
    ///
    /// Paths are compared after folding `.` and `..` lexically; symlinks are
    /// not resolved.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::UnsafeStagingRoot`] naming the overlapping
    /// directory.
    pub fn check_disjoint(&self) -> Result<()> {
        let staging = lexical(&self.staging_root);
        for (label, source) in [("build", &self.build_root), ("BIOS", &self.bios_dir)] {
            let source = lexical(source);
            if staging.starts_with(&source) || source.starts_with(&staging) {
                return Err(InstallerError::UnsafeStagingRoot {
                    path: self.staging_root.clone(),
                    reason: format!("overlaps the {label} directory {source}"),
                });
            }
        }
        Ok(())
    }
}

fn lexical(path: &Utf8Path) -> Utf8PathBuf {
    let mut folded = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                folded.pop();
            }
            other => folded.push(other.as_str()),
        }
    }
    folded
}

/// Destination of the shared BIOS directory under `staging_root`.
#[must_use]
pub fn bios_destination(staging_root: &Utf8Path) -> Utf8PathBuf {
    staging_root.join(BIOS_DIR_NAME)
}

/// The build outputs that must exist before an architecture is staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtefactManifest {
    /// `<build>/<arch>-softmmu/libpanda-<arch>.so`
    pub library: Utf8PathBuf,
    /// `<build>/<arch>-softmmu/panda/plugins`
    pub plugins: Utf8PathBuf,
    /// `<build>/<arch>-softmmu/plog_pb2.py`
    pub bindings: Utf8PathBuf,
}

impl ArtefactManifest {
    /// Return the first required source that is absent.
    ///
    /// Checked in the order library, bindings, plugin directory, so the
    /// shared library is always the one reported when the build never ran.
    #[must_use]
    pub fn first_missing(&self) -> Option<&Utf8Path> {
        if !self.library.is_file() {
            return Some(&self.library);
        }
        if !self.bindings.is_file() {
            return Some(&self.bindings);
        }
        if !self.plugins.is_dir() {
            return Some(&self.plugins);
        }
        None
    }
}

/// Where an architecture's artefacts land inside the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtefacts {
    /// `<staging>/<arch>-softmmu`
    pub dir: Utf8PathBuf,
    /// `<staging>/<arch>-softmmu/libpanda-<arch>.so`
    pub library: Utf8PathBuf,
    /// `<staging>/<arch>-softmmu/libpanda-<arch>`
    pub plugins: Utf8PathBuf,
    /// `<staging>/<arch>-softmmu/plog_pb2.py`
    pub bindings: Utf8PathBuf,
}

/// Source and destination paths for one architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchitectureLayout {
    /// The architecture these paths belong to.
    pub arch: Architecture,
    /// Expected build outputs.
    pub sources: ArtefactManifest,
    /// Staged copies.
    pub destinations: StagedArtefacts,
}

/// Resolve the source and destination paths for `arch`.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use panda_installer::arch::{Architecture, NamingRules};
/// use panda_installer::layout::resolve;
///
/// let arm = Architecture::try_from("arm").expect("valid");
/// let layout = resolve(
///     &arm,
///     &NamingRules::default(),
///     Utf8Path::new("/src/build"),
///     Utf8Path::new("/pkg/panda/data"),
/// );
/// assert_eq!(layout.sources.library, "/src/build/arm-softmmu/libpanda-arm.so");
/// assert_eq!(layout.destinations.plugins, "/pkg/panda/data/arm-softmmu/libpanda-arm");
/// ```
#[must_use]
pub fn resolve(
    arch: &Architecture,
    rules: &NamingRules,
    build_root: &Utf8Path,
    staging_root: &Utf8Path,
) -> ArchitectureLayout {
    let subdir = rules.build_subdir(arch);
    let library = rules.library(arch);
    let bindings = rules.bindings(arch);

    let source_dir = build_root.join(&subdir);
    let dest_dir = staging_root.join(&subdir);

    ArchitectureLayout {
        arch: arch.clone(),
        sources: ArtefactManifest {
            library: source_dir.join(&library),
            plugins: source_dir.join(rules.plugins(arch)),
            bindings: source_dir.join(&bindings),
        },
        destinations: StagedArtefacts {
            library: dest_dir.join(&library),
            plugins: dest_dir.join(rules.staged_plugins(arch)),
            bindings: dest_dir.join(&bindings),
            dir: dest_dir,
        },
    }
}
