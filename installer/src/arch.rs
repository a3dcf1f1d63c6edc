//! Architecture targets and their artefact naming rules.
//!
//! PANDA ships one `softmmu` build per guest architecture. Everything the
//! stager needs to know about an architecture is derived from its name via
//! the templates in [`NamingRules`], so supporting another architecture is a
//! matter of listing it, not of changing the staging loop.

use crate::error::{InstallerError, Result};
use camino::{Utf8Component, Utf8Path};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Architectures staged when the configuration does not say otherwise.
///
/// The order is the staging order.
pub const DEFAULT_ARCHITECTURES: &[&str] = &["arm", "i386", "x86_64", "ppc"];

/// Placeholder substituted with the architecture name in naming templates.
const ARCH_PLACEHOLDER: &str = "{arch}";

/// A validated architecture name.
///
/// Names end up as path components, so only ASCII alphanumerics, `_`, `-`
/// and `.` are accepted, and `.`/`..` are rejected outright.
///
/// # Examples
///
/// ```
/// use panda_installer::arch::Architecture;
///
/// let arch = Architecture::try_from("x86_64").expect("valid architecture");
/// assert_eq!(arch.as_str(), "x86_64");
/// assert!(Architecture::try_from("../etc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Architecture(String);

impl Architecture {
    /// Return the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn into_string(self) -> String {
        self.0
    }

    /// Return the default architecture list.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        DEFAULT_ARCHITECTURES
            .iter()
            .map(|name| Self((*name).to_owned()))
            .collect()
    }
}

impl TryFrom<&str> for Architecture {
    type Error = InstallerError;

    fn try_from(value: &str) -> Result<Self> {
        validate_name(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Architecture {
    type Error = InstallerError;

    fn try_from(value: String) -> Result<Self> {
        validate_name(&value)?;
        Ok(Self(value))
    }
}

impl AsRef<str> for Architecture {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_name(value: &str) -> Result<()> {
    let reject = |reason| {
        Err(InstallerError::InvalidArchitecture {
            name: value.to_owned(),
            reason,
        })
    };

    if value.is_empty() {
        return reject("name is empty");
    }
    if value == "." || value == ".." {
        return reject("name is a relative path component");
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return reject("only ASCII letters, digits, '_', '-' and '.' are allowed");
    }
    Ok(())
}

/// An ordered, duplicate-free list of architectures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchitectureSet(Vec<Architecture>);

impl ArchitectureSet {
    /// Build a set from names, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidArchitecture`] for a malformed name
    /// and [`InstallerError::DuplicateArchitecture`] when a name repeats.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut architectures: Vec<Architecture> = Vec::new();
        for name in names {
            let arch = Architecture::try_from(name.as_ref())?;
            if architectures.contains(&arch) {
                return Err(InstallerError::DuplicateArchitecture {
                    name: arch.into_string(),
                });
            }
            architectures.push(arch);
        }
        Ok(Self(architectures))
    }

    /// Iterate in staging order.
    pub fn iter(&self) -> std::slice::Iter<'_, Architecture> {
        self.0.iter()
    }

    /// Number of architectures in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ArchitectureSet {
    fn default() -> Self {
        Self(Architecture::defaults())
    }
}

impl<'a> IntoIterator for &'a ArchitectureSet {
    type Item = &'a Architecture;
    type IntoIter = std::slice::Iter<'a, Architecture>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Templates mapping an architecture to its artefact names.
///
/// Every field may contain `{arch}`, which is replaced by the architecture
/// name. The plugin source directory is relative to the build subdirectory.
/// Templates must be relative paths made of plain components; deserialising
/// anything else fails.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "NamingTemplates")]
pub struct NamingRules {
    /// Build output subdirectory, e.g. `{arch}-softmmu`.
    pub build_subdir: String,
    /// Shared library file name, e.g. `libpanda-{arch}.so`.
    pub library: String,
    /// Plugin tree inside the build subdirectory, e.g. `panda/plugins`.
    pub plugins: String,
    /// Generated bindings module, e.g. `plog_pb2.py`.
    pub bindings: String,
    /// Directory name the plugin tree is staged under, e.g. `libpanda-{arch}`.
    pub staged_plugins: String,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            build_subdir: "{arch}-softmmu".to_owned(),
            library: "libpanda-{arch}.so".to_owned(),
            plugins: "panda/plugins".to_owned(),
            bindings: "plog_pb2.py".to_owned(),
            staged_plugins: "libpanda-{arch}".to_owned(),
        }
    }
}

/// The `[naming]` table as written, before validation.
#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct NamingTemplates {
    build_subdir: String,
    library: String,
    plugins: String,
    bindings: String,
    staged_plugins: String,
}

impl Default for NamingTemplates {
    fn default() -> Self {
        let rules = NamingRules::default();
        Self {
            build_subdir: rules.build_subdir,
            library: rules.library,
            plugins: rules.plugins,
            bindings: rules.bindings,
            staged_plugins: rules.staged_plugins,
        }
    }
}

impl TryFrom<NamingTemplates> for NamingRules {
    type Error = InstallerError;

    fn try_from(templates: NamingTemplates) -> Result<Self> {
        let rules = Self {
            build_subdir: templates.build_subdir,
            library: templates.library,
            plugins: templates.plugins,
            bindings: templates.bindings,
            staged_plugins: templates.staged_plugins,
        };
        rules.validate()?;
        Ok(rules)
    }
}

impl NamingRules {
    /// Check that every template expands to a relative path that stays
    /// below the directory it is joined to.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidNamingTemplate`] for the first empty,
    /// absolute, or `.`/`..`-bearing template.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_installer::arch::NamingRules;
    ///
    /// let mut rules = NamingRules::default();
    /// assert!(rules.validate().is_ok());
    ///
    /// rules.staged_plugins = "../escaped-{arch}".to_owned();
    /// assert!(rules.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        for (field, template) in [
            ("build_subdir", &self.build_subdir),
            ("library", &self.library),
            ("plugins", &self.plugins),
            ("bindings", &self.bindings),
            ("staged_plugins", &self.staged_plugins),
        ] {
            validate_template(field, template)?;
        }
        Ok(())
    }

    /// Build subdirectory name for `arch`.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_installer::arch::{Architecture, NamingRules};
    ///
    /// let arm = Architecture::try_from("arm").expect("valid");
    /// let rules = NamingRules::default();
    /// assert_eq!(rules.build_subdir(&arm), "arm-softmmu");
    /// assert_eq!(rules.library(&arm), "libpanda-arm.so");
    /// ```
    #[must_use]
    pub fn build_subdir(&self, arch: &Architecture) -> String {
        expand(&self.build_subdir, arch)
    }

    /// Shared library file name for `arch`.
    #[must_use]
    pub fn library(&self, arch: &Architecture) -> String {
        expand(&self.library, arch)
    }

    /// Plugin tree path, relative to the build subdirectory.
    #[must_use]
    pub fn plugins(&self, arch: &Architecture) -> String {
        expand(&self.plugins, arch)
    }

    /// Generated bindings module file name for `arch`.
    #[must_use]
    pub fn bindings(&self, arch: &Architecture) -> String {
        expand(&self.bindings, arch)
    }

    /// Staged plugin directory name for `arch`.
    #[must_use]
    pub fn staged_plugins(&self, arch: &Architecture) -> String {
        expand(&self.staged_plugins, arch)
    }
}

fn validate_template(field: &'static str, template: &str) -> Result<()> {
    let reject = |reason| {
        Err(InstallerError::InvalidNamingTemplate {
            field,
            template: template.to_owned(),
            reason,
        })
    };

    if template.trim().is_empty() {
        return reject("template is empty");
    }
    // Architecture names cannot contain separators, so checking the
    // unexpanded template covers every expansion.
    if !Utf8Path::new(template)
        .components()
        .all(|component| matches!(component, Utf8Component::Normal(_)))
    {
        return reject("must be a relative path without '.', '..' or root components");
    }
    Ok(())
}

fn expand(template: &str, arch: &Architecture) -> String {
    template.replace(ARCH_PLACEHOLDER, arch.as_str())
}
