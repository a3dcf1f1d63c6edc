//! Installer configuration loaded from `panda-installer.toml`.
//!
//! The file is optional and lives at the root of the PANDA checkout. Every
//! field has a default matching the standard PANDA layout, so a checkout
//! without the file stages exactly the four stock architectures from
//! `build/` into `panda/pypanda/panda/data`. Command-line flags override
//! the values read here.

use crate::arch::{ArchitectureSet, DEFAULT_ARCHITECTURES, NamingRules};
use crate::error::{InstallerError, Result};
use crate::guard::DEFAULT_PACKAGE_TOKEN;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;

/// Name of the configuration file at the checkout root.
pub const CONFIG_FILE_NAME: &str = "panda-installer.toml";

/// Top-level installer configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// Token the staging root path must contain before it may be deleted.
    pub package_token: String,
    /// Build output root, relative to the checkout root.
    pub build_dir: Utf8PathBuf,
    /// BIOS image directory, relative to the checkout root.
    pub bios_dir: Utf8PathBuf,
    /// Package data directory the bundle is staged into.
    pub staging_dir: Utf8PathBuf,
    /// Python package directory the installer framework runs in.
    pub package_dir: Utf8PathBuf,
    /// Architectures to stage, in order.
    pub architectures: Vec<String>,
    /// Artefact naming templates.
    pub naming: NamingRules,
    /// External commands.
    pub commands: CommandsConfig,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            package_token: DEFAULT_PACKAGE_TOKEN.to_owned(),
            build_dir: Utf8PathBuf::from("build"),
            bios_dir: Utf8PathBuf::from("pc-bios"),
            staging_dir: Utf8PathBuf::from("panda/pypanda/panda/data"),
            package_dir: Utf8PathBuf::from("panda/pypanda"),
            architectures: DEFAULT_ARCHITECTURES
                .iter()
                .map(|name| (*name).to_owned())
                .collect(),
            naming: NamingRules::default(),
            commands: CommandsConfig::default(),
        }
    }
}

/// Argv lists for the external collaborators.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CommandsConfig {
    /// Generates the Python data bindings; runs before staging.
    pub codegen: Vec<String>,
    /// Regular install through the Python installer framework.
    pub install: Vec<String>,
    /// Editable install through the Python installer framework.
    pub develop: Vec<String>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            codegen: argv(&["python3", "utils/create_panda_datatypes.py"]),
            install: argv(&["python3", "-m", "pip", "install", "."]),
            develop: argv(&["python3", "-m", "pip", "install", "-e", "."]),
        }
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| (*part).to_owned()).collect()
}

impl InstallerConfig {
    /// Load the configuration for the checkout at `repo_root`.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidConfig`] if the file exists but
    /// cannot be read, parsed, or validated.
    pub fn load(repo_root: &Utf8Path) -> Result<Self> {
        let path = repo_root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            debug!("no {CONFIG_FILE_NAME} in {repo_root}; using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load the configuration from an explicit file.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidConfig`] if the file cannot be read,
    /// parsed, or validated.
    pub fn load_from(path: &Utf8Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| InstallerError::InvalidConfig {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        let config = Self::parse(&contents).map_err(|reason| InstallerError::InvalidConfig {
            path: path.to_owned(),
            reason,
        })?;
        debug!("loaded configuration from {path}");
        Ok(config)
    }

    /// Parse and validate configuration text.
    ///
    /// # Errors
    ///
    /// Returns a description of the first parse or validation failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_installer::config::InstallerConfig;
    ///
    /// let config = InstallerConfig::parse("architectures = [\"arm\", \"mips\"]\n")
    ///     .expect("valid configuration");
    /// assert_eq!(config.architectures, ["arm", "mips"]);
    /// assert_eq!(config.package_token, "panda");
    /// ```
    pub fn parse(contents: &str) -> std::result::Result<Self, String> {
        let config: Self = toml::from_str(contents).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.package_token.trim().is_empty() {
            return Err("package_token must not be empty".to_owned());
        }
        for (name, argv) in [
            ("codegen", &self.commands.codegen),
            ("install", &self.commands.install),
            ("develop", &self.commands.develop),
        ] {
            if argv.is_empty() {
                return Err(format!("commands.{name} must not be empty"));
            }
        }
        self.naming.validate().map_err(|e| e.to_string())?;
        self.architecture_set().map_err(|e| e.to_string())?;
        Ok(())
    }

    /// The configured architectures as a validated set.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed or repeated names.
    pub fn architecture_set(&self) -> Result<ArchitectureSet> {
        ArchitectureSet::from_names(&self.architectures)
    }
}
