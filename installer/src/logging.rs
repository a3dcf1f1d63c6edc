//! Diagnostic logging to stderr.
//!
//! Library code logs through the `log` facade. The binary installs
//! [`StderrLogger`] once at start-up with a level derived from the `-v`
//! count, `--quiet`, and the `PANDA_INSTALLER_LOG` environment variable.

use log::{LevelFilter, Log, Metadata, Record};
use std::io::Write;
use std::str::FromStr;

/// Environment variable that overrides the level chosen by flags.
pub const LOG_ENV_VAR: &str = "PANDA_INSTALLER_LOG";

/// Map CLI verbosity to a level filter.
///
/// # Examples
///
/// ```
/// use log::LevelFilter;
/// use panda_installer::logging::level_for;
///
/// assert_eq!(level_for(0, false), LevelFilter::Warn);
/// assert_eq!(level_for(2, false), LevelFilter::Debug);
/// assert_eq!(level_for(3, true), LevelFilter::Off);
/// ```
#[must_use]
pub fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Off;
    }
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Resolve the effective level, letting [`LOG_ENV_VAR`] win over flags.
///
/// Unparseable values are ignored.
#[must_use]
pub fn effective_level(verbosity: u8, quiet: bool) -> LevelFilter {
    std::env::var(LOG_ENV_VAR)
        .ok()
        .and_then(|value| LevelFilter::from_str(value.trim()).ok())
        .unwrap_or_else(|| level_for(verbosity, quiet))
}

/// Writes `level: message` lines to stderr.
#[derive(Debug, Clone, Copy)]
pub struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    /// Create a logger that accepts records up to `level`.
    #[must_use]
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = record.level().as_str().to_ascii_lowercase();
        let mut stderr = std::io::stderr().lock();
        if writeln!(stderr, "{level}: {}", record.args()).is_err() {
            // Nowhere left to report it.
        }
    }

    fn flush(&self) {
        if std::io::stderr().flush().is_err() {
            // Nowhere left to report it.
        }
    }
}

/// Install the stderr logger as the global logger.
///
/// Calling this more than once keeps the first logger.
pub fn init(verbosity: u8, quiet: bool) {
    let level = effective_level(verbosity, quiet);
    if log::set_boxed_logger(Box::new(StderrLogger::new(level)))
        .map(|()| log::set_max_level(level))
        .is_err()
    {
        log::debug!("logger already installed");
    }
}
