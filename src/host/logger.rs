//! Log levels and a `log` bridge into the host's log sink.
//!
//! Code in this crate logs through the `log` macros. A mod running inside
//! the engine process has no terminal, so [`install_host_logger`] registers a
//! [`HostLogger`] that forwards every record to [`ObjectModel::log`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use super::ObjectModel;

/// Severity levels understood by the host's log sink.
///
/// Ordered so that a message at level `m` passes a filter set to `f` when
/// `m <= f`. `Ignore` as a filter lets everything through; as a message
/// level it is only shown under an `Ignore` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    Off = 0,
    Critical = 1,
    #[default]
    Error = 2,
    Warning = 3,
    Info = 4,
    Debug = 5,
    Trace = 6,
    Ignore = 99,
}

impl LogLevel {
    /// Whether a message at `message` level passes this filter.
    pub fn allows(self, message: LogLevel) -> bool {
        message <= self
    }

    /// The `log` crate level a message at this severity is emitted with.
    pub fn as_log_level(self) -> Option<Level> {
        match self {
            LogLevel::Critical | LogLevel::Error => Some(Level::Error),
            LogLevel::Warning => Some(Level::Warn),
            LogLevel::Info => Some(Level::Info),
            LogLevel::Debug => Some(Level::Debug),
            LogLevel::Trace => Some(Level::Trace),
            LogLevel::Off | LogLevel::Ignore => None,
        }
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Error => LogLevel::Error,
            Level::Warn => LogLevel::Warning,
            Level::Info => LogLevel::Info,
            Level::Debug => LogLevel::Debug,
            Level::Trace => LogLevel::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Off => "off",
            LogLevel::Critical => "critical",
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
            LogLevel::Ignore => "ignore",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(LogLevel::Off),
            "critical" => Ok(LogLevel::Critical),
            "error" => Ok(LogLevel::Error),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            "ignore" => Ok(LogLevel::Ignore),
            other => Err(format!("Unknown log level '{}'", other)),
        }
    }
}

/// `log::Log` implementation that writes into the host engine's log.
pub struct HostLogger {
    host: Arc<dyn ObjectModel>,
    filter: LevelFilter,
}

impl HostLogger {
    pub fn new(host: Arc<dyn ObjectModel>, filter: LevelFilter) -> Self {
        HostLogger { host, filter }
    }
}

impl Log for HostLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = format!("[{}] {}", record.target(), record.args());
        self.host.log(LogLevel::from(record.level()), &message);
    }

    fn flush(&self) {}
}

/// Route all `log` output into the host's log sink.
///
/// Fails if a global logger is already installed (e.g. `env_logger`).
pub fn install_host_logger(
    host: Arc<dyn ObjectModel>,
    filter: LevelFilter,
) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(HostLogger::new(host, filter)))?;
    log::set_max_level(filter);
    Ok(())
}
