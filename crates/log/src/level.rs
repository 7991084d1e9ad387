//! Severity levels.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Log severity, least to most severe.
///
/// Enabling a level enables it and everything more severe, so a logger set
/// to [`Level::Warn`] also emits `Error`, `Fatal` and `Bug` events.
/// [`Level::Off`] disables a logger entirely and is never a valid event
/// level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    /// Unrecoverable condition, the process cannot continue its work.
    Fatal,
    /// Programming error: a state the code promises cannot happen.
    Bug,
    Off,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
            Level::Bug => "BUG",
            Level::Off => "OFF",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("Unknown log level '{0}'")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            "bug" => Ok(Level::Bug),
            "off" => Ok(Level::Off),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}
