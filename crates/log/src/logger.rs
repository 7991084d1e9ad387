//! Named logger handles.

use std::fmt;

use crate::config::current_policy;
use crate::context;
use crate::level::Level;
use crate::provider::{current_provider, LogEvent};

/// Creates a handle for the given logger name. Dots nest names for
/// configuration purposes.
pub fn logger(name: impl Into<String>) -> Logger {
    Logger { name: name.into() }
}

/// Named logging handle.
///
/// Cheap to create and clone. Every call consults the current policy and
/// provider, so handles created before a reconfiguration stay correct.
#[derive(Debug, Clone)]
pub struct Logger {
    name: String,
}

impl Logger {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enabled(&self, level: Level) -> bool {
        current_policy().enabled(&self.name, level)
            && current_provider().enabled(&self.name, level)
    }

    /// Hands one event to the provider when the level is enabled. The
    /// macros check `enabled` before evaluating their arguments; calling
    /// this directly evaluates them either way.
    pub fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        current_provider().log(&LogEvent {
            level,
            logger: &self.name,
            message,
            context: context::snapshot(),
        });
    }

    pub fn trace(&self, message: &str) {
        self.log(Level::Trace, format_args!("{message}"));
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, format_args!("{message}"));
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, format_args!("{message}"));
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, format_args!("{message}"));
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, format_args!("{message}"));
    }

    pub fn fatal(&self, message: &str) {
        self.log(Level::Fatal, format_args!("{message}"));
    }

    pub fn bug(&self, message: &str) {
        self.log(Level::Bug, format_args!("{message}"));
    }

    /// Logs the message together with the error's full cause chain as a
    /// single record.
    pub fn dump(&self, message: &str, error: &dyn std::error::Error) {
        if !self.enabled(Level::Bug) {
            return;
        }
        let mut text = format!("{message}: {error}");
        let mut source = error.source();
        while let Some(cause) = source {
            text.push_str(&format!("\nCaused by: {cause}"));
            source = cause.source();
        }
        self.log(Level::Bug, format_args!("{text}"));
    }
}
