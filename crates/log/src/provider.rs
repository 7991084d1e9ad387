//! Provider SPI and the global provider slot.

use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use itertools::Itertools;

use crate::context::ContextMap;
use crate::level::Level;

/// One log event on its way to a provider.
///
/// The message is still a [`fmt::Arguments`], so providers that drop the
/// event never pay for formatting.
pub struct LogEvent<'a> {
    pub level: Level,
    pub logger: &'a str,
    pub message: fmt::Arguments<'a>,
    pub context: ContextMap,
}

/// Backend SPI: receives every enabled event.
pub trait LogProvider: Send + Sync {
    /// Fast pre-check consulted before an event is built.
    fn enabled(&self, logger: &str, level: Level) -> bool;

    fn log(&self, event: &LogEvent<'_>);

    /// Blocks until buffered events are written out.
    fn flush(&self);
}

/// Default provider: discards everything.
struct NopProvider;

impl LogProvider for NopProvider {
    fn enabled(&self, _logger: &str, _level: Level) -> bool {
        false
    }

    fn log(&self, _event: &LogEvent<'_>) {}

    fn flush(&self) {}
}

fn provider_slot() -> &'static RwLock<Arc<dyn LogProvider>> {
    static SLOT: OnceLock<RwLock<Arc<dyn LogProvider>>> = OnceLock::new();
    SLOT.get_or_init(|| RwLock::new(Arc::new(NopProvider)))
}

/// Installs the process-wide provider. Replacing an earlier provider is
/// allowed; events already handed to it are its own to finish.
pub fn set_provider(provider: Box<dyn LogProvider>) {
    *provider_slot()
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Arc::from(provider);
}

pub(crate) fn current_provider() -> Arc<dyn LogProvider> {
    provider_slot()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Flushes the installed provider.
pub fn flush() {
    current_provider().flush();
}

/// Bridge provider forwarding events to the ambient `log` crate, so any
/// `log` backend sees facade traffic.
pub struct StdLogProvider;

fn std_level(level: Level) -> Option<log::Level> {
    match level {
        Level::Trace => Some(log::Level::Trace),
        Level::Debug => Some(log::Level::Debug),
        Level::Info => Some(log::Level::Info),
        Level::Warn => Some(log::Level::Warn),
        // The std facade has nothing above Error.
        Level::Error | Level::Fatal | Level::Bug => Some(log::Level::Error),
        Level::Off => None,
    }
}

impl LogProvider for StdLogProvider {
    fn enabled(&self, logger: &str, level: Level) -> bool {
        match std_level(level) {
            Some(level) => log::log_enabled!(target: logger, level),
            None => false,
        }
    }

    fn log(&self, event: &LogEvent<'_>) {
        let Some(level) = std_level(event.level) else {
            return;
        };
        if event.context.is_empty() {
            log::log!(target: event.logger, level, "{}", event.message);
        } else {
            let context = event
                .context
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .join(", ");
            log::log!(target: event.logger, level, "{} [{}]", event.message, context);
        }
    }

    fn flush(&self) {
        log::logger().flush();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_std_level_mapping() {
        assert_eq!(std_level(Level::Trace), Some(log::Level::Trace));
        assert_eq!(std_level(Level::Error), Some(log::Level::Error));
        assert_eq!(std_level(Level::Fatal), Some(log::Level::Error));
        assert_eq!(std_level(Level::Bug), Some(log::Level::Error));
        assert_eq!(std_level(Level::Off), None);
    }

    #[test]
    fn test_std_provider_smoke() {
        let _ = env_logger::builder().is_test(true).try_init();
        let provider = StdLogProvider;
        let mut context = BTreeMap::new();
        context.insert("job".to_string(), "import".to_string());
        provider.log(&LogEvent {
            level: Level::Error,
            logger: "gantry.test",
            message: format_args!("failure {}", 7),
            context,
        });
        provider.log(&LogEvent {
            level: Level::Off,
            logger: "gantry.test",
            message: format_args!("never shown"),
            context: BTreeMap::new(),
        });
        provider.flush();
    }
}
