//! Logging facade with pluggable providers.
//!
//! Application code logs through named [`Logger`] handles and the matching
//! macros; where the events go is decided once per process by installing a
//! [`LogProvider`]. The default provider discards everything, so a library
//! can log freely without forcing a backend on its host.
//!
//! Levels extend the usual ladder with `Fatal` (the process cannot
//! continue) and `Bug` (a state the code promises cannot happen). Staged
//! configuration lives in [`LogConfig`]: per-logger levels along dotted
//! name prefixes, a substring filter and a collector address, all
//! published atomically by `commit`. The per-thread [`context`] map rides
//! along with every event; propagation into worker threads is explicit
//! via `snapshot`/`attach` or `context::spawn`.
//!
//! ## Key Abstractions
//!
//! - [`Logger`] and the `trace!` .. `bug!` macros: the call-site surface
//! - [`LogProvider`]: backend SPI, installed with [`set_provider`]
//! - [`StdLogProvider`]: bridge into the ambient `log` crate
//! - [`AsyncLogProvider`]: worker-thread decorator for slow backends
//! - [`LogConfig`]: staged, atomically committed configuration
//! - [`context`]: per-thread diagnostic map

mod async_provider;
mod config;
pub mod context;
mod level;
mod logger;
mod macros;
mod provider;

pub use async_provider::AsyncLogProvider;
pub use config::LogConfig;
pub use context::ContextMap;
pub use level::{Level, ParseLevelError};
pub use logger::{logger, Logger};
pub use provider::{flush, set_provider, LogEvent, LogProvider, StdLogProvider};
