//! Application services behind pluggable contracts.
//!
//! This crate is the umbrella over a family of focused service crates. Each
//! service pairs a contract with a default implementation that can be tuned
//! or replaced through XML configuration, so application code depends on the
//! interface and deployment decides the wiring. The services share the
//! configuration layer and the adaptive logging system and otherwise stay
//! independent: pull in a member crate directly when you need only one of
//! them, or this facade when you want the whole toolbox under one name.
//!
//! ## Services
//!
//! - [`config`]: XML configuration objects with typed property access
//! - [`csv`]: typed CSV reading and writing driven by column descriptors
//! - [`dom`]: W3C style DOM views over an XML or HTML parse tree
//! - [`email`]: template based email with per instance field overrides
//! - [`injector`]: binding descriptors for dependency wiring
//! - [`json`]: serialization with class bound and in band typed streams
//! - [`log`]: leveled loggers with runtime reconfiguration
//! - [`template`]: text synthesis engines behind a common contract
//! - [`transaction`]: per thread transaction demarcation over a resource
//!
//! ## Example
//!
//! ```no_run
//! use gantry::csv::CsvDescriptor;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Default)]
//! struct Person {
//!     name: String,
//!     address: String,
//! }
//!
//! # fn main() -> Result<(), gantry::csv::CsvError> {
//! let descriptor = CsvDescriptor::<Person>::new().with_type_columns()?;
//! for person in descriptor.reader_from_str("John Doe,Main Street 1\n") {
//!     let person = person?;
//!     println!("{}", person.name);
//! }
//! # Ok(())
//! # }
//! ```

pub use gantry_config as config;
pub use gantry_csv as csv;
pub use gantry_dom as dom;
pub use gantry_email as email;
pub use gantry_injector as injector;
pub use gantry_json as json;
pub use gantry_log as log;
pub use gantry_template as template;
pub use gantry_transaction as transaction;

pub use gantry_log::{bug, debug, error, fatal, info, trace, warn};

/// Single import for the names used by almost every caller.
pub mod prelude {
    pub use crate::config::{Config, Configurable};
    pub use crate::csv::{CsvDescriptor, CsvFormat};
    pub use crate::email::{EmailProperties, EmailSender};
    pub use crate::injector::{bind, Bindings, Module};
    pub use crate::json::Json;
    pub use crate::log::{logger, Level, Logger};
    pub use crate::template::{Template, TemplateEngine};
    pub use crate::transaction::{TransactionManager, TransactionalResource};
}
