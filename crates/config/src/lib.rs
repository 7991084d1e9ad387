//! XML-backed configuration objects for the gantry service contracts.
//!
//! Services that need external setup implement [`Configurable`] and receive a
//! [`Config`] instance, a read-only tree of named sections with attributes and
//! `<property name="..." value="..."/>` entries. A typical descriptor:
//!
//! ```xml
//! <emails>
//!     <property name="repository.path" value="/var/sites/mail/${language}" />
//!     <property name="files.pattern" value="*.htm" />
//!     <property name="bounce.domain" value="bounce.example.com" />
//! </emails>
//! ```
//!
//! ## Key Abstractions
//!
//! - **`Config`**: Named tree node with attributes, properties and child sections
//! - **`Configurable`**: Trait for services accepting a configuration section
//! - **`naming`**: Conversion of external tokens to record field names

mod config;
mod error;
pub mod naming;

pub use config::{Config, Configurable};
pub use error::ConfigError;
