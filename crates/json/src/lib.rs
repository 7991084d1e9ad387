//! JSON object mapping.
//!
//! [`Json`] is the conversion facade: stringify and parse typed values,
//! write to and read from byte streams, parse mixed arrays as tuples and
//! recover gracefully from partially matching objects with
//! [`Json::parse_lenient`].
//!
//! [`TypeRegistry`] adds in-band type tagging on top: a registered type
//! serializes with a leading `class` property naming it, and parsing
//! dispatches on that property to rebuild the concrete type without the
//! caller naming it up front.
//!
//! ## Key Abstractions
//!
//! - [`Json`]: stateless conversion facade over serde_json
//! - [`TypeRegistry`]: name-to-type registry for tagged objects
//! - [`JsonError`]: syntax, I/O and type registration failures

mod error;
mod facade;
mod registry;

pub use error::JsonError;
pub use facade::Json;
pub use registry::TypeRegistry;

pub use serde_json::Value;
