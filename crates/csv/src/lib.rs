//! Typed CSV reading and writing.
//!
//! A [`CsvDescriptor`] binds a record type to a [`CsvFormat`] and an ordered
//! column list, then acts as the factory for streaming readers and writers.
//! Records travel through serde, so any `Deserialize`/`Serialize` type with
//! named fields works: structs, maps, types with `Option` fields for nullable
//! columns. Columns can be configured explicitly, derived from the record
//! type, loaded from a header row or read from a configuration section.
//!
//! The dialect is fully adjustable: delimiter, open/close quote pair, escape
//! character, comment lines, a null-value sentinel and the stream charset.
//! Strict mode turns every malformed value into an error; the default
//! relaxed mode logs a warning and substitutes a default so one bad cell
//! does not sink a large import.
//!
//! ## Key Abstractions
//!
//! - [`CsvFormat`]: the concrete dialect and error handling mode
//! - [`CsvDescriptor`]: record type binding, column list and stream factory
//! - [`CsvReader`]: iterator of typed records decoded from a byte stream
//! - [`CsvWriter`]: typed records encoded onto a byte sink
//! - [`ValueFormat`]: per-column value transformations such as date patterns

mod de;
mod descriptor;
mod error;
mod fields;
mod format;
mod reader;
mod ser;
mod value;
mod writer;

pub use descriptor::{CsvColumn, CsvDescriptor};
pub use error::CsvError;
pub use format::{CsvComment, CsvDelimiter, CsvEscape, CsvFormat, CsvQuote, QuotePair};
pub use reader::CsvReader;
pub use value::{DateValueFormat, UppercaseValueFormat, ValueFormat};
pub use writer::CsvWriter;
