//! Template engine contracts.
//!
//! [`TemplateEngine`] turns template sources into [`Template`] instances;
//! a template merges with a model and serializes the result. The model
//! type is [`serde_json::Value`], so anything serde can produce can drive
//! a template. Engine implementations plug in from the outside; this crate
//! ships only the contracts plus [`StaticTemplate`], the engine-less
//! pass-through used where a fixed body is enough.
//!
//! ## Key Abstractions
//!
//! - [`TemplateEngine`]: source parsing and engine-scope properties
//! - [`Template`]: model merging and serialization
//! - [`StaticTemplate`]: fixed-body template for engine-less use

mod engine;
mod error;

pub use engine::{StaticTemplate, Template, TemplateEngine};
pub use error::TemplateError;

pub use serde_json::Value;
