//! Simplified document object model contracts.
//!
//! A deliberately small DOM surface for template and markup work: elements
//! carry a tag, string attributes, text and children behind shared
//! [`ElementRef`] handles, documents add depth-first tree queries, and
//! [`DocumentBuilder`] abstracts over concrete parser engines. This crate
//! defines the contracts only; engines plug in from the outside.
//!
//! ## Key Abstractions
//!
//! - [`Element`] / [`ElementRef`]: one tree node and its shared handle
//! - [`EList`]: query results with bulk helpers
//! - [`Document`]: root access, element creation, tag and class search
//! - [`DocumentBuilder`]: document factory over some parser engine

mod document;
mod element;
mod error;

pub use document::{Document, DocumentBuilder};
pub use element::{EList, Element, ElementRef};
pub use error::DomError;
