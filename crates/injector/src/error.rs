//! Error types for binding collection.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InjectorError {
    /// Two bindings share the same key.
    #[error("Duplicate binding for {0}")]
    DuplicateBinding(String),

    /// A remote target URI has no scheme or no remainder.
    #[error("Invalid remote URI '{0}'")]
    InvalidUri(String),

    /// The key is unbound, or its target cannot provision locally.
    #[error("No local target for {0}")]
    MissingTarget(String),
}
