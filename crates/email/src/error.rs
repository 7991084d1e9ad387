//! Error types for email building and delivery.

use gantry_config::ConfigError;
use gantry_template::TemplateError;
use thiserror::Error;

/// Errors raised while configuring the sender, building an email or
/// handing it to the transport.
#[derive(Debug, Error)]
pub enum EmailError {
    /// An address failed syntactic validation.
    #[error("Invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// No template with the requested name exists in the repository.
    #[error("No email template named '{0}' in the repository")]
    TemplateNotFound(String),

    /// The template file exists but cannot be used.
    #[error("Invalid email template '{name}': {message}")]
    InvalidTemplate { name: String, message: String },

    /// A field required for delivery was never set.
    #[error("Email field '{0}' is not set")]
    MissingField(&'static str),

    /// The template engine rejected the template or the merge.
    #[error("Template error: {0}")]
    TemplateError(#[from] TemplateError),

    /// The sender configuration section was invalid.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// The transport refused the message.
    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
