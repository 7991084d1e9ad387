use thiserror::Error;

/// Errors raised while loading or interrogating configuration objects.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration syntax error: {0}")]
    SyntaxError(String),

    #[error("Missing mandatory configuration property '{0}'")]
    MissingProperty(String),

    #[error("Invalid value '{value}' for configuration property '{name}': {reason}")]
    InvalidProperty {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Configuration IO error: {0}")]
    IoError(#[from] std::io::Error),
}
