use std::fmt;

use gantry_config::ConfigError;
use thiserror::Error;

/// Errors raised by CSV configuration, parsing and record binding.
#[derive(Error, Debug)]
pub enum CsvError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown field '{field}' for record type '{record}'")]
    UnknownField { field: String, record: &'static str },

    #[error("Malformed CSV at line {line}: {message}")]
    Malformed { line: u64, message: String },

    #[error("Null value for non-optional field '{0}'")]
    NullValue(String),

    #[error("Record binding error: {0}")]
    BindError(String),

    #[error(transparent)]
    ConfigError(#[from] ConfigError),

    #[error("CSV IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CsvError {
    pub(crate) fn coercion(
        line: u64,
        field: &str,
        raw: &str,
        target: &str,
        reason: impl fmt::Display,
    ) -> Self {
        CsvError::Malformed {
            line,
            message: format!("cannot coerce '{raw}' into {target} for field '{field}': {reason}"),
        }
    }
}

impl serde::de::Error for CsvError {
    fn custom<T: fmt::Display>(message: T) -> Self {
        CsvError::BindError(message.to_string())
    }
}

impl serde::ser::Error for CsvError {
    fn custom<T: fmt::Display>(message: T) -> Self {
        CsvError::BindError(message.to_string())
    }
}
