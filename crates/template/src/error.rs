use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Property '{name}': {message}")]
    PropertyError { name: String, message: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
