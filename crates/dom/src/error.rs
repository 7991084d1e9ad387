use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    InvalidArgument(String),
}
