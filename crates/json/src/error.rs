use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("Syntax error: {0}")]
    SyntaxError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Type '{0}' is not registered")]
    UnregisteredType(String),

    #[error("Expected type '{expected}', found '{found}'")]
    TypeMismatch { expected: String, found: String },

    #[error("Object carries no type property")]
    MissingType,

    #[error("Type '{0}' does not serialize to a JSON object")]
    NotAnObject(&'static str),
}
