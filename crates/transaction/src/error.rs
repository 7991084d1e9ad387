//! Error types for transaction demarcation.

use gantry_config::ConfigError;
use thiserror::Error;

/// Errors raised while opening, running or concluding transactions.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The underlying resource refused an operation.
    #[error("Resource error: {0}")]
    ResourceError(String),

    /// The working unit passed to `exec` returned an error.
    #[error("Working unit failed: {0}")]
    WorkingUnitError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Commit or rollback was requested on a read-only transaction.
    #[error("Transaction is read-only")]
    ReadOnly,

    /// No transaction is active on the current thread.
    #[error("No active transaction on this thread")]
    NoTransaction,

    /// A nested transaction asked for a different schema than the one it joins.
    #[error("Nested transaction requested schema '{requested}' inside '{outer}'")]
    NestedSchema { outer: String, requested: String },

    /// The transaction has already been committed, rolled back or closed.
    #[error("Transaction already concluded")]
    Concluded,

    /// The manager configuration section was invalid.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}
