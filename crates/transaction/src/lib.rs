//! Transaction demarcation over pluggable resources.
//!
//! A [`TransactionManager`] wraps a [`TransactionalResource`] (the
//! database-connection or ORM-session provider) and hands out per-thread
//! transactions. Transactions nest by joining: only the outermost guard
//! touches the resource, so library code can demarcate its own work without
//! caring whether a caller already opened a transaction.
//!
//! ```no_run
//! # use gantry_transaction::{TransactionManager, TransactionalResource, TransactionError};
//! # fn demo<R: TransactionalResource<Session = Vec<String>>>(
//! #     manager: &TransactionManager<R>,
//! # ) -> Result<(), TransactionError> {
//! let inserted = manager.exec_default(|session| {
//!     session.push("row".to_string());
//!     Ok(session.len())
//! })?;
//! # let _ = inserted;
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Abstractions
//!
//! - **`TransactionalResource`**: Provider contract for sessions and the
//!   begin/commit/rollback/release lifecycle
//! - **`TransactionManager`**: Thread-safe front door, guard and closure styles
//! - **`Transaction`**: Per-thread guard with join-on-nest semantics

mod error;
mod manager;
mod resource;

pub use error::TransactionError;
pub use manager::{Transaction, TransactionManager};
pub use resource::TransactionalResource;
