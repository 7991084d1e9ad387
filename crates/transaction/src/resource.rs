//! The resource provider contract.

use crate::error::TransactionError;

/// A transactional backend a [`TransactionManager`] can demarcate work on.
///
/// The session is the unit handed to working code, the analog of a database
/// connection or an ORM session. Managers call the lifecycle in a fixed
/// order: `open_session`, `begin`, then `commit` or `rollback`, and finally
/// `release`. Sessions never travel between threads while a transaction is
/// active, but the resource itself is shared.
///
/// [`TransactionManager`]: crate::TransactionManager
pub trait TransactionalResource: Send + Sync {
    type Session: Send;

    /// Opens a session, optionally bound to a named schema.
    fn open_session(&self, schema: Option<&str>) -> Result<Self::Session, TransactionError>;

    /// Starts a unit of work on the session.
    fn begin(&self, session: &mut Self::Session, read_only: bool)
        -> Result<(), TransactionError>;

    /// Makes the session's pending work permanent.
    fn commit(&self, session: &mut Self::Session) -> Result<(), TransactionError>;

    /// Discards the session's pending work.
    fn rollback(&self, session: &mut Self::Session) -> Result<(), TransactionError>;

    /// Returns the session to the resource.
    fn release(&self, session: Self::Session) -> Result<(), TransactionError>;
}
