//! The delivery contract.

use crate::error::EmailError;
use crate::message::EmailMessage;

/// Moves finished messages onto the wire.
///
/// Implementations wrap SMTP, a provider API or a local queue. The sender
/// resolves fields and renders the body; the transport only delivers.
pub trait EmailTransport: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}
