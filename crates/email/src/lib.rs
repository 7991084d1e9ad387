//! Template-based email building and sending.
//!
//! An [`EmailSender`] owns a repository of named XHTML templates and a
//! delivery transport. Each delivery starts from a template: head `<meta>`
//! elements seed the fields, fluent setters and [`EmailProperties`]
//! override them, and top-level model fields override everything when the
//! body is rendered at [`Email::send`].
//!
//! ```no_run
//! # use gantry_email::{EmailSender, EmailError};
//! # fn demo(sender: &EmailSender) -> Result<(), EmailError> {
//! sender
//!     .email("user-registration")?
//!     .to("bob@example.com")?
//!     .send(Some(&serde_json::json!({"name": "Bob"})))
//! # }
//! ```
//!
//! Delivery itself is behind the [`EmailTransport`] contract; this crate
//! ships no wire protocol. Bounce tracking uses VERP envelope senders when
//! a bounce domain is configured, see [`verp`].
//!
//! ## Key Abstractions
//!
//! - **`EmailSender`**: Template repository, defaults and the transport
//! - **`Email`**: One delivery being prepared, fluent and fallible
//! - **`EmailMessage`**: The resolved message a transport receives
//! - **`EmailTransport`**: Delivery contract implemented by wire protocols

mod address;
mod email;
mod error;
mod message;
mod sender;
mod transport;
pub mod verp;

pub use address::Address;
pub use email::Email;
pub use error::EmailError;
pub use message::{EmailMessage, EmailProperties, DEFAULT_CONTENT_TYPE};
pub use sender::EmailSender;
pub use transport::EmailTransport;
