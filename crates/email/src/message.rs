//! Finished messages and bulk property sets.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::address::Address;

pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

/// A reusable bundle of optional email fields.
///
/// The programmatic alternative to template head metadata, handy when a
/// group of related emails shares the same setup. Apply with
/// [`Email::set`](crate::Email::set); multi-value fields take
/// comma-separated lists and are validated on application.
#[derive(Debug, Clone, Default)]
pub struct EmailProperties {
    pub(crate) from: Option<String>,
    pub(crate) envelope_from: Option<String>,
    pub(crate) reply_to: Option<String>,
    pub(crate) to: Option<String>,
    pub(crate) cc: Option<String>,
    pub(crate) bcc: Option<String>,
    pub(crate) subject: Option<String>,
}

impl EmailProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    pub fn envelope_from(mut self, address: impl Into<String>) -> Self {
        self.envelope_from = Some(address.into());
        self
    }

    pub fn reply_to(mut self, addresses: impl Into<String>) -> Self {
        self.reply_to = Some(addresses.into());
        self
    }

    pub fn to(mut self, addresses: impl Into<String>) -> Self {
        self.to = Some(addresses.into());
        self
    }

    pub fn cc(mut self, addresses: impl Into<String>) -> Self {
        self.cc = Some(addresses.into());
        self
    }

    pub fn bcc(mut self, addresses: impl Into<String>) -> Self {
        self.bcc = Some(addresses.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// A fully-resolved email as handed to the transport.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub(crate) message_id: String,
    pub(crate) from: Address,
    pub(crate) envelope_from: Address,
    pub(crate) to: Vec<Address>,
    pub(crate) cc: Vec<Address>,
    pub(crate) bcc: Vec<Address>,
    pub(crate) reply_to: Vec<Address>,
    pub(crate) subject: Option<String>,
    pub(crate) content_type: String,
    pub(crate) body: String,
    pub(crate) files: Vec<PathBuf>,
}

impl EmailMessage {
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn from(&self) -> &Address {
        &self.from
    }

    /// The envelope (reverse-path) sender bounce messages go back to.
    pub fn envelope_from(&self) -> &Address {
        &self.envelope_from
    }

    pub fn to(&self) -> &[Address] {
        &self.to
    }

    pub fn cc(&self) -> &[Address] {
        &self.cc
    }

    pub fn bcc(&self) -> &[Address] {
        &self.bcc
    }

    pub fn reply_to(&self) -> &[Address] {
        &self.reply_to
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

/// Fresh message id in the `<hex-time>.<hex-random>@<host>` form.
pub(crate) fn next_message_id(host: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let noise: u64 = rand::rng().random();
    format!("{millis:x}.{noise:x}@{host}")
}
