//! The per-delivery email object.

use std::path::PathBuf;

use gantry_template::Template;
use serde_json::{Map, Value};

use crate::address::Address;
use crate::error::EmailError;
use crate::message::{self, EmailMessage, EmailProperties};
use crate::sender::{EmailSender, TemplateHead};
use crate::verp;

/// A template-based email being prepared for one delivery.
///
/// Instances come from [`EmailSender::email`] with fields already seeded
/// from the sender defaults and the template head metadata. The fluent
/// setters override those, and top-level model fields named like the email
/// fields override everything at [`send`] time.
///
/// ```no_run
/// # use gantry_email::{EmailSender, EmailError};
/// # fn demo(sender: &EmailSender) -> Result<(), EmailError> {
/// sender
///     .email("user-registration")?
///     .to("bob@example.com")?
///     .send(None)
/// # }
/// ```
///
/// [`EmailSender::email`]: crate::EmailSender::email
/// [`send`]: Email::send
pub struct Email<'a> {
    sender: &'a EmailSender,
    template: Box<dyn Template>,
    from: Option<Address>,
    envelope_from: Option<Address>,
    reply_to: Vec<Address>,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
    subject: Option<String>,
    content_type: String,
    files: Vec<PathBuf>,
}

impl<'a> Email<'a> {
    pub(crate) fn new(sender: &'a EmailSender, template: Box<dyn Template>) -> Self {
        Email {
            sender,
            template,
            from: None,
            envelope_from: None,
            reply_to: Vec::new(),
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: None,
            content_type: message::DEFAULT_CONTENT_TYPE.to_string(),
            files: Vec::new(),
        }
    }

    pub(crate) fn with_default_from(mut self, address: Address) -> Self {
        self.from = Some(address);
        self
    }

    pub(crate) fn apply_head(mut self, head: &TemplateHead) -> Result<Self, EmailError> {
        for (field, content) in &head.fields {
            self = match field.as_str() {
                "from" => self.from(content)?,
                "envelopeFrom" | "envelope-from" => self.envelope_from(content)?,
                "to" => self.to(content)?,
                "cc" => self.cc(content)?,
                "bcc" => self.bcc(content)?,
                "replyTo" | "reply-to" => self.reply_to(content)?,
                "subject" => self.subject(content.as_str()),
                other => {
                    log::debug!(
                        "Ignoring head meta '{}' in email template '{}'",
                        other,
                        self.template.name()
                    );
                    self
                }
            };
        }
        if let Some(content_type) = &head.content_type {
            self = self.content_type(content_type.as_str());
        }
        Ok(self)
    }

    /// Applies the present fields of `properties` in bulk. Addresses are
    /// validated here, so a bad one fails the whole call.
    pub fn set(mut self, properties: &EmailProperties) -> Result<Self, EmailError> {
        if let Some(from) = &properties.from {
            self = self.from(from)?;
        }
        if let Some(envelope_from) = &properties.envelope_from {
            self = self.envelope_from(envelope_from)?;
        }
        if let Some(reply_to) = &properties.reply_to {
            self = self.reply_to(reply_to)?;
        }
        if let Some(to) = &properties.to {
            self = self.to(to)?;
        }
        if let Some(cc) = &properties.cc {
            self = self.cc(cc)?;
        }
        if let Some(bcc) = &properties.bcc {
            self = self.bcc(bcc)?;
        }
        if let Some(subject) = &properties.subject {
            self = self.subject(subject.as_str());
        }
        Ok(self)
    }

    pub fn from(mut self, address: &str) -> Result<Self, EmailError> {
        self.from = Some(Address::parse(address)?);
        Ok(self)
    }

    /// Reverse-path address for bounce messages. When never set, `send`
    /// falls back to VERP when a bounce domain is configured, then to the
    /// `from` address.
    pub fn envelope_from(mut self, address: &str) -> Result<Self, EmailError> {
        self.envelope_from = Some(Address::parse(address)?);
        Ok(self)
    }

    /// Destination addresses, comma-separated. Replaces the current list.
    pub fn to(mut self, addresses: &str) -> Result<Self, EmailError> {
        self.to = Address::parse_list(addresses)?;
        Ok(self)
    }

    pub fn cc(mut self, addresses: &str) -> Result<Self, EmailError> {
        self.cc = Address::parse_list(addresses)?;
        Ok(self)
    }

    pub fn bcc(mut self, addresses: &str) -> Result<Self, EmailError> {
        self.bcc = Address::parse_list(addresses)?;
        Ok(self)
    }

    pub fn reply_to(mut self, addresses: &str) -> Result<Self, EmailError> {
        self.reply_to = Address::parse_list(addresses)?;
        Ok(self)
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Attaches a file. Existence is checked by the transport, not here.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Renders the body with `model`, resolves the remaining fields and
    /// hands the finished message to the sender's transport.
    ///
    /// Top-level model fields named like the email fields (strings or
    /// arrays of strings) override every earlier source. Missing `from` or
    /// `to` fails with [`EmailError::MissingField`].
    pub fn send(mut self, model: Option<&Value>) -> Result<(), EmailError> {
        if let Some(Value::Object(fields)) = model {
            self = self.inject_model_fields(fields)?;
        }

        let from = self.from.clone().ok_or(EmailError::MissingField("from"))?;
        if self.to.is_empty() {
            return Err(EmailError::MissingField("to"));
        }

        let message_id = message::next_message_id(from.domain());
        let envelope_from = match &self.envelope_from {
            Some(address) => address.clone(),
            None => match self.sender.bounce_domain() {
                Some(domain) => {
                    Address::parse(&verp::encode_bounce_address(&message_id, domain))?
                }
                None => from.clone(),
            },
        };

        let body = self.template.render(model)?;
        let message = EmailMessage {
            message_id,
            from,
            envelope_from,
            to: self.to,
            cc: self.cc,
            bcc: self.bcc,
            reply_to: self.reply_to,
            subject: self.subject,
            content_type: self.content_type,
            body,
            files: self.files,
        };
        self.sender.transport().send(&message)
    }

    fn inject_model_fields(mut self, fields: &Map<String, Value>) -> Result<Self, EmailError> {
        if let Some(value) = model_field(fields, &["from"]) {
            self = self.from(&value)?;
        }
        if let Some(value) = model_field(fields, &["envelopeFrom", "envelope_from"]) {
            self = self.envelope_from(&value)?;
        }
        if let Some(value) = model_field(fields, &["to"]) {
            self = self.to(&value)?;
        }
        if let Some(value) = model_field(fields, &["cc"]) {
            self = self.cc(&value)?;
        }
        if let Some(value) = model_field(fields, &["bcc"]) {
            self = self.bcc(&value)?;
        }
        if let Some(value) = model_field(fields, &["replyTo", "reply_to"]) {
            self = self.reply_to(&value)?;
        }
        if let Some(value) = model_field(fields, &["subject"]) {
            self = self.subject(value);
        }
        Ok(self)
    }
}

/// First present field under any of `names`, as a comma-joined string.
/// Strings pass through; arrays contribute their string items.
fn model_field(fields: &Map<String, Value>, names: &[&str]) -> Option<String> {
    for name in names {
        match fields.get(*name) {
            Some(Value::String(text)) => return Some(text.clone()),
            Some(Value::Array(items)) => {
                let texts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                if !texts.is_empty() {
                    return Some(texts.join(","));
                }
            }
            _ => {}
        }
    }
    None
}
