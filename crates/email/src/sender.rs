//! Template repository and the sending front door.

use std::fs;
use std::path::{Path, PathBuf};

use gantry_config::{Config, ConfigError, Configurable};
use gantry_template::{StaticTemplate, Template, TemplateEngine};

use crate::address::Address;
use crate::email::Email;
use crate::error::EmailError;
use crate::message::{self, EmailMessage, DEFAULT_CONTENT_TYPE};
use crate::transport::EmailTransport;

const LANGUAGE_PLACEHOLDER: &str = "${language}";
const DEFAULT_LANGUAGE: &str = "en";

/// Creates [`Email`] instances from a directory of named templates and
/// hands finished messages to a transport.
///
/// Templates are XHTML files addressed by file stem: `user-registration`
/// names `user-registration.htm` in the repository. A repository path may
/// carry a `${language}` placeholder for per-language template sets,
/// resolved by [`email_localized`].
///
/// The sender implements [`Configurable`] with properties
/// `repository.path` (mandatory), `files.pattern`, `bounce.domain` and
/// `from.address`. Reconfiguration is allowed on a warm sender; the
/// exclusive borrow makes it safe to interleave with sending from other
/// scopes.
///
/// [`email_localized`]: EmailSender::email_localized
pub struct EmailSender {
    repository: Option<PathBuf>,
    pattern: Option<String>,
    bounce_domain: Option<String>,
    default_from: Option<Address>,
    engine: Option<Box<dyn TemplateEngine>>,
    transport: Box<dyn EmailTransport>,
}

impl EmailSender {
    pub fn new(transport: Box<dyn EmailTransport>) -> Self {
        EmailSender {
            repository: None,
            pattern: None,
            bounce_domain: None,
            default_from: None,
            engine: None,
            transport,
        }
    }

    pub fn with_repository(mut self, path: impl Into<PathBuf>) -> Self {
        self.repository = Some(path.into());
        self
    }

    /// File filter for repository scans, e.g. `*.htm`.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Domain for VERP envelope senders. Without it the envelope falls
    /// back to the `from` address.
    pub fn with_bounce_domain(mut self, domain: impl Into<String>) -> Self {
        self.bounce_domain = Some(domain.into());
        self
    }

    pub fn with_engine(mut self, engine: Box<dyn TemplateEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Default `from` address for emails whose template sets none.
    pub fn set_from_address(&mut self, address: &str) -> Result<(), EmailError> {
        self.default_from = Some(Address::parse(address)?);
        Ok(())
    }

    pub fn bounce_domain(&self) -> Option<&str> {
        self.bounce_domain.as_deref()
    }

    pub(crate) fn transport(&self) -> &dyn EmailTransport {
        self.transport.as_ref()
    }

    /// Email instance for a named template, non-localized repositories or
    /// the default language otherwise.
    pub fn email(&self, name: &str) -> Result<Email<'_>, EmailError> {
        self.build_email(None, name)
    }

    /// Locale-sensitive variant: `language` is the two-letter code
    /// substituted for `${language}` in the repository path.
    pub fn email_localized(&self, language: &str, name: &str) -> Result<Email<'_>, EmailError> {
        self.build_email(Some(language), name)
    }

    fn build_email(&self, language: Option<&str>, name: &str) -> Result<Email<'_>, EmailError> {
        if name.trim().is_empty() {
            return Err(EmailError::TemplateNotFound(name.to_string()));
        }
        let directory = self.repository_path(language)?;
        let path = self.find_template(&directory, name)?;
        let source = fs::read_to_string(&path)?;
        let head = TemplateHead::parse(&source, name)?;
        let template: Box<dyn Template> = match &self.engine {
            Some(engine) => engine.template_from_path(&path)?,
            None => Box::new(StaticTemplate::new(name, head.body.clone())),
        };
        let mut email = Email::new(self, template);
        if let Some(from) = &self.default_from {
            email = email.with_default_from(from.clone());
        }
        email.apply_head(&head)
    }

    /// One-shot plain sending without a template: single destination,
    /// reply-to and envelope equal to `from`, default content type.
    pub fn send_ad_hoc(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        content: &str,
    ) -> Result<(), EmailError> {
        let from = Address::parse(from)?;
        let to = Address::parse(to)?;
        let message = EmailMessage {
            message_id: message::next_message_id(from.domain()),
            envelope_from: from.clone(),
            reply_to: vec![from.clone()],
            from,
            to: vec![to],
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: Some(subject.to_string()),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            body: content.to_string(),
            files: Vec::new(),
        };
        self.transport.send(&message)
    }

    fn repository_path(&self, language: Option<&str>) -> Result<PathBuf, EmailError> {
        let repository = self
            .repository
            .as_ref()
            .ok_or_else(|| ConfigError::MissingProperty("repository.path".to_string()))?;
        let raw = repository.to_string_lossy();
        if raw.contains(LANGUAGE_PLACEHOLDER) {
            let language = language.unwrap_or(DEFAULT_LANGUAGE);
            Ok(PathBuf::from(
                raw.replace(LANGUAGE_PLACEHOLDER, language),
            ))
        } else {
            Ok(repository.clone())
        }
    }

    fn find_template(&self, directory: &Path, name: &str) -> Result<PathBuf, EmailError> {
        for entry in fs::read_dir(directory)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|value| value.to_str()) else {
                continue;
            };
            if let Some(pattern) = &self.pattern {
                if !matches_pattern(file_name, pattern) {
                    continue;
                }
            }
            if path.file_stem().and_then(|value| value.to_str()) == Some(name) {
                return Ok(path);
            }
        }
        Err(EmailError::TemplateNotFound(name.to_string()))
    }
}

impl Configurable for EmailSender {
    fn config(&mut self, config: &Config) -> Result<(), ConfigError> {
        self.repository = Some(PathBuf::from(
            config.mandatory_property::<String>("repository.path")?,
        ));
        self.pattern = config.property("files.pattern").map(str::to_string);
        self.bounce_domain = config.property("bounce.domain").map(str::to_string);
        if let Some(address) = config.property("from.address") {
            let parsed =
                Address::parse(address).map_err(|err| ConfigError::InvalidProperty {
                    name: "from.address".to_string(),
                    value: address.to_string(),
                    reason: err.to_string(),
                })?;
            self.default_from = Some(parsed);
        }
        Ok(())
    }
}

/// Head metadata and extracted body of a template file.
pub(crate) struct TemplateHead {
    pub(crate) fields: Vec<(String, String)>,
    pub(crate) content_type: Option<String>,
    pub(crate) body: String,
}

impl TemplateHead {
    pub(crate) fn parse(source: &str, name: &str) -> Result<Self, EmailError> {
        let document =
            roxmltree::Document::parse(source).map_err(|err| EmailError::InvalidTemplate {
                name: name.to_string(),
                message: err.to_string(),
            })?;

        let mut fields = Vec::new();
        let mut content_type = None;
        let head = document
            .descendants()
            .find(|node| node.tag_name().name() == "head");
        if let Some(head) = head {
            for meta in head
                .children()
                .filter(|child| child.tag_name().name() == "meta")
            {
                if let (Some(field), Some(content)) =
                    (meta.attribute("name"), meta.attribute("content"))
                {
                    fields.push((field.to_string(), content.to_string()));
                } else if let (Some(equiv), Some(content)) =
                    (meta.attribute("http-equiv"), meta.attribute("content"))
                {
                    if equiv.eq_ignore_ascii_case("content-type") {
                        content_type = Some(content.to_string());
                    }
                }
            }
        }

        Ok(TemplateHead {
            fields,
            content_type,
            body: extract_body(source, &document),
        })
    }
}

/// Inner markup of the `<body>` element, or the whole source when there is
/// none.
fn extract_body(source: &str, document: &roxmltree::Document) -> String {
    let Some(body) = document
        .descendants()
        .find(|node| node.tag_name().name() == "body")
    else {
        return source.to_string();
    };
    let slice = &source[body.range()];
    let inner_start = match slice.find('>') {
        Some(close) if !slice[..close].ends_with('/') => close + 1,
        _ => return String::new(),
    };
    let inner_end = slice.rfind("</").unwrap_or(slice.len());
    if inner_end <= inner_start {
        return String::new();
    }
    slice[inner_start..inner_end].trim().to_string()
}

fn matches_pattern(name: &str, pattern: &str) -> bool {
    let mut segments = pattern.split('*');
    let Some(first) = segments.next() else {
        return name == pattern;
    };
    let Some(mut rest) = name.strip_prefix(first) else {
        return false;
    };
    let segments: Vec<&str> = segments.collect();
    if segments.is_empty() {
        return rest.is_empty();
    }
    for (index, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if index == segments.len() - 1 {
            return rest.ends_with(segment);
        }
        match rest.find(segment) {
            Some(found) => rest = &rest[found + segment.len()..],
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use gantry_template::TemplateError;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    use super::*;
    use crate::message::EmailProperties;
    use crate::verp;

    #[derive(Default, Clone)]
    struct RecordingTransport {
        messages: Arc<Mutex<Vec<EmailMessage>>>,
    }

    impl RecordingTransport {
        fn sent(&self) -> Vec<EmailMessage> {
            self.messages.lock().unwrap().clone()
        }

        fn single(&self) -> EmailMessage {
            let messages = self.sent();
            assert_eq!(messages.len(), 1);
            messages.into_iter().next().unwrap()
        }
    }

    impl EmailTransport for RecordingTransport {
        fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
            self.messages.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    /// Renders `name:model` so tests can tell engine output from static
    /// body extraction.
    struct EchoEngine;

    struct EchoTemplate {
        name: String,
    }

    impl TemplateEngine for EchoEngine {
        fn set_property(&mut self, _name: &str, _value: Value) -> Result<(), TemplateError> {
            Ok(())
        }

        fn template_from_path(&self, path: &Path) -> Result<Box<dyn Template>, TemplateError> {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("template")
                .to_string();
            Ok(Box::new(EchoTemplate { name }))
        }

        fn template_from_str(
            &self,
            _source: &str,
            name: &str,
        ) -> Result<Box<dyn Template>, TemplateError> {
            Ok(Box::new(EchoTemplate {
                name: name.to_string(),
            }))
        }
    }

    impl Template for EchoTemplate {
        fn name(&self) -> &str {
            &self.name
        }

        fn set_property(&mut self, _name: &str, _value: Value) -> Result<(), TemplateError> {
            Ok(())
        }

        fn serialize(
            &self,
            model: Option<&Value>,
            out: &mut dyn std::io::Write,
        ) -> Result<(), TemplateError> {
            let model = model.map(Value::to_string).unwrap_or_default();
            write!(out, "{}:{}", self.name, model)?;
            Ok(())
        }
    }

    const REGISTRATION: &str = r#"<html>
    <head>
        <meta name="from" content="Customer Care &lt;care@example.com&gt;" />
        <meta name="subject" content="Welcome aboard" />
        <meta name="cc" content="records@example.com, audit@example.com" />
        <meta http-equiv="Content-Type" content="text/html; charset=UTF-8" />
    </head>
    <body>
        <p>Dear user,</p>
    </body>
</html>"#;

    const BARE: &str = "<html><head></head><body><p>plain</p></body></html>";

    fn repository(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn sender(repository: &TempDir) -> (EmailSender, RecordingTransport) {
        let transport = RecordingTransport::default();
        let sender = EmailSender::new(Box::new(transport.clone()))
            .with_repository(repository.path());
        (sender, transport)
    }

    #[test]
    fn test_template_email_send() {
        let dir = repository(&[("user-registration.htm", REGISTRATION)]);
        let (sender, transport) = sender(&dir);

        sender
            .email("user-registration")
            .unwrap()
            .to("bob@example.com")
            .unwrap()
            .send(None)
            .unwrap();

        let message = transport.single();
        assert_eq!(message.from().address(), "care@example.com");
        assert_eq!(message.from().display_name(), Some("Customer Care"));
        assert_eq!(message.subject(), Some("Welcome aboard"));
        assert_eq!(message.cc().len(), 2);
        assert_eq!(message.to().len(), 1);
        assert_eq!(message.body(), "<p>Dear user,</p>");
        assert_eq!(message.content_type(), DEFAULT_CONTENT_TYPE);
        assert!(message.message_id().ends_with("@example.com"));
        assert_eq!(message.envelope_from(), message.from());
    }

    #[test]
    fn test_missing_from_and_to() {
        let dir = repository(&[("bare.htm", BARE)]);
        let (sender, _transport) = sender(&dir);

        let email = sender.email("bare").unwrap().to("bob@example.com").unwrap();
        assert!(matches!(
            email.send(None),
            Err(EmailError::MissingField("from"))
        ));

        let email = sender.email("bare").unwrap().from("a@b.com").unwrap();
        assert!(matches!(
            email.send(None),
            Err(EmailError::MissingField("to"))
        ));
    }

    #[test]
    fn test_template_not_found() {
        let dir = repository(&[("bare.htm", BARE)]);
        let (sender, _transport) = sender(&dir);
        assert!(matches!(
            sender.email("absent"),
            Err(EmailError::TemplateNotFound(name)) if name == "absent"
        ));
    }

    #[test]
    fn test_invalid_template_is_rejected() {
        let dir = repository(&[("broken.htm", "<html><body>no close")]);
        let (sender, _transport) = sender(&dir);
        assert!(matches!(
            sender.email("broken"),
            Err(EmailError::InvalidTemplate { name, .. }) if name == "broken"
        ));
    }

    #[test]
    fn test_files_pattern_filters_scan() {
        let dir = repository(&[("promo.html", BARE), ("notice.htm", BARE)]);
        let transport = RecordingTransport::default();
        let sender = EmailSender::new(Box::new(transport))
            .with_repository(dir.path())
            .with_pattern("*.htm");

        assert!(sender.email("notice").is_ok());
        assert!(matches!(
            sender.email("promo"),
            Err(EmailError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn test_localized_repository() {
        let dir = tempfile::tempdir().unwrap();
        for (language, subject) in [("en", "Hello"), ("ro", "Salut")] {
            let localized = dir.path().join(language);
            fs::create_dir(&localized).unwrap();
            fs::write(
                localized.join("greeting.htm"),
                format!(
                    "<html><head><meta name=\"subject\" content=\"{subject}\"/></head>\
                     <body><p>x</p></body></html>"
                ),
            )
            .unwrap();
        }
        let transport = RecordingTransport::default();
        let sender = EmailSender::new(Box::new(transport.clone()))
            .with_repository(dir.path().join(LANGUAGE_PLACEHOLDER));

        sender
            .email_localized("ro", "greeting")
            .unwrap()
            .from("a@b.com")
            .unwrap()
            .to("c@d.com")
            .unwrap()
            .send(None)
            .unwrap();
        assert_eq!(transport.single().subject(), Some("Salut"));

        // without an explicit language the default set is used
        assert!(sender.email("greeting").is_ok());
    }

    #[test]
    fn test_default_from_and_meta_precedence() {
        let dir = repository(&[
            ("bare.htm", BARE),
            ("user-registration.htm", REGISTRATION),
        ]);
        let transport = RecordingTransport::default();
        let mut sender = EmailSender::new(Box::new(transport.clone()))
            .with_repository(dir.path());
        sender.set_from_address("default@example.com").unwrap();

        sender
            .email("bare")
            .unwrap()
            .to("bob@example.com")
            .unwrap()
            .send(None)
            .unwrap();
        sender
            .email("user-registration")
            .unwrap()
            .to("bob@example.com")
            .unwrap()
            .send(None)
            .unwrap();

        let messages = transport.sent();
        assert_eq!(messages[0].from().address(), "default@example.com");
        assert_eq!(messages[1].from().address(), "care@example.com");
    }

    #[test]
    fn test_setters_override_meta() {
        let dir = repository(&[("user-registration.htm", REGISTRATION)]);
        let (sender, transport) = sender(&dir);

        sender
            .email("user-registration")
            .unwrap()
            .from("override@example.com")
            .unwrap()
            .subject("Changed")
            .to("bob@example.com")
            .unwrap()
            .send(None)
            .unwrap();

        let message = transport.single();
        assert_eq!(message.from().address(), "override@example.com");
        assert_eq!(message.subject(), Some("Changed"));
    }

    #[test]
    fn test_bulk_properties() {
        let dir = repository(&[("bare.htm", BARE)]);
        let (sender, transport) = sender(&dir);
        let properties = EmailProperties::new()
            .from("sales@example.com")
            .reply_to("sales@example.com, head@example.com")
            .subject("Quarterly numbers");

        sender
            .email("bare")
            .unwrap()
            .set(&properties)
            .unwrap()
            .to("bob@example.com")
            .unwrap()
            .send(None)
            .unwrap();

        let message = transport.single();
        assert_eq!(message.from().address(), "sales@example.com");
        assert_eq!(message.reply_to().len(), 2);
        assert_eq!(message.subject(), Some("Quarterly numbers"));
    }

    #[test]
    fn test_model_fields_override_everything() {
        let dir = repository(&[("user-registration.htm", REGISTRATION)]);
        let (sender, transport) = sender(&dir);

        sender
            .email("user-registration")
            .unwrap()
            .to("bob@example.com")
            .unwrap()
            .subject("From setter")
            .send(Some(&json!({
                "to": ["model@example.com", "second@example.com"],
                "subject": "From model",
                "name": "Bob"
            })))
            .unwrap();

        let message = transport.single();
        assert_eq!(message.to().len(), 2);
        assert_eq!(message.to()[0].address(), "model@example.com");
        assert_eq!(message.subject(), Some("From model"));
    }

    #[test]
    fn test_verp_envelope_from_bounce_domain() {
        let dir = repository(&[("user-registration.htm", REGISTRATION)]);
        let transport = RecordingTransport::default();
        let sender = EmailSender::new(Box::new(transport.clone()))
            .with_repository(dir.path())
            .with_bounce_domain("bounce.example.com");

        sender
            .email("user-registration")
            .unwrap()
            .to("bob@example.com")
            .unwrap()
            .send(None)
            .unwrap();

        let message = transport.single();
        assert_eq!(message.envelope_from().domain(), "bounce.example.com");
        let decoded =
            verp::decode_bounce_address(&message.envelope_from().address()).unwrap();
        assert_eq!(decoded, message.message_id());
    }

    #[test]
    fn test_explicit_envelope_wins_over_verp() {
        let dir = repository(&[("user-registration.htm", REGISTRATION)]);
        let transport = RecordingTransport::default();
        let sender = EmailSender::new(Box::new(transport.clone()))
            .with_repository(dir.path())
            .with_bounce_domain("bounce.example.com");

        sender
            .email("user-registration")
            .unwrap()
            .envelope_from("returns@example.com")
            .unwrap()
            .to("bob@example.com")
            .unwrap()
            .send(None)
            .unwrap();

        assert_eq!(
            transport.single().envelope_from().address(),
            "returns@example.com"
        );
    }

    #[test]
    fn test_engine_renders_body() {
        let dir = repository(&[("user-registration.htm", REGISTRATION)]);
        let transport = RecordingTransport::default();
        let sender = EmailSender::new(Box::new(transport.clone()))
            .with_repository(dir.path())
            .with_engine(Box::new(EchoEngine));

        sender
            .email("user-registration")
            .unwrap()
            .to("bob@example.com")
            .unwrap()
            .send(Some(&json!({"name": "Bob"})))
            .unwrap();

        assert_eq!(
            transport.single().body(),
            "user-registration:{\"name\":\"Bob\"}"
        );
    }

    #[test]
    fn test_attachments_travel_to_transport() {
        let dir = repository(&[("user-registration.htm", REGISTRATION)]);
        let (sender, transport) = sender(&dir);

        sender
            .email("user-registration")
            .unwrap()
            .to("bob@example.com")
            .unwrap()
            .file("/var/reports/q3.pdf")
            .send(None)
            .unwrap();

        assert_eq!(
            transport.single().files(),
            [PathBuf::from("/var/reports/q3.pdf")]
        );
    }

    #[test]
    fn test_send_ad_hoc() {
        let dir = repository(&[]);
        let (sender, transport) = sender(&dir);

        sender
            .send_ad_hoc(
                "care@example.com",
                "bob@example.com",
                "Password reset",
                "<p>Click the link.</p>",
            )
            .unwrap();

        let message = transport.single();
        assert_eq!(message.from().address(), "care@example.com");
        assert_eq!(message.to().len(), 1);
        assert_eq!(message.envelope_from(), message.from());
        assert_eq!(message.reply_to(), [message.from().clone()]);
        assert_eq!(message.subject(), Some("Password reset"));
        assert_eq!(message.content_type(), DEFAULT_CONTENT_TYPE);
        assert_eq!(message.body(), "<p>Click the link.</p>");
    }

    #[test]
    fn test_config_properties() {
        let dir = repository(&[("bare.htm", BARE)]);
        let transport = RecordingTransport::default();
        let mut sender = EmailSender::new(Box::new(transport.clone()));

        let config = Config::from_xml(&format!(
            r#"<emails>
                <property name="repository.path" value="{}" />
                <property name="files.pattern" value="*.htm" />
                <property name="bounce.domain" value="bounce.example.com" />
                <property name="from.address" value="noreply@example.com" />
            </emails>"#,
            dir.path().display()
        ))
        .unwrap();
        sender.config(&config).unwrap();

        sender
            .email("bare")
            .unwrap()
            .to("bob@example.com")
            .unwrap()
            .send(None)
            .unwrap();

        let message = transport.single();
        assert_eq!(message.from().address(), "noreply@example.com");
        assert_eq!(message.envelope_from().domain(), "bounce.example.com");
    }

    #[test]
    fn test_config_requires_repository_path() {
        let transport = RecordingTransport::default();
        let mut sender = EmailSender::new(Box::new(transport));
        let config = Config::from_xml("<emails/>").unwrap();
        assert!(matches!(
            sender.config(&config),
            Err(ConfigError::MissingProperty(name)) if name == "repository.path"
        ));
    }

    #[test]
    fn test_pattern_matching() {
        assert!(matches_pattern("promo.htm", "*.htm"));
        assert!(!matches_pattern("promo.html", "*.htm"));
        assert!(matches_pattern("user-registration.html", "user-*.html"));
        assert!(matches_pattern("anything", "*"));
        assert!(matches_pattern("exact.htm", "exact.htm"));
        assert!(!matches_pattern("other.htm", "exact.htm"));
        assert!(matches_pattern("a-b-c.htm", "a-*-c.htm"));
    }
}
