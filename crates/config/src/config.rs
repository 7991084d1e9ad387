//! The configuration object model.

use std::collections::HashMap;
use std::io::Read;
use std::str::FromStr;

use crate::error::ConfigError;

/// A service that accepts an external configuration section.
///
/// Implementations should validate eagerly and reject bad sections with a
/// descriptive [`ConfigError`] instead of failing later at use time.
pub trait Configurable {
    fn config(&mut self, config: &Config) -> Result<(), ConfigError>;
}

/// A named configuration section.
///
/// Sections form a tree: every XML element becomes a `Config` node carrying
/// its attributes, except `<property name= value=>` children, which are
/// collected into the parent's property map. Property values may also be
/// given as element text when the `value` attribute is absent.
#[derive(Debug, Clone, Default)]
pub struct Config {
    name: String,
    attributes: HashMap<String, String>,
    properties: HashMap<String, String>,
    children: Vec<Config>,
}

impl Config {
    /// Creates an empty section, mostly useful for tests and programmatic setup.
    pub fn new(name: impl Into<String>) -> Self {
        Config {
            name: name.into(),
            ..Config::default()
        }
    }

    /// Loads a configuration tree from an XML source string.
    pub fn from_xml(source: &str) -> Result<Self, ConfigError> {
        let document = roxmltree::Document::parse(source)
            .map_err(|err| ConfigError::SyntaxError(err.to_string()))?;
        Self::from_node(document.root_element())
    }

    /// Loads a configuration tree from an XML byte stream.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, ConfigError> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        Self::from_xml(&source)
    }

    fn from_node(node: roxmltree::Node) -> Result<Self, ConfigError> {
        let mut config = Config::new(node.tag_name().name());
        for attribute in node.attributes() {
            config
                .attributes
                .insert(attribute.name().to_string(), attribute.value().to_string());
        }
        for child in node.children().filter(|child| child.is_element()) {
            if child.tag_name().name() == "property" {
                let name = child.attribute("name").ok_or_else(|| {
                    ConfigError::SyntaxError(format!(
                        "<property> element without 'name' attribute in section '{}'",
                        config.name
                    ))
                })?;
                let value = match child.attribute("value") {
                    Some(value) => value.to_string(),
                    None => child.text().unwrap_or_default().trim().to_string(),
                };
                config.properties.insert(name.to_string(), value);
            } else {
                config.children.push(Self::from_node(child)?);
            }
        }
        Ok(config)
    }

    /// The section name, i.e. the source element's tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Reads an optional property converted to `T`.
    ///
    /// A present but unconvertible value is an error even for optional
    /// properties, so typos fail loudly instead of silently disabling setup.
    pub fn get_property<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.property(name) {
            None => Ok(None),
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|err| ConfigError::InvalidProperty {
                    name: name.to_string(),
                    value: value.to_string(),
                    reason: err.to_string(),
                }),
        }
    }

    /// Reads a mandatory property converted to `T`.
    pub fn mandatory_property<T>(&self, name: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_property(name)?
            .ok_or_else(|| ConfigError::MissingProperty(name.to_string()))
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    /// First child section with the given name.
    pub fn child(&self, name: &str) -> Option<&Config> {
        self.children.iter().find(|child| child.name == name)
    }

    /// All child sections with the given name, in document order.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Config> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn all_children(&self) -> &[Config] {
        &self.children
    }

    pub fn add_child(&mut self, child: Config) {
        self.children.push(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <app>
            <property name="threads" value="4" />
            <property name="motd">hello there</property>
            <emails provider="local">
                <property name="repository.path" value="/var/mail" />
            </emails>
            <emails provider="backup">
                <property name="repository.path" value="/srv/mail" />
            </emails>
        </app>
    "#;

    #[test]
    fn test_parse_sections_and_properties() {
        let config = Config::from_xml(SAMPLE).unwrap();
        assert_eq!(config.name(), "app");
        assert_eq!(config.property("threads"), Some("4"));
        assert_eq!(config.property("motd"), Some("hello there"));
        assert_eq!(config.all_children().len(), 2);

        let emails = config.child("emails").unwrap();
        assert_eq!(emails.attribute("provider"), Some("local"));
        assert_eq!(emails.property("repository.path"), Some("/var/mail"));
        assert_eq!(config.children("emails").count(), 2);
    }

    #[test]
    fn test_typed_property_access() {
        let config = Config::from_xml(SAMPLE).unwrap();
        assert_eq!(config.get_property::<u32>("threads").unwrap(), Some(4));
        assert_eq!(config.get_property::<u32>("missing").unwrap(), None);
        assert!(matches!(
            config.get_property::<u32>("motd"),
            Err(ConfigError::InvalidProperty { .. })
        ));
    }

    #[test]
    fn test_mandatory_property() {
        let config = Config::from_xml(SAMPLE).unwrap();
        assert_eq!(
            config.mandatory_property::<String>("threads").unwrap(),
            "4"
        );
        assert!(matches!(
            config.mandatory_property::<String>("absent"),
            Err(ConfigError::MissingProperty(name)) if name == "absent"
        ));
    }

    #[test]
    fn test_property_without_name_is_rejected() {
        let result = Config::from_xml("<app><property value=\"1\"/></app>");
        assert!(matches!(result, Err(ConfigError::SyntaxError(_))));
    }

    #[test]
    fn test_malformed_xml_is_rejected() {
        assert!(matches!(
            Config::from_xml("<app><unclosed></app>"),
            Err(ConfigError::SyntaxError(_))
        ));
    }

    #[test]
    fn test_programmatic_construction() {
        let mut config = Config::new("transactions");
        config.set_property("schema", "inventory");
        config.set_attribute("provider", "memory");
        let mut child = Config::new("pool");
        child.set_property("size", "8");
        config.add_child(child);

        assert_eq!(config.property("schema"), Some("inventory"));
        assert_eq!(config.attribute("provider"), Some("memory"));
        assert_eq!(config.child("pool").unwrap().property("size"), Some("8"));
    }
}
