//! Engine and template contracts.

use std::io;
use std::path::Path;

use serde_json::Value;

use crate::error::TemplateError;

/// A reusable template engine.
///
/// Engines parse template sources into [`Template`] instances and carry
/// engine-scope properties that templates created afterwards inherit.
/// Where template files live is the caller's concern, not the engine's.
pub trait TemplateEngine: Send + Sync {
    /// Sets an engine-scope property inherited by new templates.
    fn set_property(&mut self, name: &str, value: Value) -> Result<(), TemplateError>;

    fn template_from_path(&self, path: &Path) -> Result<Box<dyn Template>, TemplateError>;

    fn template_from_str(
        &self,
        source: &str,
        name: &str,
    ) -> Result<Box<dyn Template>, TemplateError>;
}

/// A parsed template, ready to merge with a model.
pub trait Template: Send + Sync {
    fn name(&self) -> &str;

    /// Sets an instance property, overriding the engine-scope value.
    fn set_property(&mut self, name: &str, value: Value) -> Result<(), TemplateError>;

    /// Writes the merged output. Serialization is idempotent; a `None`
    /// model serializes the template itself.
    fn serialize(
        &self,
        model: Option<&Value>,
        out: &mut dyn io::Write,
    ) -> Result<(), TemplateError>;

    fn render(&self, model: Option<&Value>) -> Result<String, TemplateError> {
        let mut out = Vec::new();
        self.serialize(model, &mut out)?;
        String::from_utf8(out).map_err(|err| {
            TemplateError::ExecutionError(format!("Rendered output is not UTF-8: {err}"))
        })
    }
}

/// A template whose output is its source, unchanged.
///
/// Stands in where no engine is configured: model and properties have no
/// effect on the fixed body.
pub struct StaticTemplate {
    name: String,
    source: String,
}

impl StaticTemplate {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        StaticTemplate {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Loads the file as-is, named after its stem.
    pub fn from_path(path: &Path) -> Result<Self, TemplateError> {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("template")
            .to_string();
        let source = std::fs::read_to_string(path)?;
        Ok(StaticTemplate { name, source })
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Template for StaticTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_property(&mut self, _name: &str, _value: Value) -> Result<(), TemplateError> {
        Ok(())
    }

    fn serialize(
        &self,
        _model: Option<&Value>,
        out: &mut dyn io::Write,
    ) -> Result<(), TemplateError> {
        out.write_all(self.source.as_bytes())?;
        Ok(())
    }
}
