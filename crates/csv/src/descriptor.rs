//! Record type descriptors: the binding between a CSV stream and a type.

use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::sync::Arc;

use gantry_config::{naming, Config, ConfigError};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CsvError;
use crate::fields;
use crate::format::{CsvComment, CsvDelimiter, CsvEscape, CsvFormat, CsvQuote};
use crate::reader::CsvReader;
use crate::value::ValueFormat;
use crate::writer::CsvWriter;

/// One column: the bound record field, an optional external title used for
/// header rows, and an optional per-column formatter.
#[derive(Clone)]
pub struct CsvColumn {
    field_name: String,
    title: Option<String>,
    formatter: Option<Arc<dyn ValueFormat>>,
}

impl CsvColumn {
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Header title for this column, falling back to the field name.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.field_name)
    }

    pub fn formatter(&self) -> Option<&dyn ValueFormat> {
        self.formatter.as_deref()
    }
}

impl fmt::Debug for CsvColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvColumn")
            .field("field_name", &self.field_name)
            .field("title", &self.title)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

/// Binds a record type to an ordered column list and a [`CsvFormat`].
///
/// Columns may be listed explicitly, derived from the record type's fields,
/// or inferred from a header row at read time. In strict mode every column
/// name is validated against the record type's field list; the columns must
/// cover all fields the type cannot default, so optional extras belong in
/// `Option` fields.
///
/// The descriptor doubles as the stream factory: [`reader`], [`reader_from_str`]
/// and [`writer`] consume it and return the configured stream.
///
/// [`reader`]: CsvDescriptor::reader
/// [`reader_from_str`]: CsvDescriptor::reader_from_str
/// [`writer`]: CsvDescriptor::writer
pub struct CsvDescriptor<T> {
    format: CsvFormat,
    columns: Vec<CsvColumn>,
    fields: Option<&'static [&'static str]>,
    record_type: &'static str,
    marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> CsvDescriptor<T> {
    pub fn new() -> Self {
        Self::with_format(CsvFormat::new())
    }

    pub fn with_format(format: CsvFormat) -> Self {
        CsvDescriptor {
            format,
            columns: Vec::new(),
            fields: fields::struct_fields::<T>(),
            record_type: std::any::type_name::<T>(),
            marker: PhantomData,
        }
    }

    /// Builds a descriptor from a configuration section of the form:
    ///
    /// ```xml
    /// <csv delimiter="tab" null-value="NIL" header="true" strict="true">
    ///     <value name="Name" property="name" />
    ///     <value name="Address" property="postal_address" />
    /// </csv>
    /// ```
    ///
    /// Character attributes (`delimiter`, `comment`, `escape`) accept a
    /// literal character or a constant name such as `comma`; `quote` also
    /// accepts a two-character open/close pair like `[]`.
    pub fn from_config(config: &Config) -> Result<Self, CsvError> {
        let mut format = CsvFormat::new();
        if let Some(value) = config.attribute("delimiter") {
            format = format.with_delimiter(parse_char_attr::<CsvDelimiter>(value)?)?;
        }
        if let Some(value) = config.attribute("comment") {
            format = format.with_comment(parse_char_attr::<CsvComment>(value)?)?;
        }
        if let Some(value) = config.attribute("quote") {
            let chars: Vec<char> = value.chars().collect();
            format = match chars.as_slice() {
                [one] => format.with_quote(*one)?,
                [open, close] => format.with_quote((*open, *close))?,
                _ => format.with_quote(value.parse::<CsvQuote>()?)?,
            };
        }
        if let Some(value) = config.attribute("escape") {
            format = format.with_escape(parse_char_attr::<CsvEscape>(value)?)?;
        }
        if let Some(value) = config.attribute("null-value") {
            format = format.with_null_value(value);
        }
        if let Some(value) = config.attribute("charset") {
            format = format.with_charset_name(value)?;
        }
        if let Some(header) = bool_attr(config, "header")? {
            format = format.with_header(header);
        }
        if let Some(empty_lines) = bool_attr(config, "empty-lines")? {
            format = format.with_empty_lines(empty_lines);
        }
        if let Some(trim) = bool_attr(config, "trim")? {
            format = format.with_trim(trim);
        }
        if let Some(strict) = bool_attr(config, "strict")? {
            format = format.with_strict(strict);
        }

        let mut descriptor = Self::with_format(format);
        for value in config.children("value") {
            let property = value.attribute("property").ok_or_else(|| {
                ConfigError::MissingProperty("value/@property".to_string())
            })?;
            let title = value.attribute("name").map(str::to_string);
            descriptor.push_column(property.to_string(), title, None)?;
        }
        Ok(descriptor)
    }
}

impl<T: DeserializeOwned> Default for CsvDescriptor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CsvDescriptor<T> {
    pub fn format(&self) -> &CsvFormat {
        &self.format
    }

    pub fn columns(&self) -> &[CsvColumn] {
        &self.columns
    }

    pub fn record_type(&self) -> &'static str {
        self.record_type
    }

    /// Replaces the column list with the given field names, in order.
    pub fn with_columns<I>(mut self, names: I) -> Result<Self, CsvError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.columns.clear();
        for name in names {
            self.push_column(name.into(), None, None)?;
        }
        Ok(self)
    }

    /// Appends one column bound to the given field.
    pub fn with_column(mut self, name: impl Into<String>) -> Result<Self, CsvError> {
        self.push_column(name.into(), None, None)?;
        Ok(self)
    }

    /// Appends one column with a dedicated value formatter.
    pub fn with_column_format(
        mut self,
        name: impl Into<String>,
        formatter: impl ValueFormat + 'static,
    ) -> Result<Self, CsvError> {
        self.push_column(name.into(), None, Some(Arc::new(formatter)))?;
        Ok(self)
    }

    /// Replaces the column list with the record type's own fields, in
    /// declaration order.
    pub fn with_type_columns(mut self) -> Result<Self, CsvError> {
        self.columns.clear();
        self.ensure_columns()?;
        Ok(self)
    }

    /// Loads columns from a header row.
    ///
    /// Each title is converted to the field naming convention, so headers
    /// like `NAME` or `POSTAL_ADDRESS` bind to `name` and `postal_address`.
    /// The column list is replaced wholesale, which makes repeated loads
    /// idempotent; formatters registered for a surviving field are retained.
    pub fn load<S: AsRef<str>>(&mut self, header: &[S]) -> Result<(), CsvError> {
        let formatters: Vec<(String, Arc<dyn ValueFormat>)> = self
            .columns
            .drain(..)
            .filter_map(|column| column.formatter.map(|f| (column.field_name, f)))
            .collect();
        for title in header {
            let field = naming::to_field_name(title.as_ref());
            let formatter = formatters
                .iter()
                .find(|(name, _)| *name == field)
                .map(|(_, f)| Arc::clone(f));
            self.push_column(field, Some(title.as_ref().to_string()), formatter)?;
        }
        Ok(())
    }

    fn push_column(
        &mut self,
        field: String,
        title: Option<String>,
        formatter: Option<Arc<dyn ValueFormat>>,
    ) -> Result<(), CsvError> {
        if let Some(fields) = self.fields {
            if !fields.contains(&field.as_str()) {
                if self.format.strict() {
                    return Err(CsvError::UnknownField {
                        field,
                        record: self.record_type,
                    });
                }
                log::warn!(
                    "unknown field '{}' for record type '{}', column kept as-is",
                    field,
                    self.record_type
                );
            }
        }
        self.columns.push(CsvColumn {
            field_name: field,
            title,
            formatter,
        });
        Ok(())
    }

    /// Derives columns from the record type when none were configured.
    pub(crate) fn ensure_columns(&mut self) -> Result<(), CsvError> {
        if !self.columns.is_empty() {
            return Ok(());
        }
        let fields = self.fields.ok_or_else(|| {
            CsvError::BindError(format!(
                "no columns defined and record type '{}' does not expose fields",
                self.record_type
            ))
        })?;
        for field in fields {
            self.push_column((*field).to_string(), None, None)?;
        }
        Ok(())
    }

    /// Opens a reader over a byte stream, decoded with the format's charset.
    pub fn reader<R: io::Read>(self, source: R) -> CsvReader<T, R>
    where
        T: DeserializeOwned,
    {
        CsvReader::new(self, source)
    }

    /// Opens a reader over an in-memory string. The format's charset is
    /// ignored, the input is already decoded.
    pub fn reader_from_str(mut self, source: &str) -> CsvReader<T, io::Cursor<Vec<u8>>>
    where
        T: DeserializeOwned,
    {
        self.format = self.format.clone().with_charset(encoding_rs::UTF_8);
        CsvReader::new(self, io::Cursor::new(source.as_bytes().to_vec()))
    }

    /// Opens a writer over a byte sink, encoded with the format's charset.
    pub fn writer<W: io::Write>(self, sink: W) -> CsvWriter<T, W>
    where
        T: Serialize,
    {
        CsvWriter::new(self, sink)
    }
}

fn parse_char_attr<E>(value: &str) -> Result<char, CsvError>
where
    E: std::str::FromStr<Err = CsvError> + Into<char>,
{
    let mut chars = value.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return Ok(ch);
    }
    value.parse::<E>().map(Into::into)
}

fn bool_attr(config: &Config, name: &str) -> Result<Option<bool>, CsvError> {
    match config.attribute(name) {
        None => Ok(None),
        Some(value) => value.parse::<bool>().map(Some).map_err(|_| {
            CsvError::ConfigError(ConfigError::InvalidProperty {
                name: name.to_string(),
                value: value.to_string(),
                reason: "expected true or false".to_string(),
            })
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use crate::value::UppercaseValueFormat;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Person {
        name: String,
        postal_address: Option<String>,
    }

    #[test]
    fn test_explicit_columns() {
        let descriptor = CsvDescriptor::<Person>::new()
            .with_columns(["name", "postal_address"])
            .unwrap();
        let names: Vec<&str> = descriptor
            .columns()
            .iter()
            .map(CsvColumn::field_name)
            .collect();
        assert_eq!(names, vec!["name", "postal_address"]);
    }

    #[test]
    fn test_strict_descriptor_rejects_unknown_field() {
        let descriptor =
            CsvDescriptor::<Person>::with_format(CsvFormat::new().with_strict(true));
        let result = descriptor.with_columns(["nonexistent_field"]);
        assert!(matches!(
            result,
            Err(CsvError::UnknownField { field, .. }) if field == "nonexistent_field"
        ));
    }

    #[test]
    fn test_relaxed_descriptor_keeps_unknown_field() {
        let descriptor = CsvDescriptor::<Person>::new()
            .with_columns(["nonexistent_field"])
            .unwrap();
        assert_eq!(descriptor.columns().len(), 1);
    }

    #[test]
    fn test_type_columns_follow_declaration_order() {
        let descriptor = CsvDescriptor::<Person>::new().with_type_columns().unwrap();
        let names: Vec<&str> = descriptor
            .columns()
            .iter()
            .map(CsvColumn::field_name)
            .collect();
        assert_eq!(names, vec!["name", "postal_address"]);
    }

    #[test]
    fn test_header_load_converts_naming() {
        let mut descriptor = CsvDescriptor::<Person>::new();
        descriptor
            .load(&["NAME".to_string(), "POSTAL_ADDRESS".to_string()])
            .unwrap();
        let names: Vec<&str> = descriptor
            .columns()
            .iter()
            .map(CsvColumn::field_name)
            .collect();
        assert_eq!(names, vec!["name", "postal_address"]);
        assert_eq!(descriptor.columns()[1].title(), "POSTAL_ADDRESS");
    }

    #[test]
    fn test_header_load_replaces_previous_columns() {
        let mut descriptor = CsvDescriptor::<Person>::new()
            .with_columns(["name"])
            .unwrap();
        descriptor.load(&["NAME", "POSTAL_ADDRESS"]).unwrap();
        descriptor.load(&["NAME", "POSTAL_ADDRESS"]).unwrap();
        assert_eq!(descriptor.columns().len(), 2);
    }

    #[test]
    fn test_header_load_retains_formatters() {
        let mut descriptor = CsvDescriptor::<Person>::new()
            .with_column_format("name", UppercaseValueFormat)
            .unwrap();
        descriptor.load(&["NAME", "POSTAL_ADDRESS"]).unwrap();
        assert!(descriptor.columns()[0].formatter().is_some());
        assert!(descriptor.columns()[1].formatter().is_none());
    }

    #[test]
    fn test_strict_header_load_rejects_unknown_title() {
        let mut descriptor =
            CsvDescriptor::<Person>::with_format(CsvFormat::new().with_strict(true));
        let result = descriptor.load(&["NAME", "SHOE_SIZE"]);
        assert!(matches!(result, Err(CsvError::UnknownField { .. })));
    }

    #[test]
    fn test_from_config() {
        let config = Config::from_xml(
            r#"<csv delimiter="tab" null-value="NIL" header="true" strict="true">
                <value name="Name" property="name" />
                <value name="Address" property="postal_address" />
            </csv>"#,
        )
        .unwrap();
        let descriptor = CsvDescriptor::<Person>::from_config(&config).unwrap();
        assert_eq!(descriptor.format().delimiter(), '\t');
        assert_eq!(descriptor.format().null_value(), "NIL");
        assert!(descriptor.format().header());
        assert!(descriptor.format().strict());
        assert_eq!(descriptor.columns().len(), 2);
        assert_eq!(descriptor.columns()[0].field_name(), "name");
        assert_eq!(descriptor.columns()[0].title(), "Name");
    }

    #[test]
    fn test_from_config_rejects_unknown_strict_column() {
        let config = Config::from_xml(
            r#"<csv strict="true"><value property="shoe_size" /></csv>"#,
        )
        .unwrap();
        assert!(matches!(
            CsvDescriptor::<Person>::from_config(&config),
            Err(CsvError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_from_config_rejects_missing_property_attribute() {
        let config = Config::from_xml(r#"<csv><value name="Name" /></csv>"#).unwrap();
        assert!(matches!(
            CsvDescriptor::<Person>::from_config(&config),
            Err(CsvError::ConfigError(ConfigError::MissingProperty(_)))
        ));
    }

    #[test]
    fn test_from_config_rejects_bad_flag() {
        let config = Config::from_xml(r#"<csv header="yes-please" />"#).unwrap();
        assert!(matches!(
            CsvDescriptor::<Person>::from_config(&config),
            Err(CsvError::ConfigError(ConfigError::InvalidProperty { .. }))
        ));
    }

    #[test]
    fn test_quote_pair_attribute() {
        let config = Config::from_xml(r#"<csv quote="[]" />"#).unwrap();
        let descriptor = CsvDescriptor::<Person>::from_config(&config).unwrap();
        assert_eq!(descriptor.format().open_quote(), Some('['));
        assert_eq!(descriptor.format().close_quote(), Some(']'));
    }
}
