//! Streaming record writer: binding, quoting and charset encoding.

use std::io;

use serde::Serialize;

use crate::descriptor::CsvDescriptor;
use crate::error::CsvError;
use crate::ser;

/// Writes typed records as CSV lines, CRLF terminated.
///
/// The first record (or header row) triggers column resolution, so a
/// descriptor without explicit columns derives them from the record type.
/// Values are quoted only when required: embedded delimiters, newlines,
/// quote or escape characters, a leading comment character, padding that
/// trimming would eat, or a value spelled like the null sentinel.
pub struct CsvWriter<T, W> {
    descriptor: CsvDescriptor<T>,
    sink: W,
    prepared: bool,
}

impl<T: Serialize, W: io::Write> CsvWriter<T, W> {
    pub fn new(descriptor: CsvDescriptor<T>, sink: W) -> Self {
        CsvWriter {
            descriptor,
            sink,
            prepared: false,
        }
    }

    pub fn descriptor(&self) -> &CsvDescriptor<T> {
        &self.descriptor
    }

    pub fn write(&mut self, record: &T) -> Result<(), CsvError> {
        self.prepare()?;
        let cells = ser::to_cells(record)?;
        let mut rendered: Vec<Option<String>> = Vec::with_capacity(self.descriptor.columns().len());
        {
            let format = self.descriptor.format();
            for column in self.descriptor.columns() {
                let cell = cells.iter().find(|(name, _)| name == column.field_name());
                let value = match cell {
                    None => {
                        if format.strict() {
                            return Err(CsvError::UnknownField {
                                field: column.field_name().to_string(),
                                record: self.descriptor.record_type(),
                            });
                        }
                        log::warn!(
                            "Record type '{}' has no value for column '{}', writing null",
                            self.descriptor.record_type(),
                            column.field_name()
                        );
                        None
                    }
                    Some((_, None)) => None,
                    Some((_, Some(value))) => Some(match column.formatter() {
                        Some(formatter) => formatter.format(value),
                        None => value.clone(),
                    }),
                };
                rendered.push(value);
            }
        }
        let mut line = String::new();
        for (index, value) in rendered.iter().enumerate() {
            if index > 0 {
                line.push(self.descriptor.format().delimiter());
            }
            match value {
                // The sentinel is written bare so it reads back as a null.
                None => line.push_str(self.descriptor.format().null_value()),
                Some(value) => self.encode_cell(value, &mut line)?,
            }
        }
        line.push_str("\r\n");
        self.write_line(&line)
    }

    pub fn flush(&mut self) -> Result<(), CsvError> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn prepare(&mut self) -> Result<(), CsvError> {
        if self.prepared {
            return Ok(());
        }
        self.prepared = true;
        self.descriptor.ensure_columns()?;
        if self.descriptor.format().header() {
            let mut line = String::new();
            for (index, column) in self.descriptor.columns().iter().enumerate() {
                if index > 0 {
                    line.push(self.descriptor.format().delimiter());
                }
                self.encode_cell(column.title(), &mut line)?;
            }
            line.push_str("\r\n");
            self.write_line(&line)?;
        }
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), CsvError> {
        let charset = self.descriptor.format().charset();
        let (bytes, _, unmappable) = charset.encode(line);
        if unmappable {
            log::warn!(
                "Some characters are not representable in {} and were replaced",
                charset.name()
            );
        }
        self.sink.write_all(&bytes)?;
        Ok(())
    }

    fn needs_quoting(&self, value: &str) -> bool {
        let format = self.descriptor.format();
        value.contains(format.delimiter())
            || value.contains('\n')
            || value.contains('\r')
            || format.open_quote().is_some_and(|q| value.contains(q))
            || format.close_quote().is_some_and(|q| value.contains(q))
            || format.escape().is_some_and(|e| value.contains(e))
            || format.comment().is_some_and(|c| value.starts_with(c))
            || format.is_null_value(value)
            || (format.trim()
                && (value.starts_with(' ')
                    || value.starts_with('\t')
                    || value.ends_with(' ')
                    || value.ends_with('\t')))
    }

    fn encode_cell(&self, value: &str, out: &mut String) -> Result<(), CsvError> {
        let format = self.descriptor.format();
        if !self.needs_quoting(value) {
            out.push_str(value);
            return Ok(());
        }
        if format.open_quote().is_some() {
            self.push_quoted(value, out)
        } else if value.contains(format.delimiter())
            || value.contains('\n')
            || value.contains('\r')
            || format.escape().is_some_and(|e| value.contains(e))
        {
            self.push_escaped(value, out)
        } else if format.strict() {
            Err(CsvError::InvalidArgument(format!(
                "Value '{}' cannot be written unambiguously without quotes",
                value
            )))
        } else {
            log::warn!(
                "Value '{}' is written bare and will not read back identically",
                value
            );
            out.push_str(value);
            Ok(())
        }
    }

    fn push_quoted(&self, value: &str, out: &mut String) -> Result<(), CsvError> {
        let format = self.descriptor.format();
        let open = format.open_quote().unwrap_or('"');
        let close = format.close_quote().unwrap_or('"');
        let escape = format.escape();
        out.push(open);
        for ch in value.chars() {
            if ch == close || Some(ch) == escape {
                if let Some(escape) = escape {
                    out.push(escape);
                } else if open == close && ch == close {
                    out.push(close);
                } else {
                    return Err(CsvError::InvalidArgument(format!(
                        "Value contains the quote character '{}' and no escape is configured",
                        ch
                    )));
                }
            }
            out.push(ch);
        }
        out.push(close);
        Ok(())
    }

    fn push_escaped(&self, value: &str, out: &mut String) -> Result<(), CsvError> {
        let format = self.descriptor.format();
        let delimiter = format.delimiter();
        let escape = format.escape().ok_or_else(|| {
            CsvError::InvalidArgument(format!(
                "Value '{}' needs quoting but the format defines no quote or escape",
                value
            ))
        })?;
        for ch in value.chars() {
            if ch == delimiter || ch == escape || ch == '\n' || ch == '\r' {
                out.push(escape);
            }
            out.push(ch);
        }
        Ok(())
    }
}
