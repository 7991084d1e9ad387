//! Per-column value formatters.

use std::fmt::{self, Write as _};

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::CsvError;

/// Converts between a record field's text representation and its CSV cell.
///
/// Formatters run on the stream side of the binding: [`format`] turns the
/// serialized field value into the cell written out, [`parse`] turns the raw
/// cell into the value handed to deserialization. Null sentinels are handled
/// before formatters, so implementations never see them.
///
/// [`format`]: ValueFormat::format
/// [`parse`]: ValueFormat::parse
pub trait ValueFormat: Send + Sync {
    fn format(&self, value: &str) -> String;

    fn parse(&self, value: &str) -> Result<String, CsvError>;
}

const ISO_DATETIME_IN: &str = "%Y-%m-%dT%H:%M:%S%.f";
const ISO_DATETIME_OUT: &str = "%Y-%m-%dT%H:%M:%S";
const ISO_DATE: &str = "%Y-%m-%d";

/// Date formatter bridging ISO-8601 field values and a strftime cell pattern.
///
/// Record fields hold ISO-8601 text (`2024-05-17` or `2024-05-17T09:30:00`);
/// the cell uses the configured pattern, e.g. `%d.%m.%Y`. Values that do not
/// look like ISO dates are passed through unchanged on write.
pub struct DateValueFormat {
    pattern: String,
}

impl DateValueFormat {
    pub fn new(pattern: impl Into<String>) -> Self {
        DateValueFormat {
            pattern: pattern.into(),
        }
    }

    fn render(&self, formatted: impl fmt::Display, fallback: &str) -> String {
        let mut out = String::new();
        if write!(out, "{formatted}").is_ok() {
            out
        } else {
            log::warn!(
                "invalid date pattern '{}', writing value '{fallback}' unchanged",
                self.pattern
            );
            fallback.to_string()
        }
    }
}

impl ValueFormat for DateValueFormat {
    fn format(&self, value: &str) -> String {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, ISO_DATETIME_IN) {
            return self.render(datetime.format(&self.pattern), value);
        }
        if let Ok(date) = NaiveDate::parse_from_str(value, ISO_DATE) {
            return self.render(date.format(&self.pattern), value);
        }
        log::warn!("value '{value}' is not an ISO-8601 date, writing it unchanged");
        value.to_string()
    }

    fn parse(&self, value: &str) -> Result<String, CsvError> {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, &self.pattern) {
            return Ok(datetime.format(ISO_DATETIME_OUT).to_string());
        }
        match NaiveDate::parse_from_str(value, &self.pattern) {
            Ok(date) => Ok(date.format(ISO_DATE).to_string()),
            Err(err) => Err(CsvError::BindError(format!(
                "cannot parse date '{value}' with pattern '{}': {err}",
                self.pattern
            ))),
        }
    }
}

/// Uppercases cells on write and passes them through on read.
pub struct UppercaseValueFormat;

impl ValueFormat for UppercaseValueFormat {
    fn format(&self, value: &str) -> String {
        value.to_uppercase()
    }

    fn parse(&self, value: &str) -> Result<String, CsvError> {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_format_and_parse_round_trip() {
        let format = DateValueFormat::new("%d.%m.%Y");
        assert_eq!(format.format("2024-05-17"), "17.05.2024");
        assert_eq!(format.parse("17.05.2024").unwrap(), "2024-05-17");
    }

    #[test]
    fn test_datetime_pattern() {
        let format = DateValueFormat::new("%d/%m/%Y %H:%M:%S");
        assert_eq!(
            format.format("2024-05-17T09:30:00"),
            "17/05/2024 09:30:00"
        );
        assert_eq!(
            format.parse("17/05/2024 09:30:00").unwrap(),
            "2024-05-17T09:30:00"
        );
    }

    #[test]
    fn test_non_iso_value_passes_through_on_write() {
        let format = DateValueFormat::new("%d.%m.%Y");
        assert_eq!(format.format("yesterday"), "yesterday");
    }

    #[test]
    fn test_unparseable_cell_is_an_error() {
        let format = DateValueFormat::new("%d.%m.%Y");
        assert!(format.parse("17/05/2024").is_err());
    }

    #[test]
    fn test_uppercase_format() {
        let format = UppercaseValueFormat;
        assert_eq!(format.format("warszawa"), "WARSZAWA");
        assert_eq!(format.parse("WARSZAWA").unwrap(), "WARSZAWA");
    }
}
