//! CSV dialect description.
//!
//! [`CsvFormat`] captures everything about the concrete syntax of a stream:
//! delimiter, quoting, escaping, comment lines, header presence, value
//! trimming, the null-value sentinel, charset and the error handling mode.
//! Setters are fluent and validate eagerly, so a format that was accepted is
//! safe to hand to readers and writers.

use std::str::FromStr;

use encoding_rs::Encoding;

use crate::error::CsvError;

/// Common delimiter characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvDelimiter {
    Comma,
    Tab,
    Space,
    Dot,
    Colon,
    Semicolon,
}

impl From<CsvDelimiter> for char {
    fn from(delimiter: CsvDelimiter) -> char {
        match delimiter {
            CsvDelimiter::Comma => ',',
            CsvDelimiter::Tab => '\t',
            CsvDelimiter::Space => ' ',
            CsvDelimiter::Dot => '.',
            CsvDelimiter::Colon => ':',
            CsvDelimiter::Semicolon => ';',
        }
    }
}

impl FromStr for CsvDelimiter {
    type Err = CsvError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "comma" => Ok(CsvDelimiter::Comma),
            "tab" => Ok(CsvDelimiter::Tab),
            "space" => Ok(CsvDelimiter::Space),
            "dot" => Ok(CsvDelimiter::Dot),
            "colon" => Ok(CsvDelimiter::Colon),
            "semicolon" => Ok(CsvDelimiter::Semicolon),
            other => Err(CsvError::InvalidArgument(format!(
                "unknown delimiter name '{other}'"
            ))),
        }
    }
}

/// Common comment-line markers. `None` disables comment handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvComment {
    None,
    Pound,
    Slash,
    Backslash,
    Asterisk,
    Question,
    Exclamation,
    Colon,
    Semicolon,
}

impl From<CsvComment> for char {
    fn from(comment: CsvComment) -> char {
        match comment {
            CsvComment::None => '\0',
            CsvComment::Pound => '#',
            CsvComment::Slash => '/',
            CsvComment::Backslash => '\\',
            CsvComment::Asterisk => '*',
            CsvComment::Question => '?',
            CsvComment::Exclamation => '!',
            CsvComment::Colon => ':',
            CsvComment::Semicolon => ';',
        }
    }
}

impl FromStr for CsvComment {
    type Err = CsvError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Ok(CsvComment::None),
            "pound" => Ok(CsvComment::Pound),
            "slash" => Ok(CsvComment::Slash),
            "backslash" => Ok(CsvComment::Backslash),
            "asterisk" => Ok(CsvComment::Asterisk),
            "question" => Ok(CsvComment::Question),
            "exclamation" => Ok(CsvComment::Exclamation),
            "colon" => Ok(CsvComment::Colon),
            "semicolon" => Ok(CsvComment::Semicolon),
            other => Err(CsvError::InvalidArgument(format!(
                "unknown comment name '{other}'"
            ))),
        }
    }
}

/// Common quote pairs. Brackets use distinct open and close characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvQuote {
    None,
    DoubleQuotation,
    SingleQuotation,
    Pipe,
    RoundBrackets,
    CurlyBrackets,
    SquareBrackets,
    AngleBrackets,
}

impl FromStr for CsvQuote {
    type Err = CsvError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Ok(CsvQuote::None),
            "double-quotation" => Ok(CsvQuote::DoubleQuotation),
            "single-quotation" => Ok(CsvQuote::SingleQuotation),
            "pipe" => Ok(CsvQuote::Pipe),
            "round-brackets" => Ok(CsvQuote::RoundBrackets),
            "curly-brackets" => Ok(CsvQuote::CurlyBrackets),
            "square-brackets" => Ok(CsvQuote::SquareBrackets),
            "angle-brackets" => Ok(CsvQuote::AngleBrackets),
            other => Err(CsvError::InvalidArgument(format!(
                "unknown quote name '{other}'"
            ))),
        }
    }
}

/// An open/close quote character pair.
///
/// Converts from a single `char` (same character on both ends), a
/// `(open, close)` tuple or a [`CsvQuote`] constant. The NUL character
/// disables quoting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotePair {
    pub open: char,
    pub close: char,
}

impl From<char> for QuotePair {
    fn from(quote: char) -> Self {
        QuotePair {
            open: quote,
            close: quote,
        }
    }
}

impl From<(char, char)> for QuotePair {
    fn from((open, close): (char, char)) -> Self {
        QuotePair { open, close }
    }
}

impl From<CsvQuote> for QuotePair {
    fn from(quote: CsvQuote) -> Self {
        let (open, close) = match quote {
            CsvQuote::None => ('\0', '\0'),
            CsvQuote::DoubleQuotation => ('"', '"'),
            CsvQuote::SingleQuotation => ('\'', '\''),
            CsvQuote::Pipe => ('|', '|'),
            CsvQuote::RoundBrackets => ('(', ')'),
            CsvQuote::CurlyBrackets => ('{', '}'),
            CsvQuote::SquareBrackets => ('[', ']'),
            CsvQuote::AngleBrackets => ('<', '>'),
        };
        QuotePair { open, close }
    }
}

/// Common escape characters. `None` disables escaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvEscape {
    None,
    DoubleQuotation,
    SingleQuotation,
    Pipe,
    Slash,
    Backslash,
}

impl From<CsvEscape> for char {
    fn from(escape: CsvEscape) -> char {
        match escape {
            CsvEscape::None => '\0',
            CsvEscape::DoubleQuotation => '"',
            CsvEscape::SingleQuotation => '\'',
            CsvEscape::Pipe => '|',
            CsvEscape::Slash => '/',
            CsvEscape::Backslash => '\\',
        }
    }
}

impl FromStr for CsvEscape {
    type Err = CsvError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Ok(CsvEscape::None),
            "double-quotation" => Ok(CsvEscape::DoubleQuotation),
            "single-quotation" => Ok(CsvEscape::SingleQuotation),
            "pipe" => Ok(CsvEscape::Pipe),
            "slash" => Ok(CsvEscape::Slash),
            "backslash" => Ok(CsvEscape::Backslash),
            other => Err(CsvError::InvalidArgument(format!(
                "unknown escape name '{other}'"
            ))),
        }
    }
}

/// Description of a CSV dialect.
///
/// Defaults follow the common comma-separated form: comma delimiter, `#`
/// comments, double quotation for both quote ends and escape (so quotes are
/// escaped by doubling), no header, empty lines skipped, values trimmed,
/// `NULL` sentinel, UTF-8 charset, relaxed error handling.
#[derive(Debug, Clone)]
pub struct CsvFormat {
    delimiter: char,
    comment: Option<char>,
    quote: Option<(char, char)>,
    escape: Option<char>,
    header: bool,
    empty_lines: bool,
    trim: bool,
    strict: bool,
    null_value: String,
    charset: &'static Encoding,
}

impl Default for CsvFormat {
    fn default() -> Self {
        CsvFormat {
            delimiter: ',',
            comment: Some('#'),
            quote: Some(('"', '"')),
            escape: Some('"'),
            header: false,
            empty_lines: false,
            trim: true,
            strict: false,
            null_value: "NULL".to_string(),
            charset: encoding_rs::UTF_8,
        }
    }
}

impl CsvFormat {
    pub fn new() -> Self {
        CsvFormat::default()
    }

    /// Sets the value delimiter. The NUL character is rejected, as is any
    /// character already used by the active comment, quote or escape setting.
    pub fn with_delimiter(mut self, delimiter: impl Into<char>) -> Result<Self, CsvError> {
        let delimiter = delimiter.into();
        if delimiter == '\0' {
            return Err(CsvError::InvalidArgument(
                "delimiter cannot be the NUL character".to_string(),
            ));
        }
        self.delimiter = delimiter;
        self.validate()?;
        Ok(self)
    }

    /// Sets the comment-line marker. NUL disables comment handling.
    pub fn with_comment(mut self, comment: impl Into<char>) -> Result<Self, CsvError> {
        let comment = comment.into();
        self.comment = (comment != '\0').then_some(comment);
        self.validate()?;
        Ok(self)
    }

    /// Sets the quote pair. A lone NUL disables quoting; a pair with exactly
    /// one NUL end is rejected.
    pub fn with_quote(mut self, quote: impl Into<QuotePair>) -> Result<Self, CsvError> {
        let QuotePair { open, close } = quote.into();
        self.quote = match (open == '\0', close == '\0') {
            (true, true) => None,
            (false, false) => Some((open, close)),
            _ => {
                return Err(CsvError::InvalidArgument(
                    "open and close quotes must both be set or both disabled".to_string(),
                ))
            }
        };
        self.validate()?;
        Ok(self)
    }

    /// Sets the escape character used inside quoted values. NUL disables
    /// escaping, which makes the close quote impossible to embed.
    pub fn with_escape(mut self, escape: impl Into<char>) -> Result<Self, CsvError> {
        let escape = escape.into();
        self.escape = (escape != '\0').then_some(escape);
        self.validate()?;
        Ok(self)
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn with_empty_lines(mut self, empty_lines: bool) -> Self {
        self.empty_lines = empty_lines;
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_null_value(mut self, null_value: impl Into<String>) -> Self {
        self.null_value = null_value.into();
        self
    }

    pub fn with_charset(mut self, charset: &'static Encoding) -> Self {
        self.charset = charset;
        self
    }

    /// Sets the charset from a WHATWG label such as `utf-8` or `iso-8859-2`.
    pub fn with_charset_name(mut self, label: &str) -> Result<Self, CsvError> {
        self.charset = Encoding::for_label(label.as_bytes()).ok_or_else(|| {
            CsvError::InvalidArgument(format!("unknown charset label '{label}'"))
        })?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), CsvError> {
        let collision = |what: &str| {
            Err(CsvError::InvalidArgument(format!(
                "delimiter '{}' collides with the {what} character",
                self.delimiter.escape_debug()
            )))
        };
        if self.comment == Some(self.delimiter) {
            return collision("comment");
        }
        if let Some((open, close)) = self.quote {
            if open == self.delimiter || close == self.delimiter {
                return collision("quote");
            }
        }
        if self.escape == Some(self.delimiter) {
            return collision("escape");
        }
        Ok(())
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn comment(&self) -> Option<char> {
        self.comment
    }

    pub fn open_quote(&self) -> Option<char> {
        self.quote.map(|(open, _)| open)
    }

    pub fn close_quote(&self) -> Option<char> {
        self.quote.map(|(_, close)| close)
    }

    pub fn escape(&self) -> Option<char> {
        self.escape
    }

    pub fn header(&self) -> bool {
        self.header
    }

    pub fn empty_lines(&self) -> bool {
        self.empty_lines
    }

    pub fn trim(&self) -> bool {
        self.trim
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn null_value(&self) -> &str {
        &self.null_value
    }

    pub fn charset(&self) -> &'static Encoding {
        self.charset
    }

    /// True when `value` equals the null sentinel, ignoring ASCII case.
    pub(crate) fn is_null_value(&self, value: &str) -> bool {
        value.eq_ignore_ascii_case(&self.null_value)
    }
}
