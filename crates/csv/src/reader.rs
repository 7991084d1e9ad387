//! Streaming record reader: charset decoding, tokenizing and binding.

use std::collections::VecDeque;
use std::io;

use encoding_rs::{CoderResult, Decoder};
use serde::de::DeserializeOwned;

use crate::de::RecordDeserializer;
use crate::descriptor::CsvDescriptor;
use crate::error::CsvError;

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Incremental charset decoder over a raw byte source.
struct CharStream<R> {
    source: R,
    decoder: Decoder,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    pending: VecDeque<char>,
    eof: bool,
    finished: bool,
}

impl<R: io::Read> CharStream<R> {
    fn new(source: R, encoding: &'static encoding_rs::Encoding) -> Self {
        CharStream {
            source,
            decoder: encoding.new_decoder(),
            buf: vec![0; READ_BUFFER_SIZE],
            start: 0,
            end: 0,
            pending: VecDeque::new(),
            eof: false,
            finished: false,
        }
    }

    fn next_char(&mut self) -> Result<Option<char>, CsvError> {
        loop {
            if let Some(ch) = self.pending.pop_front() {
                return Ok(Some(ch));
            }
            if self.finished {
                return Ok(None);
            }
            self.fill()?;
        }
    }

    fn fill(&mut self) -> Result<(), CsvError> {
        if self.start == self.end && !self.eof {
            let n = self.source.read(&mut self.buf)?;
            self.start = 0;
            self.end = n;
            if n == 0 {
                self.eof = true;
            }
        }
        let last = self.eof && self.start == self.end;
        // Reserving what the decoder asks for guarantees forward progress.
        let capacity = self
            .decoder
            .max_utf8_buffer_length(self.end - self.start)
            .unwrap_or(READ_BUFFER_SIZE)
            .max(4);
        let mut out = String::with_capacity(capacity);
        let (result, read, _) =
            self.decoder
                .decode_to_string(&self.buf[self.start..self.end], &mut out, last);
        self.start += read;
        self.pending.extend(out.chars());
        if last && result == CoderResult::InputEmpty {
            self.finished = true;
        }
        Ok(())
    }
}

struct RawCell {
    text: String,
    quoted: bool,
}

/// Splits the char stream into records of raw cells.
///
/// Tracks the current 1-based line so parse errors can point at their
/// source. Records are terminated by LF, CRLF or a lone CR; newlines inside
/// quoted cells are content.
struct RecordTokenizer<R> {
    chars: CharStream<R>,
    format: crate::format::CsvFormat,
    line: u64,
    peeked: Option<char>,
}

impl<R: io::Read> RecordTokenizer<R> {
    fn new(source: R, format: crate::format::CsvFormat) -> Self {
        let chars = CharStream::new(source, format.charset());
        RecordTokenizer {
            chars,
            format,
            line: 1,
            peeked: None,
        }
    }

    fn next_char(&mut self) -> Result<Option<char>, CsvError> {
        let ch = match self.peeked.take() {
            Some(ch) => Some(ch),
            None => self.chars.next_char()?,
        };
        if ch == Some('\n') {
            self.line += 1;
        }
        Ok(ch)
    }

    fn peek_char(&mut self) -> Result<Option<char>, CsvError> {
        if self.peeked.is_none() {
            self.peeked = self.chars.next_char()?;
        }
        Ok(self.peeked)
    }

    fn consume_newline(&mut self) -> Result<(), CsvError> {
        if let Some(ch) = self.next_char()? {
            if ch == '\r' {
                if self.peek_char()? == Some('\n') {
                    self.next_char()?;
                } else {
                    self.line += 1;
                }
            }
        }
        Ok(())
    }

    fn skip_line(&mut self) -> Result<(), CsvError> {
        loop {
            match self.peek_char()? {
                None => return Ok(()),
                Some('\n') | Some('\r') => return self.consume_newline(),
                Some(_) => {
                    self.next_char()?;
                }
            }
        }
    }

    /// Reads the next record, returning the line it started on and its cells.
    fn read_record(&mut self) -> Result<Option<(u64, Vec<RawCell>)>, CsvError> {
        loop {
            match self.peek_char()? {
                None => return Ok(None),
                Some(ch) if Some(ch) == self.format.comment() => self.skip_line()?,
                Some('\n') | Some('\r') => {
                    let start = self.line;
                    self.consume_newline()?;
                    if self.format.empty_lines() {
                        return Ok(Some((
                            start,
                            vec![RawCell {
                                text: String::new(),
                                quoted: false,
                            }],
                        )));
                    }
                }
                Some(_) => return self.read_cells().map(Some),
            }
        }
    }

    fn read_cells(&mut self) -> Result<(u64, Vec<RawCell>), CsvError> {
        let start_line = self.line;
        let mut cells = Vec::new();
        loop {
            cells.push(self.read_cell(start_line)?);
            if self.format.trim() {
                self.skip_cell_whitespace()?;
            }
            match self.peek_char()? {
                Some(ch) if ch == self.format.delimiter() => {
                    self.next_char()?;
                }
                Some('\n') | Some('\r') => {
                    self.consume_newline()?;
                    return Ok((start_line, cells));
                }
                None => return Ok((start_line, cells)),
                Some(other) => {
                    return Err(CsvError::Malformed {
                        line: self.line,
                        message: format!("Unexpected character '{}' after quoted value", other),
                    })
                }
            }
        }
    }

    fn read_cell(&mut self, record_line: u64) -> Result<RawCell, CsvError> {
        if self.format.trim() {
            self.skip_cell_whitespace()?;
        }
        if let Some(open) = self.format.open_quote() {
            if self.peek_char()? == Some(open) {
                self.next_char()?;
                return self.read_quoted_cell(record_line);
            }
        }
        let mut text = String::new();
        loop {
            match self.peek_char()? {
                None | Some('\n') | Some('\r') => break,
                Some(ch) if ch == self.format.delimiter() => break,
                Some(ch) if Some(ch) == self.format.escape() => {
                    self.next_char()?;
                    match self.next_char()? {
                        Some(escaped) => text.push(escaped),
                        None if self.format.strict() => {
                            return Err(CsvError::Malformed {
                                line: self.line,
                                message: String::from("Dangling escape at end of input"),
                            })
                        }
                        None => {
                            log::warn!(
                                "Line {}: dangling escape at end of input, kept as a literal",
                                self.line
                            );
                            text.push(ch);
                        }
                    }
                }
                Some(ch) => {
                    self.next_char()?;
                    text.push(ch);
                }
            }
        }
        if self.format.trim() {
            let end = text.trim_end_matches(|c| self.is_trim_char(c)).len();
            text.truncate(end);
        }
        Ok(RawCell {
            text,
            quoted: false,
        })
    }

    fn read_quoted_cell(&mut self, record_line: u64) -> Result<RawCell, CsvError> {
        let open = self.format.open_quote().unwrap_or('"');
        let close = self.format.close_quote().unwrap_or('"');
        let escape = self.format.escape();
        let escape_is_quote = escape == Some(close) || escape == Some(open);
        let mut text = String::new();
        loop {
            let Some(ch) = self.next_char()? else {
                if self.format.strict() {
                    return Err(CsvError::Malformed {
                        line: record_line,
                        message: String::from("Unterminated quoted value"),
                    });
                }
                log::warn!(
                    "Line {}: unterminated quoted value, keeping it as read",
                    record_line
                );
                break;
            };
            if Some(ch) == escape {
                if escape_is_quote {
                    // The escape char doubles as a quote: only a repeat is an
                    // escape, anything else means the cell just closed.
                    if self.peek_char()? == Some(ch) {
                        self.next_char()?;
                        text.push(ch);
                    } else if ch == close {
                        break;
                    } else {
                        text.push(ch);
                    }
                } else {
                    match self.next_char()? {
                        Some(next) => text.push(next),
                        None if self.format.strict() => {
                            return Err(CsvError::Malformed {
                                line: self.line,
                                message: String::from("Dangling escape at end of input"),
                            })
                        }
                        None => {
                            log::warn!(
                                "Line {}: dangling escape at end of input, kept as a literal",
                                self.line
                            );
                            text.push(ch);
                        }
                    }
                }
            } else if ch == close {
                if open == close && self.peek_char()? == Some(close) {
                    self.next_char()?;
                    text.push(close);
                } else {
                    break;
                }
            } else {
                text.push(ch);
            }
        }
        Ok(RawCell { text, quoted: true })
    }

    fn is_trim_char(&self, ch: char) -> bool {
        (ch == ' ' || ch == '\t') && ch != self.format.delimiter()
    }

    fn skip_cell_whitespace(&mut self) -> Result<(), CsvError> {
        while let Some(ch) = self.peek_char()? {
            if self.is_trim_char(ch) {
                self.next_char()?;
            } else {
                break;
            }
        }
        Ok(())
    }
}

/// Iterator over typed records parsed from a CSV byte stream.
///
/// I/O failures and, in strict mode, lexical errors end the iteration;
/// binding errors are yielded per record and reading continues with the
/// next line.
pub struct CsvReader<T, R> {
    descriptor: CsvDescriptor<T>,
    tokenizer: RecordTokenizer<R>,
    prepared: bool,
    done: bool,
}

impl<T: DeserializeOwned, R: io::Read> CsvReader<T, R> {
    pub fn new(descriptor: CsvDescriptor<T>, source: R) -> Self {
        let tokenizer = RecordTokenizer::new(source, descriptor.format().clone());
        CsvReader {
            descriptor,
            tokenizer,
            prepared: false,
            done: false,
        }
    }

    /// The descriptor, with any columns loaded from the header row.
    pub fn descriptor(&self) -> &CsvDescriptor<T> {
        &self.descriptor
    }

    fn prepare(&mut self) -> Result<(), CsvError> {
        if self.prepared {
            return Ok(());
        }
        self.prepared = true;
        if self.descriptor.format().header() {
            // A blank line is a record when empty lines are enabled, never
            // a header.
            loop {
                match self.tokenizer.read_record()? {
                    None => break,
                    Some((_, cells))
                        if cells.len() == 1 && !cells[0].quoted && cells[0].text.is_empty() => {}
                    Some((_, cells)) => {
                        let titles: Vec<String> =
                            cells.into_iter().map(|cell| cell.text).collect();
                        self.descriptor.load(&titles)?;
                        break;
                    }
                }
            }
        } else {
            self.descriptor.ensure_columns()?;
        }
        Ok(())
    }

    fn bind(&self, line: u64, cells: Vec<RawCell>) -> Result<T, CsvError> {
        let format = self.descriptor.format();
        let columns = self.descriptor.columns();
        if cells.len() != columns.len() {
            if format.strict() {
                return Err(CsvError::Malformed {
                    line,
                    message: format!(
                        "Expected {} values, found {}",
                        columns.len(),
                        cells.len()
                    ),
                });
            }
            log::warn!(
                "Line {}: expected {} values, found {}, missing values are left empty",
                line,
                columns.len(),
                cells.len()
            );
        }
        let mut bound: Vec<(String, Option<String>)> = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let value = match cells.get(index) {
                None => None,
                // A quoted sentinel is the literal string, not a null.
                Some(cell) if !cell.quoted && format.is_null_value(&cell.text) => None,
                Some(cell) => match column.formatter() {
                    Some(formatter) => match formatter.parse(&cell.text) {
                        Ok(text) => Some(text),
                        Err(err) if format.strict() => {
                            return Err(CsvError::Malformed {
                                line,
                                message: err.to_string(),
                            })
                        }
                        Err(err) => {
                            log::warn!("Line {}: {}, using the raw value", line, err);
                            Some(cell.text.clone())
                        }
                    },
                    None => Some(cell.text.clone()),
                },
            };
            bound.push((column.field_name().to_string(), value));
        }
        T::deserialize(RecordDeserializer::new(bound, format.strict(), line))
    }
}

impl<T: DeserializeOwned, R: io::Read> Iterator for CsvReader<T, R> {
    type Item = Result<T, CsvError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Err(err) = self.prepare() {
            self.done = true;
            return Some(Err(err));
        }
        let (line, cells) = match self.tokenizer.read_record() {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };
        Some(self.bind(line, cells))
    }
}
