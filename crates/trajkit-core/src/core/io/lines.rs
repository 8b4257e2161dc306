use super::error::{ParseErrorKind, ReadError};
use std::io::BufRead;

/// Line-at-a-time reader that reuses one buffer and tracks 1-based line numbers.
pub(crate) struct LineReader<R> {
    reader: R,
    pub(crate) buffer: String,
    pub(crate) line_number: usize,
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            line_number: 0,
        }
    }

    /// Loads the next line into `buffer`; `false` at end of file.
    pub(crate) fn next_line(&mut self) -> Result<bool, ReadError> {
        self.buffer.clear();
        let bytes = self.reader.read_line(&mut self.buffer)?;
        if bytes == 0 {
            return Ok(false);
        }
        if self.buffer.ends_with('\n') {
            self.buffer.pop();
            if self.buffer.ends_with('\r') {
                self.buffer.pop();
            }
        }
        self.line_number += 1;
        Ok(true)
    }
}

pub(crate) fn parse_float(value: &str, field: &'static str, line: usize) -> Result<f64, ReadError> {
    value.parse().map_err(|_| ReadError::Parse {
        line,
        kind: ParseErrorKind::InvalidFloat {
            field,
            value: value.to_string(),
        },
    })
}

pub(crate) fn parse_int<T: std::str::FromStr>(
    value: &str,
    field: &'static str,
    line: usize,
) -> Result<T, ReadError> {
    value.parse().map_err(|_| ReadError::Parse {
        line,
        kind: ParseErrorKind::InvalidInt {
            field,
            value: value.to_string(),
        },
    })
}

pub(crate) fn truncated(line: usize, expected: usize, found: usize) -> ReadError {
    ReadError::Parse {
        line,
        kind: ParseErrorKind::TruncatedFrame { expected, found },
    }
}
