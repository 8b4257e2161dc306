use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: ParseErrorKind },
    #[error("End of file reached after {frames_read} frame(s)")]
    EndOfFile { frames_read: usize },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Unsupported trajectory format: '{0}'")]
    UnsupportedFormat(String),
}

impl ReadError {
    pub fn is_end_of_file(&self) -> bool {
        matches!(self, ReadError::EndOfFile { .. })
    }
}

#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("Invalid integer format in {field} (value: '{value}')")]
    InvalidInt { field: &'static str, value: String },
    #[error("Invalid float format in {field} (value: '{value}')")]
    InvalidFloat { field: &'static str, value: String },
    #[error("Required field {field} is missing")]
    MissingField { field: &'static str },
    #[error("Frame ended after {found} of {expected} atom lines")]
    TruncatedFrame { expected: usize, found: usize },
    #[error("Lattice must contain 9 numbers, found {0}")]
    InvalidLattice(usize),
}
