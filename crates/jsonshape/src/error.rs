use alloc::string::String;

use thiserror::Error;

/// A terminal parse failure, positioned at the character that produced it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at line {line} column {column}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub line: usize,
    pub column: usize,
}

/// What went wrong. No error is locally recovered; every kind aborts the
/// current parse.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    #[error("empty JSON document")]
    EmptyDocument,
    #[error("unexpected end of JSON document")]
    UnexpectedEof,
    #[error("expected {0}")]
    Expected(&'static str),
    #[error("invalid escape character '{0}'")]
    BadEscape(char),
    #[error("expected hexadecimal digit in unicode escape, found '{0}'")]
    BadHexEscape(char),
    #[error("invalid unicode escape sequence \\u{0:04X}")]
    UnpairedSurrogate(u32),
    #[error("undefined field '{0}'")]
    UndefinedField(String),
    #[error("required field '{0}' not present in JSON")]
    RequiredFieldMissing(String),
    #[error("array has more elements than the declared size {0}")]
    ArrayTooLong(usize),
    #[error("value '{lexeme}' cannot be converted to '{target}'")]
    ConversionFailure { lexeme: String, target: String },
    #[error("unsupported expected type '{0}'")]
    UnsupportedType(String),
    #[error("error reading JSON document: {0}")]
    SourceFailure(String),
    #[error("JSON document has already ended")]
    TrailingContent,
    #[error("constraint validation failed: {0}")]
    ConstraintViolation(String),
}
