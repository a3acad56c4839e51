use alloc::{string::String, sync::Arc};

use crate::{parse_str, ErrorKind, ParseOptions, Shape, Value};

mod parse_bad;
mod typed_records;
mod unions;

pub(crate) fn strict() -> ParseOptions {
    ParseOptions::strict()
}

pub(crate) fn projecting() -> ParseOptions {
    ParseOptions::projecting()
}

/// Parses `text` and unwraps, with the document in the panic message.
pub(crate) fn parse_ok(text: &str, options: &ParseOptions, shape: &Arc<Shape>) -> Value {
    match parse_str(text, options, shape) {
        Ok(value) => value,
        Err(err) => panic!("failed to parse {text:?}: {err}"),
    }
}

/// Parses `text` expecting failure and returns the error kind.
pub(crate) fn parse_err(text: &str, options: &ParseOptions, shape: &Arc<Shape>) -> ErrorKind {
    match parse_str(text, options, shape) {
        Ok(value) => panic!("expected {text:?} to fail, got {value}"),
        Err(err) => err.kind,
    }
}

/// Builds an object value from key/value pairs.
pub(crate) fn object<const N: usize>(pairs: [(&str, Value); N]) -> Value {
    let mut map = crate::Map::new();
    for (key, value) in pairs {
        map.insert(String::from(key), value);
    }
    Value::Object(map)
}
