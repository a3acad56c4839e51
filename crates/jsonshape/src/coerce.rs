//! Scalar lexeme coercion.
//!
//! Lexemes arrive from the state machine as raw character runs together
//! with a `was_quoted` flag; this module turns them into [`Value`]s of the
//! precise subtype the expected shape demands. Numeric lexemes, `true`,
//! `false` and `null` are recognised here, not in the state machine.

use alloc::string::ToString;

use crate::{
    error::ErrorKind,
    options::DataProjection,
    schema::{Category, ScalarKind, Shape},
    traverse,
    value::Value,
};

/// Returns `true` when `lexeme` is a JSON integer: an optional minus sign
/// and digits without a redundant leading zero.
fn is_int_lexeme(lexeme: &str) -> bool {
    let digits = lexeme.strip_prefix('-').unwrap_or(lexeme);
    match digits.len() {
        0 => false,
        1 => digits.as_bytes()[0].is_ascii_digit(),
        _ => digits.as_bytes()[0] != b'0' && digits.bytes().all(|b| b.is_ascii_digit()),
    }
}

/// Returns `true` when `lexeme` is a JSON number with a fraction or
/// exponent part.
fn is_float_lexeme(lexeme: &str) -> bool {
    let rest = lexeme.strip_prefix('-').unwrap_or(lexeme);
    let bytes = rest.as_bytes();

    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    // Integer part: at least one digit, no redundant leading zero.
    if i == 0 || (i > 1 && bytes[0] == b'0') {
        return false;
    }

    let mut fractional = false;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
        fractional = true;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
        fractional = true;
    }

    fractional && i == bytes.len()
}

fn conversion_failure(lexeme: &str, shape: &Shape) -> ErrorKind {
    ErrorKind::ConversionFailure {
        lexeme: lexeme.to_string(),
        target: shape.to_string(),
    }
}

fn parse_f64(lexeme: &str, shape: &Shape) -> Result<f64, ErrorKind> {
    if !is_int_lexeme(lexeme) && !is_float_lexeme(lexeme) {
        return Err(conversion_failure(lexeme, shape));
    }
    lexeme
        .parse::<f64>()
        .map_err(|_| conversion_failure(lexeme, shape))
}

/// Infers a value from a lexeme under the `Json` shape: `null`, booleans,
/// integer lexemes to `Int` (overflowing ones to `Float`), fractional
/// lexemes to `Float`, quoted lexemes to `String`.
fn infer_json(lexeme: &str, was_quoted: bool) -> Result<Value, ErrorKind> {
    if was_quoted {
        return Ok(Value::String(lexeme.into()));
    }
    match lexeme {
        "null" => return Ok(Value::Null),
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }
    if is_int_lexeme(lexeme) {
        return match lexeme.parse::<i64>() {
            Ok(n) => Ok(Value::Int(n)),
            // Magnitude beyond i64; fall back to the double representation.
            Err(_) => Ok(Value::Float(parse_f64(lexeme, &Shape::Json)?)),
        };
    }
    if is_float_lexeme(lexeme) {
        return Ok(Value::Float(parse_f64(lexeme, &Shape::Json)?));
    }
    Err(conversion_failure(lexeme, &Shape::Json))
}

/// Coerces one scalar lexeme into the value the shape demands.
///
/// Union shapes are satisfied by inferring a generic value and handing it
/// to the union-fallback converter with the caller's projection flags.
///
/// # Errors
///
/// `ConversionFailure` when the lexeme does not fit; `UnsupportedType`
/// propagated from classification.
pub(crate) fn coerce_scalar(
    lexeme: &str,
    shape: &Shape,
    was_quoted: bool,
    projection: &DataProjection,
) -> Result<Value, ErrorKind> {
    match shape.classify()? {
        Category::Json => infer_json(lexeme, was_quoted),
        Category::Union(_) => {
            let generic = infer_json(lexeme, was_quoted)?;
            traverse::convert(generic, projection, shape)
        }
        Category::Scalar(kind) => coerce_kind(lexeme, kind, was_quoted, shape),
        // A scalar lexeme can never satisfy a structural shape.
        Category::Record(_) | Category::Map(_) | Category::Array(_) | Category::Tuple(_) => {
            Err(conversion_failure(lexeme, shape))
        }
    }
}

fn coerce_kind(
    lexeme: &str,
    kind: ScalarKind,
    was_quoted: bool,
    shape: &Shape,
) -> Result<Value, ErrorKind> {
    if was_quoted {
        return match kind {
            ScalarKind::String => Ok(Value::String(lexeme.into())),
            ScalarKind::CharString => {
                let mut chars = lexeme.chars();
                match (chars.next(), chars.next()) {
                    (Some(_), None) => Ok(Value::String(lexeme.into())),
                    _ => Err(conversion_failure(lexeme, shape)),
                }
            }
            _ => Err(conversion_failure(lexeme, shape)),
        };
    }

    match kind {
        ScalarKind::Null => match lexeme {
            "null" => Ok(Value::Null),
            _ => Err(conversion_failure(lexeme, shape)),
        },
        ScalarKind::Bool => match lexeme {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(conversion_failure(lexeme, shape)),
        },
        ScalarKind::Int(width) => {
            if !is_int_lexeme(lexeme) {
                return Err(conversion_failure(lexeme, shape));
            }
            let n = lexeme
                .parse::<i64>()
                .map_err(|_| conversion_failure(lexeme, shape))?;
            if width.contains(n) {
                Ok(Value::Int(n))
            } else {
                Err(conversion_failure(lexeme, shape))
            }
        }
        ScalarKind::Float => Ok(Value::Float(parse_f64(lexeme, shape)?)),
        ScalarKind::Decimal => Ok(Value::Decimal(parse_f64(lexeme, shape)?)),
        ScalarKind::String | ScalarKind::CharString => Err(conversion_failure(lexeme, shape)),
    }
}
