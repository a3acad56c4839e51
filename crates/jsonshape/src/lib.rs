//! A streaming, schema-directed JSON parser.
//!
//! `jsonshape` reads a JSON document from a character source and decodes it
//! directly into a typed [`Value`] conforming to a caller-supplied
//! [`Shape`]. There is no intermediate generic tree followed by a coercion
//! pass: the expected shape is consulted at every structural boundary, so
//! the parser picks the target representation as it goes, accepts or
//! rejects unknown fields, missing fields and type mismatches according to
//! a [data-projection policy](DataProjection), and coerces scalar lexemes
//! into the precise numeric or string subtype the shape demands.
//!
//! # Examples
//!
//! ```
//! use jsonshape::{parse_str, ParseOptions, Shape, Value};
//!
//! let shape = Shape::record()
//!     .field_renamed("user-id", "userId", Shape::int())
//!     .field("name", Shape::string())
//!     .build();
//!
//! let value = parse_str(
//!     r#"{"user-id": 7, "name": "Ada"}"#,
//!     &ParseOptions::strict(),
//!     &shape,
//! )
//! .unwrap();
//!
//! let object = value.as_object().unwrap();
//! assert_eq!(object["userId"], Value::Int(7));
//! assert_eq!(object["name"], Value::String("Ada".into()));
//! ```
//!
//! Union shapes are satisfied by parsing the subtree generically and
//! coercing it at the subtree boundary:
//!
//! ```
//! use jsonshape::{parse_str, ParseOptions, Shape, Value};
//!
//! let shape = Shape::union([Shape::int(), Shape::string()]);
//! let options = ParseOptions::strict();
//! assert_eq!(parse_str("42", &options, &shape), Ok(Value::Int(42)));
//! assert_eq!(
//!     parse_str("\"42\"", &options, &shape),
//!     Ok(Value::String("42".into()))
//! );
//! ```

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod coerce;
mod error;
mod options;
mod parser;
mod schema;
mod source;
mod traverse;
mod validate;
mod value;

use alloc::sync::Arc;

pub use error::{ErrorKind, ParseError};
pub use options::{DataProjection, ParseOptions, ProjectionFlags};
pub use parser::Parser;
pub use schema::{
    ArrayShape, Category, FieldSpec, IntWidth, IntersectionShape, MapShape, RecordBuilder,
    RecordShape, ScalarKind, Shape, TupleShape, UnionShape,
};
pub use source::{CharSource, StrSource};
pub use validate::ConstraintValidator;
pub use value::{Array, Map, Value};

/// Parses one JSON document from `source` into a value of `shape`.
///
/// # Errors
///
/// Any [`ErrorKind`], positioned at the offending character.
pub fn parse_with<S: CharSource>(
    source: &mut S,
    options: &ParseOptions,
    shape: &Arc<Shape>,
) -> Result<Value, ParseError> {
    Parser::new().parse(source, options, shape)
}

/// Parses a complete JSON document held in a string slice.
///
/// # Errors
///
/// See [`parse_with`].
pub fn parse_str(
    text: &str,
    options: &ParseOptions,
    shape: &Arc<Shape>,
) -> Result<Value, ParseError> {
    Parser::new().parse_str(text, options, shape)
}

/// Parses a document and, when [`ParseOptions::validate_constraints`] is
/// set, forwards the finished value to `validator` before returning it.
///
/// Constraint violations carry no document position.
///
/// # Errors
///
/// Any [`ErrorKind`], including [`ErrorKind::ConstraintViolation`].
pub fn parse_validated<S: CharSource, V: ConstraintValidator>(
    source: &mut S,
    options: &ParseOptions,
    shape: &Arc<Shape>,
    validator: &V,
) -> Result<Value, ParseError> {
    let value = parse_with(source, options, shape)?;
    if !options.validate_constraints {
        return Ok(value);
    }
    validator
        .validate(value, shape)
        .map_err(|message| ParseError {
            kind: ErrorKind::ConstraintViolation(message),
            line: 0,
            column: 0,
        })
}

#[cfg(test)]
mod tests;
