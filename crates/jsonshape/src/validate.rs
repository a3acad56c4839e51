//! The constraint-validation seam.

use alloc::string::String;

use crate::{schema::Shape, value::Value};

/// Validates a successfully parsed value against annotated constraints.
///
/// The parser does not interpret constraints itself; the validating entry
/// point forwards the finished value to an implementation of this trait
/// when [`ParseOptions::validate_constraints`] is set.
///
/// [`ParseOptions::validate_constraints`]: crate::ParseOptions::validate_constraints
pub trait ConstraintValidator {
    /// Returns the (possibly replaced) value, or a message describing the
    /// violated constraint.
    ///
    /// # Errors
    ///
    /// A human-readable description of the first violated constraint.
    fn validate(&self, value: Value, shape: &Shape) -> Result<Value, String>;
}
