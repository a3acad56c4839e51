//! Parser configuration: the data-projection policy and the constraint
//! validation switch.

/// The two projection knobs of the lenient mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionFlags {
    /// Declared **nilable** fields missing from the document become nil
    /// instead of failing `RequiredFieldMissing`.
    pub absent_as_nilable_type: bool,
    /// An explicit `null` for an optional, non-nilable field is accepted by
    /// omitting the field instead of failing.
    pub nil_as_optional_field: bool,
}

/// Whether the document and the schema are allowed to disagree.
///
/// `Strict` rejects undeclared fields (`UndefinedField`) and oversized
/// closed arrays (`ArrayTooLong`). `Enabled` drops undeclared fields
/// without a rest type, trims oversized closed arrays, and applies the two
/// [`ProjectionFlags`] knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataProjection {
    #[default]
    Strict,
    Enabled(ProjectionFlags),
}

impl DataProjection {
    /// Projection with both knobs off: extra fields and excess closed-array
    /// elements are dropped, but absence and nil keep their strict meaning.
    #[must_use]
    pub fn enabled() -> Self {
        Self::Enabled(ProjectionFlags::default())
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    #[must_use]
    pub(crate) fn absent_as_nilable(&self) -> bool {
        match self {
            Self::Strict => false,
            Self::Enabled(flags) => flags.absent_as_nilable_type,
        }
    }

    #[must_use]
    pub(crate) fn nil_as_optional(&self) -> bool {
        match self {
            Self::Strict => false,
            Self::Enabled(flags) => flags.nil_as_optional_field,
        }
    }
}

/// Options accepted by the parse entry points.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub projection: DataProjection,
    /// When true, a successfully parsed value is forwarded to the
    /// constraint-validator collaborator before being returned. Only the
    /// validating entry point consults this.
    pub validate_constraints: bool,
}

impl ParseOptions {
    /// Strict options: no projection, no constraint validation.
    #[must_use]
    pub fn strict() -> Self {
        Self::default()
    }

    /// Options with projection enabled and both knobs off.
    #[must_use]
    pub fn projecting() -> Self {
        Self {
            projection: DataProjection::enabled(),
            ..Self::default()
        }
    }
}
