//! Expected-type descriptors.
//!
//! A [`Shape`] tells the parser what to build at every structural boundary
//! of the document: which container to allocate for `{` and `[`, which
//! scalar subtype a lexeme must coerce into, which object keys are declared
//! and which fall through to a rest type. Shapes are immutable and shared
//! via [`Arc`], so one descriptor can direct any number of parses.
//!
//! # Examples
//!
//! ```
//! use jsonshape::Shape;
//!
//! // record { @name("user-id") userId: int; name: string; }
//! let shape = Shape::record()
//!     .field_renamed("user-id", "userId", Shape::int())
//!     .field("name", Shape::string())
//!     .build();
//! ```

use alloc::{
    borrow::ToOwned,
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};
use core::fmt;

use indexmap::IndexMap;

use crate::error::ErrorKind;

/// Integer widths recognised by [`ScalarKind::Int`].
///
/// `U8` doubles as the byte type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
}

impl IntWidth {
    /// Inclusive bounds of the width, as `i64`.
    #[must_use]
    pub fn bounds(self) -> (i64, i64) {
        match self {
            IntWidth::I8 => (i64::from(i8::MIN), i64::from(i8::MAX)),
            IntWidth::I16 => (i64::from(i16::MIN), i64::from(i16::MAX)),
            IntWidth::I32 => (i64::from(i32::MIN), i64::from(i32::MAX)),
            IntWidth::I64 => (i64::MIN, i64::MAX),
            IntWidth::U8 => (0, i64::from(u8::MAX)),
            IntWidth::U16 => (0, i64::from(u16::MAX)),
            IntWidth::U32 => (0, i64::from(u32::MAX)),
        }
    }

    /// Returns `true` when `n` fits the width.
    #[must_use]
    pub fn contains(self, n: i64) -> bool {
        let (lo, hi) = self.bounds();
        lo <= n && n <= hi
    }
}

/// Scalar subtypes a shape can demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Null,
    Bool,
    Int(IntWidth),
    Float,
    Decimal,
    String,
    /// A string of exactly one character.
    CharString,
}

/// One declared record field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// The name the field is inserted under in the output container. May
    /// differ from the wire name the field map is keyed by.
    pub declared_name: String,
    pub shape: Arc<Shape>,
    pub required: bool,
    pub nilable: bool,
}

/// A record: declared fields keyed by wire name, plus an optional rest type
/// for undeclared keys.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordShape {
    fields: IndexMap<String, FieldSpec>,
    rest: Option<Arc<Shape>>,
}

impl RecordShape {
    /// All declared fields, keyed by wire name, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, FieldSpec> {
        &self.fields
    }

    /// The shape allowed for undeclared keys, if the record permits them.
    #[must_use]
    pub fn rest(&self) -> Option<&Arc<Shape>> {
        self.rest.as_ref()
    }
}

/// A map: any keys, all values of one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct MapShape {
    pub value: Arc<Shape>,
}

/// An array: uniform element shape, open or closed to a fixed size.
///
/// A closed array admits at most `size` elements; excess elements are
/// trimmed under projection and rejected otherwise. A document with *fewer*
/// elements than the closed size is accepted without error.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayShape {
    pub element: Arc<Shape>,
    pub size: Option<usize>,
}

/// A tuple: one shape per position.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleShape {
    pub elements: Vec<Arc<Shape>>,
}

impl TupleShape {
    /// The shape of the `i`-th element, if declared.
    #[must_use]
    pub fn nth(&self, i: usize) -> Option<&Arc<Shape>> {
        self.elements.get(i)
    }
}

/// A union of alternatives. Subtrees with a union shape are parsed
/// generically and coerced at the subtree boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionShape {
    pub members: Vec<Arc<Shape>>,
}

/// An intersection, valid only when its effective type is readonly.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionShape {
    pub effective: Arc<Shape>,
    pub read_only: bool,
}

/// An expected-type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Record(RecordShape),
    Map(MapShape),
    Array(ArrayShape),
    Tuple(TupleShape),
    Scalar(ScalarKind),
    Union(UnionShape),
    Intersection(IntersectionShape),
    /// Accepts any JSON value; descendants inherit `Json`.
    Json,
    /// An alias, resolved by dereference on entry.
    Ref(Arc<Shape>),
}

/// A shape resolved to one of the parser's dispatch categories.
///
/// `Ref` aliases are dereferenced and readonly intersections replaced by
/// their effective type before a category is produced.
#[derive(Debug, Clone, Copy)]
pub enum Category<'a> {
    Record(&'a RecordShape),
    Map(&'a MapShape),
    Array(&'a ArrayShape),
    Tuple(&'a TupleShape),
    Scalar(ScalarKind),
    Union(&'a UnionShape),
    Json,
}

impl Shape {
    /// Classifies the shape into a dispatch category.
    ///
    /// # Errors
    ///
    /// `UnsupportedType` for an intersection whose effective type is not
    /// readonly.
    pub fn classify(&self) -> Result<Category<'_>, ErrorKind> {
        match self {
            Shape::Record(r) => Ok(Category::Record(r)),
            Shape::Map(m) => Ok(Category::Map(m)),
            Shape::Array(a) => Ok(Category::Array(a)),
            Shape::Tuple(t) => Ok(Category::Tuple(t)),
            Shape::Scalar(k) => Ok(Category::Scalar(*k)),
            Shape::Union(u) => Ok(Category::Union(u)),
            Shape::Json => Ok(Category::Json),
            Shape::Ref(inner) => inner.classify(),
            Shape::Intersection(i) => {
                if i.read_only {
                    i.effective.classify()
                } else {
                    Err(ErrorKind::UnsupportedType(self.to_string()))
                }
            }
        }
    }

    /// Returns `true` when the shape admits `null`: the nil scalar, `Json`,
    /// or a union with a nil-admitting member.
    #[must_use]
    pub fn is_nilable(&self) -> bool {
        match self {
            Shape::Scalar(ScalarKind::Null) | Shape::Json => true,
            Shape::Union(u) => u.members.iter().any(|m| m.is_nilable()),
            Shape::Ref(inner) => inner.is_nilable(),
            Shape::Intersection(i) => i.effective.is_nilable(),
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    /// The shape accepting any JSON value.
    #[must_use]
    pub fn json() -> Arc<Shape> {
        Arc::new(Shape::Json)
    }

    #[must_use]
    pub fn null() -> Arc<Shape> {
        Arc::new(Shape::Scalar(ScalarKind::Null))
    }

    #[must_use]
    pub fn boolean() -> Arc<Shape> {
        Arc::new(Shape::Scalar(ScalarKind::Bool))
    }

    /// The 64-bit signed integer shape.
    #[must_use]
    pub fn int() -> Arc<Shape> {
        Arc::new(Shape::Scalar(ScalarKind::Int(IntWidth::I64)))
    }

    /// An integer shape of the given width.
    #[must_use]
    pub fn int_width(width: IntWidth) -> Arc<Shape> {
        Arc::new(Shape::Scalar(ScalarKind::Int(width)))
    }

    #[must_use]
    pub fn float() -> Arc<Shape> {
        Arc::new(Shape::Scalar(ScalarKind::Float))
    }

    #[must_use]
    pub fn decimal() -> Arc<Shape> {
        Arc::new(Shape::Scalar(ScalarKind::Decimal))
    }

    #[must_use]
    pub fn string() -> Arc<Shape> {
        Arc::new(Shape::Scalar(ScalarKind::String))
    }

    /// A string of exactly one character.
    #[must_use]
    pub fn char_string() -> Arc<Shape> {
        Arc::new(Shape::Scalar(ScalarKind::CharString))
    }

    /// An open array of `element`.
    #[must_use]
    pub fn array_of(element: Arc<Shape>) -> Arc<Shape> {
        Arc::new(Shape::Array(ArrayShape {
            element,
            size: None,
        }))
    }

    /// A closed array of `element`, admitting at most `size` elements.
    #[must_use]
    pub fn closed_array_of(element: Arc<Shape>, size: usize) -> Arc<Shape> {
        Arc::new(Shape::Array(ArrayShape {
            element,
            size: Some(size),
        }))
    }

    /// A tuple with one shape per position.
    #[must_use]
    pub fn tuple(elements: impl IntoIterator<Item = Arc<Shape>>) -> Arc<Shape> {
        Arc::new(Shape::Tuple(TupleShape {
            elements: elements.into_iter().collect(),
        }))
    }

    /// A map with arbitrary keys and `value`-shaped values.
    #[must_use]
    pub fn map_of(value: Arc<Shape>) -> Arc<Shape> {
        Arc::new(Shape::Map(MapShape { value }))
    }

    /// A union of the given members.
    #[must_use]
    pub fn union(members: impl IntoIterator<Item = Arc<Shape>>) -> Arc<Shape> {
        Arc::new(Shape::Union(UnionShape {
            members: members.into_iter().collect(),
        }))
    }

    /// `inner` or nil.
    #[must_use]
    pub fn nilable(inner: Arc<Shape>) -> Arc<Shape> {
        Shape::union([inner, Shape::null()])
    }

    /// An intersection with the given effective type. Accepted by the
    /// parser only when `read_only` is true.
    #[must_use]
    pub fn intersection(effective: Arc<Shape>, read_only: bool) -> Arc<Shape> {
        Arc::new(Shape::Intersection(IntersectionShape {
            effective,
            read_only,
        }))
    }

    /// An alias for `target`, dereferenced on entry.
    #[must_use]
    pub fn reference(target: Arc<Shape>) -> Arc<Shape> {
        Arc::new(Shape::Ref(target))
    }

    /// Starts building a record shape.
    #[must_use]
    pub fn record() -> RecordBuilder {
        RecordBuilder {
            fields: IndexMap::new(),
            rest: None,
        }
    }
}

/// Builder for [`RecordShape`].
#[derive(Debug, Default)]
pub struct RecordBuilder {
    fields: IndexMap<String, FieldSpec>,
    rest: Option<Arc<Shape>>,
}

impl RecordBuilder {
    /// Adds a required field whose wire name equals its declared name.
    #[must_use]
    pub fn field(self, name: &str, shape: Arc<Shape>) -> Self {
        self.field_renamed(name, name, shape)
    }

    /// Adds a required field keyed by `wire_name` in the document but
    /// inserted under `declared_name` in the output.
    #[must_use]
    pub fn field_renamed(mut self, wire_name: &str, declared_name: &str, shape: Arc<Shape>) -> Self {
        let nilable = shape.is_nilable();
        self.fields.insert(
            wire_name.to_owned(),
            FieldSpec {
                declared_name: declared_name.to_owned(),
                shape,
                required: true,
                nilable,
            },
        );
        self
    }

    /// Adds an optional field.
    #[must_use]
    pub fn optional_field(mut self, name: &str, shape: Arc<Shape>) -> Self {
        let nilable = shape.is_nilable();
        self.fields.insert(
            name.to_owned(),
            FieldSpec {
                declared_name: name.to_owned(),
                shape,
                required: false,
                nilable,
            },
        );
        self
    }

    /// Marks the most recently added field nilable.
    ///
    /// # Panics
    ///
    /// Panics if no field has been added yet.
    #[must_use]
    pub fn nilable(mut self) -> Self {
        let (_, spec) = self
            .fields
            .last_mut()
            .expect("nilable() requires a preceding field");
        spec.nilable = true;
        self
    }

    /// Allows undeclared keys, typed by `rest`.
    #[must_use]
    pub fn rest(mut self, rest: Arc<Shape>) -> Self {
        self.rest = Some(rest);
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<Shape> {
        Arc::new(Shape::Record(RecordShape {
            fields: self.fields,
            rest: self.rest,
        }))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Record(_) => f.write_str("record"),
            Shape::Map(m) => write!(f, "map<{}>", m.value),
            Shape::Array(a) => match a.size {
                Some(n) => write!(f, "{}[{n}]", a.element),
                None => write!(f, "{}[]", a.element),
            },
            Shape::Tuple(t) => {
                f.write_str("[")?;
                let mut first = true;
                for e in &t.elements {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{e}")?;
                }
                f.write_str("]")
            }
            Shape::Scalar(kind) => f.write_str(match kind {
                ScalarKind::Null => "()",
                ScalarKind::Bool => "boolean",
                ScalarKind::Int(IntWidth::I8) => "int:Signed8",
                ScalarKind::Int(IntWidth::I16) => "int:Signed16",
                ScalarKind::Int(IntWidth::I32) => "int:Signed32",
                ScalarKind::Int(IntWidth::I64) => "int",
                ScalarKind::Int(IntWidth::U8) => "int:Unsigned8",
                ScalarKind::Int(IntWidth::U16) => "int:Unsigned16",
                ScalarKind::Int(IntWidth::U32) => "int:Unsigned32",
                ScalarKind::Float => "float",
                ScalarKind::Decimal => "decimal",
                ScalarKind::String => "string",
                ScalarKind::CharString => "string:Char",
            }),
            Shape::Union(u) => {
                let mut first = true;
                for m in &u.members {
                    if !first {
                        f.write_str("|")?;
                    }
                    first = false;
                    write!(f, "{m}")?;
                }
                Ok(())
            }
            Shape::Intersection(i) => write!(f, "{} & readonly", i.effective),
            Shape::Json => f.write_str("json"),
            Shape::Ref(inner) => write!(f, "{inner}"),
        }
    }
}
