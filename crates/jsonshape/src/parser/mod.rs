//! The schema-directed JSON parsing state machine.
//!
//! The machine consumes one character at a time from a [`CharSource`]
//! through a fixed read buffer. Every state is a function of the machine
//! context and the current character and returns the next state. At each
//! structural boundary the machine consults the expected shape: field names
//! resolve against the enclosing record, containers allocate per the shape
//! they descend into, and scalar lexemes are coerced by the value
//! constructor.
//!
//! The escape-processing states of the original design (one per string
//! context) collapse here into two variants carrying the context they
//! return to: [`State::Escape`] and [`State::UnicodeHex`].

mod escape_buffer;

use alloc::{
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};

use indexmap::IndexMap;

use escape_buffer::UnicodeEscapeBuffer;

use crate::{
    coerce,
    error::{ErrorKind, ParseError},
    options::{DataProjection, ParseOptions},
    schema::{Category, FieldSpec, Shape},
    source::CharSource,
    traverse,
    value::{Array, Map, Value},
};

/// Characters pulled from the source per refill.
const READ_BUF_LEN: usize = 1024;

/// The string context an escape sequence belongs to; doubles as the state
/// to return to once the escape is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringCtx {
    FieldName,
    FieldValue,
    ArrayElement,
    TopLevel,
}

impl StringCtx {
    fn string_state(self) -> State {
        match self {
            StringCtx::FieldName => State::FieldName,
            StringCtx::FieldValue => State::StringFieldValue,
            StringCtx::ArrayElement => State::StringArrayElement,
            StringCtx::TopLevel => State::StringValue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    DocStart,
    DocEnd,
    FirstFieldReady,
    NonFirstFieldReady,
    FieldName,
    EndFieldName,
    FieldValueReady,
    StringFieldValue,
    NonStringFieldValue,
    FirstArrayElementReady,
    NonFirstArrayElementReady,
    StringArrayElement,
    NonStringArrayElement,
    StringValue,
    NonStringValue,
    FieldEnd,
    ArrayElementEnd,
    Escape(StringCtx),
    UnicodeHex(StringCtx),
}

/// One input character, or the end-of-input sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Ch(char),
    Eof,
}

use Input::{Ch, Eof};

fn is_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// What the parser expects for one value slot or open container.
#[derive(Debug, Clone)]
enum Expect {
    /// Parse the value for syntax only and drop it (projection allows the
    /// document to carry it).
    Skip,
    Typed(Arc<Shape>),
}

/// The expectation for the value about to be parsed, plus the policy
/// metadata of the declared field it belongs to, if any.
#[derive(Debug, Clone)]
struct Slot {
    expect: Expect,
    required: bool,
    nilable: bool,
}

impl Slot {
    fn skip() -> Self {
        Slot {
            expect: Expect::Skip,
            required: true,
            nilable: false,
        }
    }

    fn typed(shape: Arc<Shape>) -> Self {
        Slot {
            expect: Expect::Typed(shape),
            required: true,
            nilable: false,
        }
    }

    fn field(spec: &FieldSpec) -> Self {
        Slot {
            expect: Expect::Typed(spec.shape.clone()),
            required: spec.required,
            nilable: spec.nilable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameMode {
    Typed,
    /// Building a generic value inside a union subtree.
    Union,
    /// Parsing for syntax only.
    Skip,
}

#[derive(Debug)]
struct MapFrame {
    node: Map,
    mode: FrameMode,
    /// Declared fields not yet seen, keyed by wire name.
    unvisited: IndexMap<String, FieldSpec>,
    /// Fields already seen, keyed by wire name, so repeated keys resolve
    /// to the same declared field.
    visited: IndexMap<String, FieldSpec>,
    /// Shape for undeclared keys, if any.
    rest: Option<Arc<Shape>>,
    /// Resolved names of fields whose values are in flight or completed
    /// out of order; popped when the corresponding value finalizes.
    names: Vec<String>,
}

impl MapFrame {
    fn new(mode: FrameMode, unvisited: IndexMap<String, FieldSpec>, rest: Option<Arc<Shape>>) -> Self {
        MapFrame {
            node: Map::new(),
            mode,
            unvisited,
            visited: IndexMap::new(),
            rest,
            names: Vec::new(),
        }
    }

    fn generic(mode: FrameMode) -> Self {
        Self::new(mode, IndexMap::new(), None)
    }
}

/// How element shapes are derived for an array frame.
#[derive(Debug)]
enum ElementPlan {
    Uniform {
        shape: Arc<Shape>,
        size: Option<usize>,
    },
    Tuple(Vec<Arc<Shape>>),
    Json,
    /// Skip and union frames derive element expectations from the frame
    /// mode alone.
    None,
}

#[derive(Debug)]
struct ArrayFrame {
    node: Array,
    index: usize,
    mode: FrameMode,
    plan: ElementPlan,
}

#[derive(Debug)]
enum Frame {
    Map(MapFrame),
    Array(ArrayFrame),
}

/// A reusable schema-directed parser.
///
/// One instance owns all parse state; [`Parser::parse`] resets it on entry,
/// so an instance can be kept per thread and reused across documents
/// without retaining values from earlier parses.
///
/// # Examples
///
/// ```
/// use jsonshape::{ParseOptions, Parser, Shape, Value};
///
/// let shape = Shape::record().field("answer", Shape::int()).build();
/// let mut parser = Parser::new();
/// let value = parser
///     .parse_str(r#"{"answer": 42}"#, &ParseOptions::strict(), &shape)
///     .unwrap();
/// assert_eq!(value.as_object().unwrap()["answer"], Value::Int(42));
/// ```
#[derive(Debug)]
pub struct Parser {
    frames: Vec<Frame>,
    /// One entry per open container: its declaring expectation. Kept in
    /// lockstep with `frames`.
    expected: Vec<Expect>,
    /// The expectation for the next value, set at field-name completion,
    /// element start, or document start, and consumed exactly once.
    slot: Option<Slot>,
    /// Number of open containers inside the current union subtree.
    union_depth: usize,
    root: Option<Value>,
    lexeme: String,
    escape: UnicodeEscapeBuffer,
    projection: DataProjection,
    json: Arc<Shape>,
    line: usize,
    column: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Parser {
            frames: Vec::new(),
            expected: Vec::new(),
            slot: None,
            union_depth: 0,
            root: None,
            lexeme: String::new(),
            escape: UnicodeEscapeBuffer::new(),
            projection: DataProjection::Strict,
            json: Shape::json(),
            line: 1,
            column: 0,
        }
    }

    /// Clears all stacks, buffers, counters and the root-value slot.
    ///
    /// [`parse`](Parser::parse) resets on entry, so calling this between
    /// parses is only needed to proactively release values the last parse
    /// may still hold after an error.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.expected.clear();
        self.slot = None;
        self.union_depth = 0;
        self.root = None;
        self.lexeme.clear();
        self.escape.reset();
        self.projection = DataProjection::Strict;
        self.line = 1;
        self.column = 0;
    }

    /// Parses one document from `source` into a value of `shape`.
    ///
    /// # Errors
    ///
    /// Any [`ErrorKind`], positioned at the offending character.
    pub fn parse<S: CharSource>(
        &mut self,
        source: &mut S,
        options: &ParseOptions,
        shape: &Arc<Shape>,
    ) -> Result<Value, ParseError> {
        self.reset();
        self.projection = options.projection;

        let root = resolve_root(shape).map_err(|kind| self.positioned(kind))?;
        self.slot = Some(Slot::typed(root));

        let mut state = State::DocStart;
        let mut buf = ['\0'; READ_BUF_LEN];
        loop {
            let count = source
                .read(&mut buf)
                .map_err(|e| self.positioned(ErrorKind::SourceFailure(e.to_string())))?;
            if count == 0 {
                break;
            }
            for &ch in &buf[..count] {
                self.locate(ch);
                state = self
                    .step(state, Ch(ch))
                    .map_err(|kind| self.positioned(kind))?;
            }
        }
        state = self
            .step(state, Eof)
            .map_err(|kind| self.positioned(kind))?;

        if state != State::DocEnd {
            return Err(self.positioned(ErrorKind::UnexpectedEof));
        }
        self.root
            .take()
            .ok_or_else(|| self.positioned(ErrorKind::UnexpectedEof))
    }

    /// Parses a complete document held in a string slice.
    ///
    /// # Errors
    ///
    /// See [`parse`](Parser::parse).
    pub fn parse_str(
        &mut self,
        text: &str,
        options: &ParseOptions,
        shape: &Arc<Shape>,
    ) -> Result<Value, ParseError> {
        let mut source = crate::source::StrSource::new(text);
        self.parse(&mut source, options, shape)
    }

    fn positioned(&self, kind: ErrorKind) -> ParseError {
        ParseError {
            kind,
            line: self.line,
            column: self.column,
        }
    }

    fn locate(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }

    // ------------------------------------------------------------------
    // State dispatch
    // ------------------------------------------------------------------

    fn step(&mut self, state: State, input: Input) -> Result<State, ErrorKind> {
        use State::*;
        match state {
            DocStart => self.doc_start(input),
            DocEnd => self.doc_end(input),
            FirstFieldReady => self.field_ready(input, true),
            NonFirstFieldReady => self.field_ready(input, false),
            FieldName => self.string_char(input, StringCtx::FieldName),
            EndFieldName => self.end_field_name(input),
            FieldValueReady => self.field_value_ready(input),
            StringFieldValue => self.string_char(input, StringCtx::FieldValue),
            NonStringFieldValue => self.non_string_field_value(input),
            FirstArrayElementReady => self.array_element_ready(input, true),
            NonFirstArrayElementReady => self.array_element_ready(input, false),
            StringArrayElement => self.string_char(input, StringCtx::ArrayElement),
            NonStringArrayElement => self.non_string_array_element(input),
            StringValue => self.string_char(input, StringCtx::TopLevel),
            NonStringValue => self.non_string_value(input),
            FieldEnd => self.field_end(input),
            ArrayElementEnd => self.array_element_end(input),
            Escape(ctx) => self.escaped_char(input, ctx),
            UnicodeHex(ctx) => self.unicode_hex(input, ctx),
        }
    }

    fn doc_start(&mut self, input: Input) -> Result<State, ErrorKind> {
        match input {
            Ch(c) if is_ws(c) => Ok(State::DocStart),
            Ch('{') => self.open_map(),
            Ch('[') => self.open_array(),
            Ch('"') => Ok(State::StringValue),
            Eof => Err(ErrorKind::EmptyDocument),
            Ch(c) => {
                self.lexeme.push(c);
                Ok(State::NonStringValue)
            }
        }
    }

    fn doc_end(&mut self, input: Input) -> Result<State, ErrorKind> {
        match input {
            Ch(c) if is_ws(c) => Ok(State::DocEnd),
            Eof => Ok(State::DocEnd),
            Ch(_) => Err(ErrorKind::TrailingContent),
        }
    }

    fn field_ready(&mut self, input: Input, first: bool) -> Result<State, ErrorKind> {
        match input {
            Ch(c) if is_ws(c) => Ok(if first {
                State::FirstFieldReady
            } else {
                State::NonFirstFieldReady
            }),
            Ch('"') => Ok(State::FieldName),
            Ch('}') if first => self.finalize_map(),
            Eof => Err(ErrorKind::UnexpectedEof),
            Ch(_) if first => Err(ErrorKind::Expected("'\"' or '}'")),
            Ch(_) => Err(ErrorKind::Expected("'\"'")),
        }
    }

    fn end_field_name(&mut self, input: Input) -> Result<State, ErrorKind> {
        match input {
            Ch(c) if is_ws(c) => Ok(State::EndFieldName),
            Ch(':') => Ok(State::FieldValueReady),
            Eof => Err(ErrorKind::UnexpectedEof),
            Ch(_) => Err(ErrorKind::Expected("':'")),
        }
    }

    fn field_value_ready(&mut self, input: Input) -> Result<State, ErrorKind> {
        match input {
            Ch(c) if is_ws(c) => Ok(State::FieldValueReady),
            Ch('"') => Ok(State::StringFieldValue),
            Ch('{') => self.open_map(),
            Ch('[') => self.open_array(),
            Eof => Err(ErrorKind::UnexpectedEof),
            Ch(c) => {
                self.lexeme.push(c);
                Ok(State::NonStringFieldValue)
            }
        }
    }

    fn non_string_field_value(&mut self, input: Input) -> Result<State, ErrorKind> {
        match input {
            Ch(',') => {
                self.emit_scalar(false)?;
                Ok(State::NonFirstFieldReady)
            }
            Ch('}') => {
                self.emit_scalar(false)?;
                self.finalize_map()
            }
            Ch(c) if is_ws(c) => {
                self.emit_scalar(false)?;
                Ok(State::FieldEnd)
            }
            Ch(']') => Err(ErrorKind::Expected("',' or '}'")),
            Eof => Err(ErrorKind::UnexpectedEof),
            Ch(c) => {
                self.lexeme.push(c);
                Ok(State::NonStringFieldValue)
            }
        }
    }

    fn array_element_ready(&mut self, input: Input, first: bool) -> Result<State, ErrorKind> {
        match input {
            Ch(c) if is_ws(c) => Ok(if first {
                State::FirstArrayElementReady
            } else {
                State::NonFirstArrayElementReady
            }),
            Ch(']') if first => self.finalize_array(),
            Ch(']') => Err(ErrorKind::Expected("a value")),
            Ch('"') => {
                self.slot = Some(self.element_slot()?);
                Ok(State::StringArrayElement)
            }
            Ch('{') => {
                self.slot = Some(self.element_slot()?);
                self.open_map()
            }
            Ch('[') => {
                self.slot = Some(self.element_slot()?);
                self.open_array()
            }
            Eof => Err(ErrorKind::UnexpectedEof),
            Ch(c) => {
                self.slot = Some(self.element_slot()?);
                self.lexeme.push(c);
                Ok(State::NonStringArrayElement)
            }
        }
    }

    fn non_string_array_element(&mut self, input: Input) -> Result<State, ErrorKind> {
        match input {
            Ch(',') => {
                self.emit_scalar(false)?;
                self.bump_index();
                Ok(State::NonFirstArrayElementReady)
            }
            Ch(']') => {
                self.emit_scalar(false)?;
                self.finalize_array()
            }
            Ch(c) if is_ws(c) => {
                self.emit_scalar(false)?;
                Ok(State::ArrayElementEnd)
            }
            Ch('}') => Err(ErrorKind::Expected("',' or ']'")),
            Eof => Err(ErrorKind::UnexpectedEof),
            Ch(c) => {
                self.lexeme.push(c);
                Ok(State::NonStringArrayElement)
            }
        }
    }

    fn non_string_value(&mut self, input: Input) -> Result<State, ErrorKind> {
        match input {
            Ch(c) if is_ws(c) => {
                self.emit_scalar(false)?;
                Ok(State::DocEnd)
            }
            Eof => {
                self.emit_scalar(false)?;
                Ok(State::DocEnd)
            }
            Ch(c) => {
                self.lexeme.push(c);
                Ok(State::NonStringValue)
            }
        }
    }

    fn field_end(&mut self, input: Input) -> Result<State, ErrorKind> {
        match input {
            Ch(c) if is_ws(c) => Ok(State::FieldEnd),
            Ch(',') => Ok(State::NonFirstFieldReady),
            Ch('}') => self.finalize_map(),
            Eof => Err(ErrorKind::UnexpectedEof),
            Ch(_) => Err(ErrorKind::Expected("',' or '}'")),
        }
    }

    fn array_element_end(&mut self, input: Input) -> Result<State, ErrorKind> {
        match input {
            Ch(c) if is_ws(c) => Ok(State::ArrayElementEnd),
            Ch(',') => {
                self.bump_index();
                Ok(State::NonFirstArrayElementReady)
            }
            Ch(']') => self.finalize_array(),
            Eof => Err(ErrorKind::UnexpectedEof),
            Ch(_) => Err(ErrorKind::Expected("',' or ']'")),
        }
    }

    // ------------------------------------------------------------------
    // Strings and escapes
    // ------------------------------------------------------------------

    fn string_char(&mut self, input: Input, ctx: StringCtx) -> Result<State, ErrorKind> {
        match input {
            Ch('\\') => Ok(State::Escape(ctx)),
            Ch('"') => {
                if self.escape.awaiting_low_surrogate() {
                    return Err(self.escape.unpaired());
                }
                match ctx {
                    StringCtx::FieldName => {
                        let name = core::mem::take(&mut self.lexeme);
                        self.handle_field_name(name)?;
                        Ok(State::EndFieldName)
                    }
                    StringCtx::FieldValue => {
                        self.emit_scalar(true)?;
                        Ok(State::FieldEnd)
                    }
                    StringCtx::ArrayElement => {
                        self.emit_scalar(true)?;
                        Ok(State::ArrayElementEnd)
                    }
                    StringCtx::TopLevel => {
                        self.emit_scalar(true)?;
                        Ok(State::DocEnd)
                    }
                }
            }
            Eof => Err(ErrorKind::UnexpectedEof),
            Ch(c) => {
                if self.escape.awaiting_low_surrogate() {
                    return Err(self.escape.unpaired());
                }
                self.lexeme.push(c);
                Ok(ctx.string_state())
            }
        }
    }

    fn escaped_char(&mut self, input: Input, ctx: StringCtx) -> Result<State, ErrorKind> {
        let Ch(c) = input else {
            return Err(ErrorKind::UnexpectedEof);
        };
        if self.escape.awaiting_low_surrogate() && c != 'u' {
            return Err(self.escape.unpaired());
        }
        let unescaped = match c {
            '"' | '\\' | '/' => c,
            'b' => '\u{0008}',
            'f' => '\u{000C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => return Ok(State::UnicodeHex(ctx)),
            other => return Err(ErrorKind::BadEscape(other)),
        };
        self.lexeme.push(unescaped);
        Ok(ctx.string_state())
    }

    fn unicode_hex(&mut self, input: Input, ctx: StringCtx) -> Result<State, ErrorKind> {
        let Ch(c) = input else {
            return Err(ErrorKind::UnexpectedEof);
        };
        match self.escape.feed(c)? {
            Some(decoded) => {
                self.lexeme.push(decoded);
                Ok(ctx.string_state())
            }
            // A completed high surrogate returns to the string state, which
            // requires the low half's `\uXXXX` to follow immediately.
            None if !self.escape.in_quad() => Ok(ctx.string_state()),
            None => Ok(State::UnicodeHex(ctx)),
        }
    }

    // ------------------------------------------------------------------
    // Schema-directed actions
    // ------------------------------------------------------------------

    /// Resolves a completed field name against the enclosing frame and
    /// sets up the value slot.
    fn handle_field_name(&mut self, wire_name: String) -> Result<(), ErrorKind> {
        let projection = self.projection;
        let json = self.json.clone();
        let Some(Frame::Map(frame)) = self.frames.last_mut() else {
            unreachable!("field name outside of a map frame");
        };

        match frame.mode {
            FrameMode::Skip => {
                frame.names.push(wire_name);
                self.slot = Some(Slot::skip());
            }
            FrameMode::Union => {
                frame.names.push(wire_name);
                self.slot = Some(Slot::typed(json));
            }
            FrameMode::Typed => {
                if let Some(spec) = frame.visited.get(&wire_name) {
                    let slot = Slot::field(spec);
                    frame.names.push(spec.declared_name.clone());
                    self.slot = Some(slot);
                } else if let Some(spec) = frame.unvisited.shift_remove(&wire_name) {
                    frame.names.push(spec.declared_name.clone());
                    self.slot = Some(Slot::field(&spec));
                    frame.visited.insert(wire_name, spec);
                } else if let Some(rest) = frame.rest.clone() {
                    frame.names.push(wire_name);
                    self.slot = Some(Slot::typed(rest));
                } else if projection.is_enabled() {
                    frame.names.push(wire_name);
                    self.slot = Some(Slot::skip());
                } else {
                    return Err(ErrorKind::UndefinedField(wire_name));
                }
            }
        }
        Ok(())
    }

    /// Computes the expectation for the element at the current index of the
    /// enclosing array frame.
    fn element_slot(&self) -> Result<Slot, ErrorKind> {
        let Some(Frame::Array(frame)) = self.frames.last() else {
            unreachable!("array element outside of an array frame");
        };

        match frame.mode {
            FrameMode::Skip => Ok(Slot::skip()),
            FrameMode::Union => Ok(Slot::typed(self.json.clone())),
            FrameMode::Typed => match &frame.plan {
                ElementPlan::Json => Ok(Slot::typed(self.json.clone())),
                ElementPlan::Uniform { shape, size } => match size {
                    Some(size) if frame.index >= *size => self.overflow_slot(*size),
                    _ => Ok(Slot::typed(shape.clone())),
                },
                ElementPlan::Tuple(elements) => match elements.get(frame.index) {
                    Some(shape) => Ok(Slot::typed(shape.clone())),
                    None => self.overflow_slot(elements.len()),
                },
                ElementPlan::None => unreachable!("typed frame without an element plan"),
            },
        }
    }

    fn overflow_slot(&self, size: usize) -> Result<Slot, ErrorKind> {
        if self.projection.is_enabled() {
            Ok(Slot::skip())
        } else {
            Err(ErrorKind::ArrayTooLong(size))
        }
    }

    fn bump_index(&mut self) {
        if let Some(Frame::Array(frame)) = self.frames.last_mut() {
            frame.index += 1;
        }
    }

    fn take_slot(&mut self) -> Slot {
        self.slot
            .take()
            .expect("value slot set before the value starts")
    }

    fn open_map(&mut self) -> Result<State, ErrorKind> {
        let slot = self.take_slot();

        if self.union_depth > 0 {
            self.union_depth += 1;
            self.expected.push(slot.expect);
            self.frames.push(Frame::Map(MapFrame::generic(FrameMode::Union)));
            self.check_lockstep();
            return Ok(State::FirstFieldReady);
        }

        let frame = match &slot.expect {
            Expect::Skip => MapFrame::generic(FrameMode::Skip),
            Expect::Typed(shape) => match shape.classify()? {
                Category::Record(r) => {
                    MapFrame::new(FrameMode::Typed, r.fields().clone(), r.rest().cloned())
                }
                Category::Map(m) => {
                    MapFrame::new(FrameMode::Typed, IndexMap::new(), Some(m.value.clone()))
                }
                Category::Json => {
                    MapFrame::new(FrameMode::Typed, IndexMap::new(), Some(self.json.clone()))
                }
                Category::Union(_) => {
                    self.union_depth += 1;
                    MapFrame::generic(FrameMode::Union)
                }
                Category::Scalar(_) | Category::Array(_) | Category::Tuple(_) => {
                    return Err(ErrorKind::ConversionFailure {
                        lexeme: "object".to_string(),
                        target: shape.to_string(),
                    });
                }
            },
        };

        self.expected.push(slot.expect);
        self.frames.push(Frame::Map(frame));
        self.check_lockstep();
        Ok(State::FirstFieldReady)
    }

    fn open_array(&mut self) -> Result<State, ErrorKind> {
        let slot = self.take_slot();

        if self.union_depth > 0 {
            self.union_depth += 1;
            self.expected.push(slot.expect);
            self.frames.push(Frame::Array(ArrayFrame {
                node: Array::new(),
                index: 0,
                mode: FrameMode::Union,
                plan: ElementPlan::None,
            }));
            self.check_lockstep();
            return Ok(State::FirstArrayElementReady);
        }

        let (mode, plan) = match &slot.expect {
            Expect::Skip => (FrameMode::Skip, ElementPlan::None),
            Expect::Typed(shape) => match shape.classify()? {
                Category::Array(a) => (
                    FrameMode::Typed,
                    ElementPlan::Uniform {
                        shape: a.element.clone(),
                        size: a.size,
                    },
                ),
                Category::Tuple(t) => (FrameMode::Typed, ElementPlan::Tuple(t.elements.clone())),
                Category::Json => (FrameMode::Typed, ElementPlan::Json),
                Category::Union(_) => {
                    self.union_depth += 1;
                    (FrameMode::Union, ElementPlan::None)
                }
                Category::Scalar(_) | Category::Record(_) | Category::Map(_) => {
                    return Err(ErrorKind::ConversionFailure {
                        lexeme: "array".to_string(),
                        target: shape.to_string(),
                    });
                }
            },
        };

        self.expected.push(slot.expect);
        self.frames.push(Frame::Array(ArrayFrame {
            node: Array::new(),
            index: 0,
            mode,
            plan,
        }));
        self.check_lockstep();
        Ok(State::FirstArrayElementReady)
    }

    /// Coerces the buffered lexeme through the pending slot and places the
    /// result.
    fn emit_scalar(&mut self, was_quoted: bool) -> Result<(), ErrorKind> {
        let lexeme = core::mem::take(&mut self.lexeme);
        let slot = self.take_slot();

        match slot.expect {
            Expect::Skip => {
                self.discard_slot_name();
                Ok(())
            }
            Expect::Typed(shape) => {
                let is_null = !was_quoted && lexeme == "null";
                if is_null && !shape.is_nilable() {
                    if slot.nilable {
                        self.place(Value::Null);
                        return Ok(());
                    }
                    if !slot.required && self.projection.nil_as_optional() {
                        self.discard_slot_name();
                        return Ok(());
                    }
                }
                let value = coerce::coerce_scalar(&lexeme, &shape, was_quoted, &self.projection)?;
                self.place(value);
                Ok(())
            }
        }
    }

    /// Drops the field name pushed for a value that produced nothing.
    fn discard_slot_name(&mut self) {
        if let Some(Frame::Map(frame)) = self.frames.last_mut() {
            frame.names.pop();
        }
    }

    fn place(&mut self, value: Value) {
        match self.frames.last_mut() {
            Some(Frame::Map(frame)) => {
                let name = frame.names.pop().expect("field name pushed before value");
                frame.node.insert(name, value);
            }
            Some(Frame::Array(frame)) => frame.node.push(value),
            None => self.root = Some(value),
        }
    }

    // ------------------------------------------------------------------
    // Finalisation
    // ------------------------------------------------------------------

    fn finalize_map(&mut self) -> Result<State, ErrorKind> {
        let Some(Frame::Map(frame)) = self.frames.pop() else {
            unreachable!("close brace outside of a map frame");
        };
        let expect = self.expected.pop().expect("expected-type stack in lockstep");
        self.check_lockstep();

        match frame.mode {
            FrameMode::Skip => self.splice_skipped(),
            FrameMode::Union => {
                self.union_depth -= 1;
                let mut value = Value::Object(frame.node);
                if self.union_depth == 0 {
                    let Expect::Typed(shape) = expect else {
                        unreachable!("union subtree with an untyped expectation");
                    };
                    value = traverse::convert(value, &self.projection, &shape)?;
                }
                self.splice(value)
            }
            FrameMode::Typed => {
                let mut node = frame.node;
                for (_, spec) in &frame.unvisited {
                    if self.projection.absent_as_nilable() && spec.nilable {
                        if spec.required {
                            node.insert(spec.declared_name.clone(), Value::Null);
                        }
                        continue;
                    }
                    if spec.required {
                        return Err(ErrorKind::RequiredFieldMissing(spec.declared_name.clone()));
                    }
                }
                self.splice(Value::Object(node))
            }
        }
    }

    fn finalize_array(&mut self) -> Result<State, ErrorKind> {
        let Some(Frame::Array(frame)) = self.frames.pop() else {
            unreachable!("close bracket outside of an array frame");
        };
        let expect = self.expected.pop().expect("expected-type stack in lockstep");
        self.check_lockstep();

        match frame.mode {
            FrameMode::Skip => self.splice_skipped(),
            FrameMode::Union => {
                self.union_depth -= 1;
                let mut value = Value::Array(frame.node);
                if self.union_depth == 0 {
                    let Expect::Typed(shape) = expect else {
                        unreachable!("union subtree with an untyped expectation");
                    };
                    value = traverse::convert(value, &self.projection, &shape)?;
                }
                self.splice(value)
            }
            // Closed arrays with fewer elements than their declared size
            // are accepted as-is.
            FrameMode::Typed => self.splice(Value::Array(frame.node)),
        }
    }

    /// Places a completed value into the parent frame, or makes it the
    /// root, and moves past it.
    fn splice(&mut self, value: Value) -> Result<State, ErrorKind> {
        match self.frames.last_mut() {
            None => {
                self.root = Some(value);
                Ok(State::DocEnd)
            }
            Some(Frame::Map(parent)) => {
                let name = parent.names.pop().expect("field name pushed before value");
                parent.node.insert(name, value);
                Ok(State::FieldEnd)
            }
            Some(Frame::Array(parent)) => {
                parent.node.push(value);
                Ok(State::ArrayElementEnd)
            }
        }
    }

    /// Moves past a skipped subtree without producing a value.
    fn splice_skipped(&mut self) -> Result<State, ErrorKind> {
        match self.frames.last_mut() {
            None => unreachable!("the root value is never skipped"),
            Some(Frame::Map(parent)) => {
                parent.names.pop();
                Ok(State::FieldEnd)
            }
            Some(Frame::Array(_)) => Ok(State::ArrayElementEnd),
        }
    }

    /// The context stack and the expected-type stack move in lockstep, and
    /// the lexeme buffer is empty at every structural boundary.
    fn check_lockstep(&self) {
        debug_assert_eq!(self.frames.len(), self.expected.len());
        debug_assert!(self.lexeme.is_empty());
    }
}

/// Dereferences aliases and readonly intersections at the document root.
fn resolve_root(shape: &Arc<Shape>) -> Result<Arc<Shape>, ErrorKind> {
    match shape.as_ref() {
        Shape::Ref(inner) => resolve_root(inner),
        Shape::Intersection(i) => {
            if i.read_only {
                resolve_root(&i.effective)
            } else {
                Err(ErrorKind::UnsupportedType(shape.to_string()))
            }
        }
        _ => Ok(shape.clone()),
    }
}
