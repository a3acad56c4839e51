//! The union-fallback converter.
//!
//! Subtrees whose expected shape is a union are parsed generically; when
//! such a subtree completes, the accumulated value is walked against the
//! union and coerced into the first member that accepts it. The walk
//! applies the same projection policy as the parser proper.

use alloc::string::ToString;

use crate::{
    error::ErrorKind,
    options::DataProjection,
    schema::{ArrayShape, Category, MapShape, RecordShape, ScalarKind, Shape, TupleShape},
    value::{Map, Value},
};

fn mismatch(value: &Value, shape: &Shape) -> ErrorKind {
    ErrorKind::ConversionFailure {
        lexeme: value.to_string(),
        target: shape.to_string(),
    }
}

/// Coerces a generically parsed value into `shape`.
///
/// Union members are tried in declaration order; the first that accepts
/// the value wins.
pub(crate) fn convert(
    value: Value,
    projection: &DataProjection,
    shape: &Shape,
) -> Result<Value, ErrorKind> {
    match shape.classify()? {
        Category::Json => Ok(value),
        Category::Union(u) => {
            for member in &u.members {
                if let Ok(converted) = convert(value.clone(), projection, member) {
                    return Ok(converted);
                }
            }
            Err(mismatch(&value, shape))
        }
        Category::Scalar(kind) => convert_scalar(value, kind, shape),
        Category::Record(r) => convert_record(value, projection, r, shape),
        Category::Map(m) => convert_map(value, projection, m, shape),
        Category::Array(a) => convert_array(value, projection, a, shape),
        Category::Tuple(t) => convert_tuple(value, projection, t, shape),
    }
}

fn convert_scalar(value: Value, kind: ScalarKind, shape: &Shape) -> Result<Value, ErrorKind> {
    match (kind, value) {
        (ScalarKind::Null, Value::Null) => Ok(Value::Null),
        (ScalarKind::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
        (ScalarKind::Int(width), Value::Int(n)) if width.contains(n) => Ok(Value::Int(n)),
        (ScalarKind::Float, Value::Float(f) | Value::Decimal(f)) => Ok(Value::Float(f)),
        #[allow(clippy::cast_precision_loss)]
        (ScalarKind::Float, Value::Int(n)) => Ok(Value::Float(n as f64)),
        (ScalarKind::Decimal, Value::Float(f) | Value::Decimal(f)) => Ok(Value::Decimal(f)),
        #[allow(clippy::cast_precision_loss)]
        (ScalarKind::Decimal, Value::Int(n)) => Ok(Value::Decimal(n as f64)),
        (ScalarKind::String, Value::String(s)) => Ok(Value::String(s)),
        (ScalarKind::CharString, Value::String(s)) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(_), None) => Ok(Value::String(s)),
                _ => Err(mismatch(&Value::String(s), shape)),
            }
        }
        (_, value) => Err(mismatch(&value, shape)),
    }
}

fn convert_record(
    value: Value,
    projection: &DataProjection,
    record: &RecordShape,
    shape: &Shape,
) -> Result<Value, ErrorKind> {
    let Value::Object(map) = value else {
        return Err(mismatch(&value, shape));
    };

    let mut out = Map::with_capacity(map.len());
    for (wire_name, field_value) in map {
        match record.fields().get(&wire_name) {
            Some(spec) => {
                if field_value.is_null() && !spec.shape.is_nilable() {
                    if spec.nilable {
                        out.insert(spec.declared_name.clone(), Value::Null);
                        continue;
                    }
                    if !spec.required && projection.nil_as_optional() {
                        continue;
                    }
                }
                let converted = convert(field_value, projection, &spec.shape)?;
                out.insert(spec.declared_name.clone(), converted);
            }
            None => match record.rest() {
                Some(rest) => {
                    let converted = convert(field_value, projection, rest)?;
                    out.insert(wire_name, converted);
                }
                None if projection.is_enabled() => {}
                None => return Err(ErrorKind::UndefinedField(wire_name)),
            },
        }
    }

    for (_, spec) in record.fields() {
        if out.contains_key(&spec.declared_name) {
            continue;
        }
        if projection.absent_as_nilable() && spec.nilable {
            if spec.required {
                out.insert(spec.declared_name.clone(), Value::Null);
            }
            continue;
        }
        if spec.required {
            return Err(ErrorKind::RequiredFieldMissing(spec.declared_name.clone()));
        }
    }

    Ok(Value::Object(out))
}

fn convert_map(
    value: Value,
    projection: &DataProjection,
    map_shape: &MapShape,
    shape: &Shape,
) -> Result<Value, ErrorKind> {
    let Value::Object(map) = value else {
        return Err(mismatch(&value, shape));
    };

    let mut out = Map::with_capacity(map.len());
    for (key, field_value) in map {
        out.insert(key, convert(field_value, projection, &map_shape.value)?);
    }
    Ok(Value::Object(out))
}

fn convert_array(
    value: Value,
    projection: &DataProjection,
    array: &ArrayShape,
    shape: &Shape,
) -> Result<Value, ErrorKind> {
    let Value::Array(mut elements) = value else {
        return Err(mismatch(&value, shape));
    };

    if let Some(size) = array.size {
        if elements.len() > size {
            if !projection.is_enabled() {
                return Err(ErrorKind::ArrayTooLong(size));
            }
            elements.truncate(size);
        }
    }

    elements
        .into_iter()
        .map(|e| convert(e, projection, &array.element))
        .collect::<Result<_, _>>()
        .map(Value::Array)
}

fn convert_tuple(
    value: Value,
    projection: &DataProjection,
    tuple: &TupleShape,
    shape: &Shape,
) -> Result<Value, ErrorKind> {
    let Value::Array(mut elements) = value else {
        return Err(mismatch(&value, shape));
    };

    let size = tuple.elements.len();
    if elements.len() > size {
        if !projection.is_enabled() {
            return Err(ErrorKind::ArrayTooLong(size));
        }
        elements.truncate(size);
    }

    elements
        .into_iter()
        .zip(&tuple.elements)
        .map(|(e, member)| convert(e, projection, member))
        .collect::<Result<_, _>>()
        .map(Value::Array)
}
