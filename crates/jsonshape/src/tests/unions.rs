use alloc::vec;

use super::{object, parse_err, parse_ok, projecting, strict};
use crate::{ErrorKind, Shape, Value};

#[test]
fn scalar_union_picks_by_kind() {
    let shape = Shape::union([Shape::int(), Shape::string()]);

    assert_eq!(parse_ok("42", &strict(), &shape), Value::Int(42));
    assert_eq!(
        parse_ok("\"42\"", &strict(), &shape),
        Value::String("42".into())
    );
}

#[test]
fn union_members_tried_in_declaration_order() {
    // An integer lexeme satisfies both members; the first one wins.
    let shape = Shape::union([Shape::float(), Shape::int()]);
    assert_eq!(parse_ok("7", &strict(), &shape), Value::Float(7.0));
}

#[test]
fn nilable_union_accepts_null() {
    let shape = Shape::nilable(Shape::int());
    assert_eq!(parse_ok("null", &strict(), &shape), Value::Null);
    assert_eq!(parse_ok("3", &strict(), &shape), Value::Int(3));
}

#[test]
fn union_mismatch_fails() {
    let shape = Shape::union([Shape::int(), Shape::string()]);
    assert!(matches!(
        parse_err("true", &strict(), &shape),
        ErrorKind::ConversionFailure { .. }
    ));
}

#[test]
fn union_member_bounds_are_checked() {
    let shape = Shape::union([Shape::int_width(crate::IntWidth::U8), Shape::string()]);
    assert_eq!(parse_ok("200", &strict(), &shape), Value::Int(200));
    assert!(matches!(
        parse_err("300", &strict(), &shape),
        ErrorKind::ConversionFailure { .. }
    ));
}

#[test]
fn union_object_subtree_coerced_at_boundary() {
    let point = Shape::record().field("x", Shape::int()).build();
    let shape = Shape::union([point, Shape::string()]);

    assert_eq!(
        parse_ok(r#"{"x": 5}"#, &strict(), &shape),
        object([("x", Value::Int(5))])
    );
    assert_eq!(
        parse_ok("\"origin\"", &strict(), &shape),
        Value::String("origin".into())
    );
}

#[test]
fn union_prefers_record_over_map() {
    let named = Shape::record().field("a", Shape::int()).build();
    let shape = Shape::union([named, Shape::map_of(Shape::string())]);

    assert_eq!(
        parse_ok(r#"{"a": 1}"#, &strict(), &shape),
        object([("a", Value::Int(1))])
    );
    // No `a` field, so the record member is rejected and the map wins.
    assert_eq!(
        parse_ok(r#"{"b": "x"}"#, &strict(), &shape),
        object([("b", Value::String("x".into()))])
    );
}

#[test]
fn union_array_subtree() {
    let shape = Shape::union([Shape::array_of(Shape::int()), Shape::string()]);
    assert_eq!(
        parse_ok("[1, 2]", &strict(), &shape),
        Value::Array(vec![Value::Int(1), Value::Int(2)])
    );
}

#[test]
fn nested_containers_inside_union_subtree() {
    let shape = Shape::union([
        Shape::map_of(Shape::array_of(Shape::int())),
        Shape::string(),
    ]);

    assert_eq!(
        parse_ok(r#"{"a": [1], "b": [2, 3]}"#, &strict(), &shape),
        object([
            ("a", Value::Array(vec![Value::Int(1)])),
            ("b", Value::Array(vec![Value::Int(2), Value::Int(3)])),
        ])
    );
}

#[test]
fn union_typed_record_field() {
    let shape = Shape::record()
        .field("id", Shape::union([Shape::int(), Shape::string()]))
        .build();

    assert_eq!(
        parse_ok(r#"{"id": 7}"#, &strict(), &shape),
        object([("id", Value::Int(7))])
    );
    assert_eq!(
        parse_ok(r#"{"id": "seven"}"#, &strict(), &shape),
        object([("id", Value::String("seven".into()))])
    );
}

#[test]
fn union_typed_array_elements() {
    let shape = Shape::array_of(Shape::union([Shape::int(), Shape::string()]));
    assert_eq!(
        parse_ok(r#"[1, "a", 2]"#, &strict(), &shape),
        Value::Array(vec![
            Value::Int(1),
            Value::String("a".into()),
            Value::Int(2),
        ])
    );
}

#[test]
fn union_fallback_applies_projection_flags() {
    let member = Shape::record()
        .field("a", Shape::int())
        .build();
    let shape = Shape::union([member, Shape::boolean()]);

    // The record member rejects the extra key under strict projection, and
    // the boolean member cannot accept an object.
    assert!(matches!(
        parse_err(r#"{"a": 1, "extra": 2}"#, &strict(), &shape),
        ErrorKind::ConversionFailure { .. }
    ));
    // With projection on, the extra key is dropped inside the fallback.
    assert_eq!(
        parse_ok(r#"{"a": 1, "extra": 2}"#, &projecting(), &shape),
        object([("a", Value::Int(1))])
    );
}

#[test]
fn union_of_unions() {
    let inner = Shape::union([Shape::int(), Shape::string()]);
    let shape = Shape::union([Shape::boolean(), inner]);

    assert_eq!(parse_ok("true", &strict(), &shape), Value::Bool(true));
    assert_eq!(parse_ok("8", &strict(), &shape), Value::Int(8));
    assert_eq!(
        parse_ok("\"s\"", &strict(), &shape),
        Value::String("s".into())
    );
}
