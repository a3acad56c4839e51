use alloc::{string::String, vec};

use super::{object, parse_err, parse_ok, projecting, strict};
use crate::{ErrorKind, Shape, Value};

#[test]
fn record_with_renamed_field() {
    let shape = Shape::record()
        .field_renamed("user-id", "userId", Shape::int())
        .field("name", Shape::string())
        .build();

    let value = parse_ok(r#"{"user-id": 7, "name": "Ada"}"#, &strict(), &shape);
    assert_eq!(
        value,
        object([("userId", Value::Int(7)), ("name", Value::String("Ada".into()))])
    );
}

#[test]
fn field_order_mirrors_document_order() {
    let shape = Shape::record()
        .field("a", Shape::int())
        .field("b", Shape::int())
        .build();

    let value = parse_ok(r#"{"b": 2, "a": 1}"#, &strict(), &shape);
    let keys: vec::Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["b", "a"]);
}

#[test]
fn undeclared_field_fails_when_strict() {
    let shape = Shape::record().field("name", Shape::string()).build();

    assert_eq!(
        parse_err(r#"{"name": "Ada", "extra": true}"#, &strict(), &shape),
        ErrorKind::UndefinedField("extra".into())
    );
}

#[test]
fn undeclared_field_dropped_when_projecting() {
    let shape = Shape::record()
        .field_renamed("user-id", "userId", Shape::int())
        .field("name", Shape::string())
        .build();

    let value = parse_ok(
        r#"{"user-id": 7, "name": "Ada", "extra": true}"#,
        &projecting(),
        &shape,
    );
    assert_eq!(
        value,
        object([("userId", Value::Int(7)), ("name", Value::String("Ada".into()))])
    );
}

#[test]
fn undeclared_container_dropped_when_projecting() {
    let shape = Shape::record().field("a", Shape::int()).build();

    let value = parse_ok(
        r#"{"extra": {"deep": [1, {"x": null}]}, "a": 1}"#,
        &projecting(),
        &shape,
    );
    assert_eq!(value, object([("a", Value::Int(1))]));
}

#[test]
fn rest_type_admits_undeclared_fields() {
    let shape = Shape::record()
        .field("a", Shape::int())
        .rest(Shape::string())
        .build();

    let value = parse_ok(r#"{"a": 1, "b": "x"}"#, &strict(), &shape);
    assert_eq!(
        value,
        object([("a", Value::Int(1)), ("b", Value::String("x".into()))])
    );
}

#[test]
fn rest_type_is_enforced() {
    let shape = Shape::record()
        .field("a", Shape::int())
        .rest(Shape::string())
        .build();

    assert_eq!(
        parse_err(r#"{"a": 1, "b": 2}"#, &strict(), &shape),
        ErrorKind::ConversionFailure {
            lexeme: "2".into(),
            target: "string".into(),
        }
    );
}

#[test]
fn repeated_key_resolves_to_same_declared_field() {
    let shape = Shape::record()
        .field_renamed("user-id", "userId", Shape::int())
        .build();

    // Last write wins; the rename from the first resolution still applies.
    let value = parse_ok(r#"{"user-id": 1, "user-id": 2}"#, &strict(), &shape);
    assert_eq!(value, object([("userId", Value::Int(2))]));
}

#[test]
fn map_duplicate_keys_last_write_wins() {
    let shape = Shape::map_of(Shape::int());

    let value = parse_ok(r#"{"k": 1, "k": 2}"#, &strict(), &shape);
    assert_eq!(value, object([("k", Value::Int(2))]));
}

#[test]
fn nested_records() {
    let inner = Shape::record().field("x", Shape::int()).build();
    let shape = Shape::record()
        .field("point", inner)
        .field("tag", Shape::string())
        .build();

    let value = parse_ok(r#"{"point": {"x": 3}, "tag": "p"}"#, &strict(), &shape);
    assert_eq!(
        value,
        object([
            ("point", object([("x", Value::Int(3))])),
            ("tag", Value::String("p".into())),
        ])
    );
}

#[test]
fn missing_required_field_fails() {
    let shape = Shape::record()
        .field("a", Shape::int())
        .field("b", Shape::int())
        .build();

    assert_eq!(
        parse_err(r#"{"a": 1}"#, &strict(), &shape),
        ErrorKind::RequiredFieldMissing("b".into())
    );
}

#[test]
fn missing_required_field_fails_in_empty_object() {
    let shape = Shape::record().field("a", Shape::int()).build();

    assert_eq!(
        parse_err("{}", &strict(), &shape),
        ErrorKind::RequiredFieldMissing("a".into())
    );
}

#[test]
fn missing_optional_field_is_omitted() {
    let shape = Shape::record()
        .field("a", Shape::int())
        .optional_field("b", Shape::int())
        .build();

    let value = parse_ok(r#"{"a": 1}"#, &strict(), &shape);
    assert_eq!(value, object([("a", Value::Int(1))]));
}

#[test]
fn explicit_null_for_nilable_field() {
    let shape = Shape::record()
        .field("a", Shape::int())
        .field("b", Shape::int())
        .nilable()
        .build();

    let value = parse_ok(r#"{"a": 1, "b": null}"#, &strict(), &shape);
    assert_eq!(value, object([("a", Value::Int(1)), ("b", Value::Null)]));
}

#[test]
fn explicit_null_for_union_typed_field() {
    let shape = Shape::record()
        .field("b", Shape::nilable(Shape::int()))
        .build();

    let value = parse_ok(r#"{"b": null}"#, &strict(), &shape);
    assert_eq!(value, object([("b", Value::Null)]));
}

#[test]
fn map_of_records() {
    let entry = Shape::record().field("n", Shape::int()).build();
    let shape = Shape::map_of(entry);

    let value = parse_ok(r#"{"first": {"n": 1}, "second": {"n": 2}}"#, &strict(), &shape);
    assert_eq!(
        value,
        object([
            ("first", object([("n", Value::Int(1))])),
            ("second", object([("n", Value::Int(2))])),
        ])
    );
}

#[test]
fn json_rest_accepts_anything() {
    let shape = Shape::record()
        .field("a", Shape::int())
        .rest(Shape::json())
        .build();

    let value = parse_ok(r#"{"a": 1, "b": [true, null], "c": {"d": 2}}"#, &strict(), &shape);
    assert_eq!(
        value,
        object([
            ("a", Value::Int(1)),
            ("b", Value::Array(vec![Value::Bool(true), Value::Null])),
            ("c", object([("d", Value::Int(2))])),
        ])
    );
}

#[test]
fn empty_object_for_json_shape() {
    let value = parse_ok("{}", &strict(), &Shape::json());
    assert_eq!(value, Value::Object(crate::Map::new()));
}

#[test]
fn alias_resolved_on_entry() {
    let target = Shape::record().field("a", Shape::int()).build();
    let shape = Shape::reference(Shape::reference(target));

    let value = parse_ok(r#"{"a": 1}"#, &strict(), &shape);
    assert_eq!(value, object([("a", Value::Int(1))]));
}

#[test]
fn readonly_intersection_delegates_to_effective_type() {
    let effective = Shape::record().field("a", Shape::int()).build();
    let shape = Shape::intersection(effective, true);

    let value = parse_ok(r#"{"a": 1}"#, &strict(), &shape);
    assert_eq!(value, object([("a", Value::Int(1))]));
}

#[test]
fn non_readonly_intersection_is_unsupported() {
    let effective = Shape::record().field("a", Shape::int()).build();
    let shape = Shape::intersection(effective, false);

    assert!(matches!(
        parse_err(r#"{"a": 1}"#, &strict(), &shape),
        ErrorKind::UnsupportedType(_)
    ));
}

#[test]
fn scalar_shape_rejects_object() {
    assert!(matches!(
        parse_err(r#"{"a": 1}"#, &strict(), &Shape::int()),
        ErrorKind::ConversionFailure { .. }
    ));
}
