use super::{parse_err, strict};
use crate::{parse_str, ErrorKind, ParseError, Shape};

fn fail(text: &str, shape: &alloc::sync::Arc<Shape>) -> ParseError {
    parse_str(text, &strict(), shape).expect_err("document should be rejected")
}

#[test]
fn empty_document() {
    assert_eq!(
        fail("", &Shape::json()),
        ParseError {
            kind: ErrorKind::EmptyDocument,
            line: 1,
            column: 0,
        }
    );
    assert_eq!(fail("   ", &Shape::json()).kind, ErrorKind::EmptyDocument);
}

#[test]
fn unexpected_eof_positions() {
    let shape = Shape::map_of(Shape::int());

    for (doc, column) in [("{", 1), ("{\"a\"", 4), ("{\"a\":", 5), ("{\"a\":1", 6)] {
        assert_eq!(
            fail(doc, &shape),
            ParseError {
                kind: ErrorKind::UnexpectedEof,
                line: 1,
                column,
            },
            "{doc:?}"
        );
    }
}

#[test]
fn unexpected_eof_in_arrays_and_strings() {
    assert_eq!(
        fail("[1,", &Shape::array_of(Shape::int())).kind,
        ErrorKind::UnexpectedEof
    );
    assert_eq!(
        fail("\"abc", &Shape::string()).kind,
        ErrorKind::UnexpectedEof
    );
    assert_eq!(fail("\"ab\\", &Shape::string()).kind, ErrorKind::UnexpectedEof);
    assert_eq!(
        fail("{\"a\":{", &Shape::json()).kind,
        ErrorKind::UnexpectedEof
    );
}

#[test]
fn trailing_content() {
    assert_eq!(
        fail("{} x", &Shape::json()),
        ParseError {
            kind: ErrorKind::TrailingContent,
            line: 1,
            column: 4,
        }
    );
    assert_eq!(fail("1 2", &Shape::json()).kind, ErrorKind::TrailingContent);
    assert_eq!(fail("[] []", &Shape::json()).kind, ErrorKind::TrailingContent);
}

#[test]
fn expected_character_errors() {
    let json = Shape::json();

    assert_eq!(fail("{,}", &json).kind, ErrorKind::Expected("'\"' or '}'"));
    assert_eq!(
        fail("{\"a\" 1}", &json).kind,
        ErrorKind::Expected("':'")
    );
    assert_eq!(
        fail("{\"a\":1,}", &json).kind,
        ErrorKind::Expected("'\"'")
    );
    assert_eq!(fail("[1,]", &json).kind, ErrorKind::Expected("a value"));
    assert_eq!(
        fail("{\"a\":1 x", &json).kind,
        ErrorKind::Expected("',' or '}'")
    );
    assert_eq!(fail("[1 ;]", &json).kind, ErrorKind::Expected("',' or ']'"));
}

#[test]
fn bad_escapes() {
    assert_eq!(
        fail(r#""a\q""#, &Shape::string()),
        ParseError {
            kind: ErrorKind::BadEscape('q'),
            line: 1,
            column: 4,
        }
    );
    assert_eq!(
        fail(r#""\u00gz""#, &Shape::string()).kind,
        ErrorKind::BadHexEscape('g')
    );
}

#[test]
fn unpaired_surrogates() {
    assert_eq!(
        fail(r#""\uD800""#, &Shape::string()).kind,
        ErrorKind::UnpairedSurrogate(0xD800)
    );
    assert_eq!(
        fail(r#""\uDC00""#, &Shape::string()).kind,
        ErrorKind::UnpairedSurrogate(0xDC00)
    );
    assert_eq!(
        fail(r#""\uD800x""#, &Shape::string()).kind,
        ErrorKind::UnpairedSurrogate(0xD800)
    );
    assert_eq!(
        fail(r#""\uD800\n""#, &Shape::string()).kind,
        ErrorKind::UnpairedSurrogate(0xD800)
    );
    // The pair's second escape decodes to a non-surrogate.
    assert_eq!(
        fail(r#""\uD800\u0041""#, &Shape::string()).kind,
        ErrorKind::UnpairedSurrogate(0x0041)
    );
}

#[test]
fn error_location_tracks_lines() {
    let shape = Shape::record().build();

    let err = fail("{\n\"a\": true\n}", &shape);
    assert_eq!(
        err,
        ParseError {
            kind: ErrorKind::UndefinedField("a".into()),
            line: 2,
            column: 3,
        }
    );
}

#[test]
fn unconvertible_lexeme_is_reported() {
    let shape = Shape::map_of(Shape::int());
    assert_eq!(
        parse_err("{\"a\":tru}", &strict(), &shape),
        ErrorKind::ConversionFailure {
            lexeme: "tru".into(),
            target: "int".into(),
        }
    );
}
