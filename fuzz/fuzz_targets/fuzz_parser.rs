#![no_main]

use jsonshape::{DataProjection, ParseOptions, Parser, ProjectionFlags, Shape};
use libfuzzer_sys::fuzz_target;

fn run(data: &[u8]) {
    let Some((&flags, rest)) = data.split_first() else {
        return;
    };
    let text = String::from_utf8_lossy(rest);

    let options = ParseOptions {
        projection: match flags & 3 {
            0 => DataProjection::Strict,
            1 => DataProjection::enabled(),
            _ => DataProjection::Enabled(ProjectionFlags {
                absent_as_nilable_type: flags & 4 != 0,
                nil_as_optional_field: flags & 8 != 0,
            }),
        },
        validate_constraints: false,
    };

    // Alternate between a generic shape and a schema exercising records,
    // renames, unions, tuples and closed arrays.
    let shape = if flags & 16 == 0 {
        Shape::json()
    } else {
        Shape::record()
            .field_renamed("user-id", "userId", Shape::int())
            .optional_field("name", Shape::string())
            .field("tags", Shape::closed_array_of(Shape::string(), 4))
            .nilable()
            .field("id", Shape::union([Shape::int(), Shape::string()]))
            .rest(Shape::tuple([Shape::int(), Shape::boolean()]))
            .build()
    };

    // Parse twice on one instance: reuse must not change the outcome.
    let mut parser = Parser::new();
    let first = parser.parse_str(&text, &options, &shape);
    let second = parser.parse_str(&text, &options, &shape);
    assert_eq!(first, second);
}

fuzz_target!(|data: &[u8]| run(data));
