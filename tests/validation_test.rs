//! End-to-end validation tests for leaf keywords and dialect behavior.

use serde_json::json;
use waypoint::{Dialect, Pointer, SchemaParser, SchemaRouter, StructureError};

fn scope(uri: &str) -> Pointer {
    Pointer::from_uri(uri).unwrap()
}

#[test]
fn test_end_to_end_object_schema() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({
                "type": "object",
                "properties": {"n": {"type": "integer", "minimum": 0}},
                "required": ["n"]
            }),
            scope("app://schemas/main"),
        )
        .unwrap();

    assert!(schema.validate_sync(&json!({"n": 5})).is_ok());

    let err = schema.validate_sync(&json!({"n": -1})).unwrap_err();
    assert_eq!(err.as_mismatch().unwrap().keyword, "minimum");

    let err = schema.validate_sync(&json!({})).unwrap_err();
    assert_eq!(err.as_mismatch().unwrap().keyword, "required");
}

#[test]
fn test_type_failure_wins_over_required() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({"required": ["a"], "type": "object"}),
            scope("app://schemas/priority"),
        )
        .unwrap();

    // A non-object violates both keywords; the type failure is reported.
    let err = schema.validate_sync(&json!(3)).unwrap_err();
    assert_eq!(err.as_mismatch().unwrap().keyword, "type");
}

#[test]
fn test_mismatch_carries_sub_schema_scope() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({"properties": {"n": {"minimum": 0}}}),
            scope("app://schemas/scoped"),
        )
        .unwrap();

    let err = schema.validate_sync(&json!({"n": -1})).unwrap_err();
    let mismatch = err.as_mismatch().unwrap();
    assert_eq!(
        mismatch.scope.as_ref().unwrap().to_uri(),
        "app://schemas/scoped#/properties/n"
    );
}

#[test]
fn test_boolean_schemas() {
    let parser = SchemaParser::draft7();
    let anything = parser.parse(json!(true), scope("app://schemas/yes")).unwrap();
    let nothing = parser.parse(json!(false), scope("app://schemas/no")).unwrap();

    for value in [json!(null), json!(1), json!({"a": 1})] {
        assert!(anything.validate_sync(&value).is_ok());
        assert!(nothing.validate_sync(&value).is_err());
    }
}

#[test]
fn test_string_constraints() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({"type": "string", "minLength": 2, "maxLength": 4, "pattern": "^[a-z]+$"}),
            scope("app://schemas/name"),
        )
        .unwrap();

    assert!(schema.validate_sync(&json!("abc")).is_ok());
    assert!(schema.validate_sync(&json!("a")).is_err());
    assert!(schema.validate_sync(&json!("abcde")).is_err());
    assert!(schema.validate_sync(&json!("ABC")).is_err());
}

#[test]
fn test_numeric_constraints() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({"type": "number", "exclusiveMinimum": 0, "maximum": 100, "multipleOf": 5}),
            scope("app://schemas/score"),
        )
        .unwrap();

    assert!(schema.validate_sync(&json!(5)).is_ok());
    assert!(schema.validate_sync(&json!(100)).is_ok());
    assert!(schema.validate_sync(&json!(0)).is_err());
    assert!(schema.validate_sync(&json!(101)).is_err());
    assert!(schema.validate_sync(&json!(7)).is_err());
}

#[test]
fn test_array_constraints() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({
                "type": "array",
                "items": {"type": "integer"},
                "minItems": 1,
                "maxItems": 3,
                "uniqueItems": true
            }),
            scope("app://schemas/ids"),
        )
        .unwrap();

    assert!(schema.validate_sync(&json!([1, 2])).is_ok());
    assert!(schema.validate_sync(&json!([])).is_err());
    assert!(schema.validate_sync(&json!([1, 2, 3, 4])).is_err());
    assert!(schema.validate_sync(&json!([1, 1])).is_err());
    assert!(schema.validate_sync(&json!([1, "x"])).is_err());
}

#[test]
fn test_positional_items_with_additional_denied() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({
                "items": [{"type": "string"}, {"type": "integer"}],
                "additionalItems": false
            }),
            scope("app://schemas/pair"),
        )
        .unwrap();

    assert!(schema.validate_sync(&json!(["a", 1])).is_ok());
    assert!(schema.validate_sync(&json!(["a"])).is_ok());
    assert!(schema.validate_sync(&json!([1, "a"])).is_err());

    let err = schema.validate_sync(&json!(["a", 1, true])).unwrap_err();
    assert_eq!(err.as_mismatch().unwrap().keyword, "additionalItems");
}

#[test]
fn test_contains() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({"contains": {"type": "integer", "minimum": 10}}),
            scope("app://schemas/contains"),
        )
        .unwrap();

    assert!(schema.validate_sync(&json!([1, 20, "x"])).is_ok());
    assert!(schema.validate_sync(&json!([1, 2, "x"])).is_err());
    assert!(schema.validate_sync(&json!([])).is_err());
}

#[test]
fn test_additional_properties_denied_names_the_key() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({
                "properties": {"name": {"type": "string"}},
                "patternProperties": {"^x-": true},
                "additionalProperties": false
            }),
            scope("app://schemas/strict"),
        )
        .unwrap();

    assert!(schema
        .validate_sync(&json!({"name": "a", "x-extra": 1}))
        .is_ok());

    let err = schema
        .validate_sync(&json!({"name": "a", "rogue": 1}))
        .unwrap_err();
    let mismatch = err.as_mismatch().unwrap();
    assert_eq!(mismatch.keyword, "additionalProperties");
    assert!(mismatch.message.contains("rogue"));
}

#[test]
fn test_key_matching_several_patterns_must_satisfy_all() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({
                "patternProperties": {
                    "^a": {"type": "integer"},
                    "b$": {"minimum": 10}
                }
            }),
            scope("app://schemas/patterns"),
        )
        .unwrap();

    // "ab" matches both patterns, so both schemas apply.
    assert!(schema.validate_sync(&json!({"ab": 12})).is_ok());
    assert!(schema.validate_sync(&json!({"ab": 5})).is_err());
    assert!(schema.validate_sync(&json!({"ab": 12.5})).is_err());
}

#[test]
fn test_dependencies_both_forms() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({
                "dependencies": {
                    "credit_card": ["billing_address"],
                    "shipping": {"required": ["country"]}
                }
            }),
            scope("app://schemas/deps"),
        )
        .unwrap();

    assert!(schema.validate_sync(&json!({"name": "a"})).is_ok());
    assert!(schema
        .validate_sync(&json!({"credit_card": "42", "billing_address": "x"}))
        .is_ok());
    assert!(schema.validate_sync(&json!({"credit_card": "42"})).is_err());
    assert!(schema
        .validate_sync(&json!({"shipping": true, "country": "de"}))
        .is_ok());
    assert!(schema.validate_sync(&json!({"shipping": true})).is_err());
}

#[test]
fn test_enum_and_const() {
    let parser = SchemaParser::draft7();
    let color = parser
        .parse(
            json!({"enum": ["red", "green", "blue"]}),
            scope("app://schemas/color"),
        )
        .unwrap();
    assert!(color.validate_sync(&json!("green")).is_ok());
    assert!(color.validate_sync(&json!("yellow")).is_err());

    let fixed = parser
        .parse(json!({"const": 42}), scope("app://schemas/fixed"))
        .unwrap();
    assert!(fixed.validate_sync(&json!(42)).is_ok());
    assert!(fixed.validate_sync(&json!(41)).is_err());
}

#[test]
fn test_format_keyword() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({"type": "string", "format": "email"}),
            scope("app://schemas/email"),
        )
        .unwrap();
    assert!(schema.validate_sync(&json!("a@example.com")).is_ok());
    assert!(schema.validate_sync(&json!("not-an-email")).is_err());

    // Unknown format names are ignored, not errors.
    let unknown = parser
        .parse(
            json!({"type": "string", "format": "no-such-format"}),
            scope("app://schemas/unknown-format"),
        )
        .unwrap();
    assert!(unknown.validate_sync(&json!("anything")).is_ok());
}

#[test]
fn test_unknown_keywords_are_ignored() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({"type": "integer", "x-vendor-extension": {"weird": true}}),
            scope("app://schemas/vendor"),
        )
        .unwrap();
    assert!(schema.validate_sync(&json!(1)).is_ok());
}

#[test]
fn test_nullable_only_under_openapi3() {
    let doc = json!({"type": "string", "nullable": true});

    let draft = SchemaParser::draft7();
    let strict = draft.parse(doc.clone(), scope("app://schemas/d7")).unwrap();
    assert!(strict.validate_sync(&json!(null)).is_err());

    let openapi = SchemaParser::openapi3();
    let lenient = openapi.parse(doc, scope("app://schemas/oa3")).unwrap();
    assert!(lenient.validate_sync(&json!(null)).is_ok());
    assert!(lenient.validate_sync(&json!("text")).is_ok());
    assert!(lenient.validate_sync(&json!(1)).is_err());
}

#[test]
fn test_openapi3_boolean_exclusive_bounds() {
    let parser = SchemaParser::openapi3();
    let schema = parser
        .parse(
            json!({"type": "number", "minimum": 0, "exclusiveMinimum": true}),
            scope("app://schemas/oa3-range"),
        )
        .unwrap();

    assert!(schema.validate_sync(&json!(1)).is_ok());
    assert!(schema.validate_sync(&json!(0)).is_err());
}

#[test]
fn test_structure_errors_at_compile_time() {
    let parser = SchemaParser::draft7();

    let err = parser
        .parse(json!({"type": 5}), scope("app://bad/type"))
        .unwrap_err();
    assert!(matches!(err, StructureError::WrongType { keyword: "type", .. }));

    let err = parser
        .parse(json!({"pattern": "a("}), scope("app://bad/pattern"))
        .unwrap_err();
    assert!(matches!(
        err,
        StructureError::InvalidRegex { keyword: "pattern", .. }
    ));

    let err = parser
        .parse(json!({"minimum": null}), scope("app://bad/null"))
        .unwrap_err();
    assert!(matches!(err, StructureError::NullKeyword { keyword: "minimum" }));

    let err = parser
        .parse(json!("not a schema"), scope("app://bad/shape"))
        .unwrap_err();
    assert!(matches!(err, StructureError::NotASchema { got: "string" }));

    let err = parser
        .parse_str("{not json", scope("app://bad/json"))
        .unwrap_err();
    assert!(matches!(err, StructureError::InvalidJson(_)));
}

#[test]
fn test_parse_str_entry_point() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse_str(r#"{"type": "integer"}"#, scope("app://schemas/text"))
        .unwrap();
    assert!(schema.validate_sync(&json!(3)).is_ok());
    assert!(schema.validate_sync(&json!("x")).is_err());
}

#[tokio::test]
async fn test_async_validate_on_local_schema() {
    let parser = SchemaParser::with_router(Dialect::Draft7, SchemaRouter::new());
    let schema = parser
        .parse(
            json!({"type": "array", "items": {"type": "integer", "minimum": 0}}),
            scope("app://schemas/async-local"),
        )
        .unwrap();

    assert!(schema.validate(&json!([0, 1, 2])).await.is_ok());
    let err = schema.validate(&json!([0, -1])).await.unwrap_err();
    assert_eq!(err.as_mismatch().unwrap().keyword, "minimum");
}
