//! Tests for schema reference resolution in various contexts.

use serde_json::json;
use waypoint::{Dialect, Pointer, SchemaParser, SchemaRouter, ValidateError};

fn scope(uri: &str) -> Pointer {
    Pointer::from_uri(uri).unwrap()
}

#[test]
fn test_local_ref_into_definitions() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({
                "definitions": {
                    "positive": {"type": "integer", "minimum": 1}
                },
                "properties": {
                    "count": {"$ref": "#/definitions/positive"}
                }
            }),
            scope("app://schemas/counts"),
        )
        .unwrap();

    assert!(schema.validate_sync(&json!({"count": 3})).is_ok());

    let err = schema.validate_sync(&json!({"count": 0})).unwrap_err();
    assert_eq!(err.as_mismatch().unwrap().keyword, "minimum");
}

#[test]
fn test_cross_document_ref_same_router() {
    let router = SchemaRouter::new();
    let parser = SchemaParser::with_router(Dialect::Draft7, router);

    parser
        .parse(
            json!({"type": "string", "minLength": 1}),
            scope("app://schemas/name"),
        )
        .unwrap();

    let user = parser
        .parse(
            json!({
                "type": "object",
                "properties": {"name": {"$ref": "app://schemas/name"}}
            }),
            scope("app://schemas/user"),
        )
        .unwrap();

    assert!(user.validate_sync(&json!({"name": "alice"})).is_ok());
    assert!(user.validate_sync(&json!({"name": ""})).is_err());
}

#[test]
fn test_relative_ref_resolves_against_scope() {
    let router = SchemaRouter::new();
    let parser = SchemaParser::with_router(Dialect::Draft7, router);

    parser
        .parse(
            json!({"type": "integer"}),
            scope("app://dir/id.json"),
        )
        .unwrap();

    let doc = parser
        .parse(
            json!({"properties": {"id": {"$ref": "id.json"}}}),
            scope("app://dir/doc.json"),
        )
        .unwrap();

    assert!(doc.validate_sync(&json!({"id": 4})).is_ok());
    assert!(doc.validate_sync(&json!({"id": "x"})).is_err());
}

#[test]
fn test_ref_through_id_alias() {
    let router = SchemaRouter::new();
    let parser = SchemaParser::with_router(Dialect::Draft7, router);

    parser
        .parse(
            json!({"$id": "urn:example:email", "type": "string", "pattern": "@"}),
            scope("app://schemas/email"),
        )
        .unwrap();

    let account = parser
        .parse(
            json!({"properties": {"email": {"$ref": "urn:example:email"}}}),
            scope("app://schemas/account"),
        )
        .unwrap();

    assert!(account
        .validate_sync(&json!({"email": "a@example.com"}))
        .is_ok());
    assert!(account.validate_sync(&json!({"email": "nope"})).is_err());
}

#[test]
fn test_circular_ref_validates_finite_instances() {
    let parser = SchemaParser::draft7();
    let person = parser
        .parse(
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "friend": {"$ref": "#"}
                },
                "required": ["name"]
            }),
            scope("app://schemas/person"),
        )
        .unwrap();

    let nested = json!({
        "name": "a",
        "friend": {"name": "b", "friend": {"name": "c"}}
    });
    assert!(person.validate_sync(&nested).is_ok());

    let broken = json!({
        "name": "a",
        "friend": {"friend": {"name": "c"}}
    });
    let err = person.validate_sync(&broken).unwrap_err();
    assert_eq!(err.as_mismatch().unwrap().keyword, "required");
}

#[test]
fn test_circular_ref_becomes_sync() {
    let parser = SchemaParser::draft7();
    let tree = parser
        .parse(
            json!({
                "type": "object",
                "properties": {
                    "children": {"type": "array", "items": {"$ref": "#"}}
                }
            }),
            scope("app://schemas/tree"),
        )
        .unwrap();

    assert!(tree
        .validate_sync(&json!({"children": [{"children": []}]}))
        .is_ok());
    assert!(tree.is_sync());
}

#[test]
fn test_unresolved_remote_ref_would_suspend() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({"$ref": "nowhere://unreachable/doc.json"}),
            scope("app://schemas/pending"),
        )
        .unwrap();

    assert!(!schema.is_sync());
    let err = schema.validate_sync(&json!(1)).unwrap_err();
    assert!(matches!(err, ValidateError::WouldSuspend));
}

#[tokio::test]
async fn test_unresolvable_ref_is_reference_error_not_mismatch() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({"$ref": "#/definitions/missing"}),
            scope("app://schemas/broken"),
        )
        .unwrap();

    let err = schema.validate(&json!(1)).await.unwrap_err();
    assert!(err.is_reference());
    assert!(!err.is_mismatch());
}

#[test]
fn test_lazy_subtree_resolution() {
    let parser = SchemaParser::draft7();
    // The nested node sits under an unrecognized keyword, so nothing
    // compiles it eagerly; resolution walks the raw document on demand.
    let schema = parser
        .parse(
            json!({
                "x-shared": {"item": {"type": "integer", "minimum": 0}},
                "properties": {"n": {"$ref": "#/x-shared/item"}}
            }),
            scope("app://schemas/lazy"),
        )
        .unwrap();

    assert!(schema.validate_sync(&json!({"n": 1})).is_ok());
    assert!(schema.validate_sync(&json!({"n": -1})).is_err());
}

#[tokio::test]
async fn test_ref_in_combinator_branches() {
    let parser = SchemaParser::draft7();
    let schema = parser
        .parse(
            json!({
                "definitions": {
                    "str": {"type": "string"},
                    "int": {"type": "integer"}
                },
                "oneOf": [
                    {"$ref": "#/definitions/str"},
                    {"$ref": "#/definitions/int"}
                ]
            }),
            scope("app://schemas/either"),
        )
        .unwrap();

    assert!(schema.validate(&json!("a")).await.is_ok());
    assert!(schema.validate(&json!(1)).await.is_ok());
    assert!(schema.validate(&json!(true)).await.is_err());
}

#[tokio::test]
async fn test_sync_flag_flips_after_async_resolution() {
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Arc;
    use waypoint::{DocumentLoader, LoadError};

    struct StaticLoader;

    #[async_trait]
    impl DocumentLoader for StaticLoader {
        async fn fetch(&self, _uri: &str) -> Result<Value, LoadError> {
            Ok(json!({"type": "integer"}))
        }
    }

    let router = SchemaRouter::new().with_loader("test", Arc::new(StaticLoader));
    let parser = SchemaParser::with_router(Dialect::Draft7, router);
    let schema = parser
        .parse(
            json!({"$ref": "test://remote/int.json"}),
            scope("app://schemas/flips"),
        )
        .unwrap();

    // Unresolved: the sync path refuses.
    assert!(matches!(
        schema.validate_sync(&json!(1)),
        Err(ValidateError::WouldSuspend)
    ));

    // The async path resolves the reference and flips the flag.
    assert!(schema.validate(&json!(1)).await.is_ok());
    assert!(schema.is_sync());
    assert!(schema.validate_sync(&json!(1)).is_ok());
    assert!(schema.validate_sync(&json!("x")).is_err());
}
