//! Tests for the filesystem document loader.

use serde_json::json;
use waypoint::{Dialect, Pointer, SchemaParser, SchemaRouter};

fn scope(uri: &str) -> Pointer {
    Pointer::from_uri(uri).unwrap()
}

fn write_schema(dir: &std::path::Path, name: &str, content: &serde_json::Value) {
    std::fs::write(dir.join(name), serde_json::to_string_pretty(content).unwrap()).unwrap();
}

#[tokio::test]
async fn test_ref_to_file_document() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(
        dir.path(),
        "age.json",
        &json!({"type": "integer", "minimum": 0, "maximum": 150}),
    );

    let parser = SchemaParser::draft7();
    let uri = format!("file://{}/age.json", dir.path().display());
    let schema = parser
        .parse(json!({"$ref": uri}), scope("app://schemas/age"))
        .unwrap();

    assert!(schema.validate(&json!(30)).await.is_ok());
    assert!(schema.validate(&json!(-1)).await.is_err());
}

#[tokio::test]
async fn test_relative_ref_between_files() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(
        dir.path(),
        "address.json",
        &json!({"type": "object", "required": ["city"]}),
    );
    write_schema(
        dir.path(),
        "user.json",
        &json!({
            "type": "object",
            "properties": {"address": {"$ref": "address.json"}}
        }),
    );

    let parser = SchemaParser::draft7();
    let uri = format!("file://{}/user.json", dir.path().display());
    let schema = parser
        .parse(json!({"$ref": uri}), scope("app://schemas/user"))
        .unwrap();

    // Resolving user.json pulls address.json through a scope-relative ref.
    assert!(schema
        .validate(&json!({"address": {"city": "berlin"}}))
        .await
        .is_ok());
    assert!(schema
        .validate(&json!({"address": {"street": "x"}}))
        .await
        .is_err());
}

#[tokio::test]
async fn test_fragment_into_file_document() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(
        dir.path(),
        "defs.json",
        &json!({
            "definitions": {
                "code": {"type": "string", "pattern": "^[A-Z]{3}$"}
            }
        }),
    );

    let parser = SchemaParser::draft7();
    let uri = format!("file://{}/defs.json#/definitions/code", dir.path().display());
    let schema = parser
        .parse(json!({"$ref": uri}), scope("app://schemas/code"))
        .unwrap();

    assert!(schema.validate(&json!("ABC")).await.is_ok());
    assert!(schema.validate(&json!("abc")).await.is_err());
}

#[tokio::test]
async fn test_missing_file_is_reference_error() {
    let dir = tempfile::tempdir().unwrap();
    let parser = SchemaParser::draft7();
    let uri = format!("file://{}/no-such-file.json", dir.path().display());
    let schema = parser
        .parse(json!({"$ref": uri}), scope("app://schemas/missing"))
        .unwrap();

    let err = schema.validate(&json!(1)).await.unwrap_err();
    assert!(err.is_reference());
}

#[tokio::test]
async fn test_malformed_file_is_reference_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();

    let router = SchemaRouter::new();
    let parser = SchemaParser::with_router(Dialect::Draft7, router);
    let uri = format!("file://{}/broken.json", dir.path().display());
    let schema = parser
        .parse(json!({"$ref": uri}), scope("app://schemas/broken-file"))
        .unwrap();

    let err = schema.validate(&json!(1)).await.unwrap_err();
    assert!(err.is_reference());
}
