//! Tests for RFC 6901 pointer parsing, navigation and mutation.

use serde_json::json;
use waypoint::{Pointer, PointerError};

#[test]
fn test_build_parse_round_trip() {
    let ptr = Pointer::root()
        .push("users")
        .push("0")
        .push("a/b")
        .push("m~n")
        .push("");

    let reparsed = Pointer::parse(&ptr.build()).unwrap();
    assert_eq!(reparsed, ptr);
    assert_eq!(reparsed.build(), "/users/0/a~1b/m~0n/");
}

#[test]
fn test_escaping_queries() {
    assert_eq!(
        Pointer::parse("/a~1b").unwrap().query_json(&json!({"a/b": 1})),
        Some(&json!(1))
    );
    assert_eq!(
        Pointer::parse("/m~0n").unwrap().query_json(&json!({"m~n": 8})),
        Some(&json!(8))
    );
}

#[test]
fn test_root_pointer_queries_any_value() {
    for value in [json!(null), json!(7), json!("text"), json!([1]), json!({"a": 1})] {
        assert_eq!(Pointer::parse("").unwrap().query_json(&value), Some(&value));
    }
}

#[test]
fn test_append_token_writes_but_never_queries() {
    let ptr = Pointer::parse("/-").unwrap();

    let mut arr = json!([1, 2]);
    assert!(ptr.write_json(&mut arr, json!(3), false));
    assert_eq!(arr, json!([1, 2, 3]));

    // The same pointer never finds an existing element.
    assert_eq!(ptr.query_json(&arr), None);
}

#[test]
fn test_write_absent_key_without_create_missing() {
    let mut doc = json!({"present": 1});
    let before = doc.clone();

    assert!(!Pointer::parse("/absent/child")
        .unwrap()
        .write_json(&mut doc, json!(2), false));
    assert_eq!(doc, before);
}

#[test]
fn test_write_with_create_missing() {
    let mut doc = json!({});
    assert!(Pointer::parse("/a/b")
        .unwrap()
        .write_json(&mut doc, json!(true), true));
    assert_eq!(doc, json!({"a": {"b": true}}));
}

#[test]
fn test_create_missing_never_extends_arrays() {
    let mut doc = json!({"list": [1]});
    assert!(!Pointer::parse("/list/5/x")
        .unwrap()
        .write_json(&mut doc, json!(0), true));
}

#[test]
fn test_root_write_replaces_document() {
    let mut doc = json!({"old": true});
    assert!(Pointer::root().write_json(&mut doc, json!("new"), false));
    assert_eq!(doc, json!("new"));
}

#[test]
fn test_nested_array_object_navigation() {
    let doc = json!({"users": [{"email": "a@example.com"}, {"email": "b@example.com"}]});
    assert_eq!(
        Pointer::parse("/users/1/email").unwrap().query_json(&doc),
        Some(&json!("b@example.com"))
    );
    assert_eq!(Pointer::parse("/users/2/email").unwrap().query_json(&doc), None);
}

#[test]
fn test_syntax_errors_only_at_parse_time() {
    assert!(matches!(
        Pointer::parse("no-slash"),
        Err(PointerError::MissingLeadingSlash(_))
    ));
    assert!(matches!(
        Pointer::parse("/bad~9escape"),
        Err(PointerError::InvalidEscape(_))
    ));

    // Well-formed pointers never error at query time, whatever they address.
    let doc = json!({"a": 1});
    assert_eq!(Pointer::parse("/zzz/deep").unwrap().query_json(&doc), None);
}

#[test]
fn test_uri_pointers_are_not_local() {
    let remote = Pointer::from_uri("https://example.com/schema.json#/a").unwrap();
    assert!(!remote.is_local());
    assert_eq!(remote.base(), Some("https://example.com/schema.json"));

    let relative = Pointer::from_uri("other.json#/a").unwrap();
    assert!(!relative.is_local());

    let fragment_only = Pointer::from_uri("#/a").unwrap();
    assert!(fragment_only.is_local());
}

#[test]
fn test_percent_encoded_fragment() {
    let ptr = Pointer::from_uri("app://doc#/a%20b").unwrap();
    assert_eq!(ptr.query_json(&json!({"a b": 5})), Some(&json!(5)));
}

#[test]
fn test_parent_walks_toward_root() {
    let ptr = Pointer::parse("/a/b/c").unwrap();
    assert_eq!(ptr.parent().build(), "/a/b");
    assert_eq!(ptr.parent().parent().build(), "/a");
    assert!(ptr.parent().parent().parent().is_root());
    // Parent of root is a no-op.
    assert!(ptr.parent().parent().parent().parent().is_root());
}

#[test]
fn test_extend_appends_many() {
    let ptr = Pointer::root().extend(["a", "b", "c"]);
    assert_eq!(ptr.build(), "/a/b/c");
}
