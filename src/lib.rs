//! # Waypoint
//!
//! JSON Schema validation (draft-7 and OpenAPI-3 dialects) built on a
//! standalone RFC 6901 JSON Pointer implementation and a URI-keyed schema
//! router for `$ref`/`$id` resolution.
//!
//! ## Overview
//!
//! Hand a [`SchemaParser`] a schema document and get back a reusable
//! [`Schema`]; hand the schema a JSON value and get back a validation
//! result. Validation is first-failure-wins: a single call yields either
//! success or exactly one reported mismatch or reference error, with the
//! offending keyword, value and sub-schema scope attached.
//!
//! Remote references suspend: [`Schema::validate`] is async and resolves
//! them through the [`SchemaRouter`], deduplicating concurrent fetches per
//! URI. Once every reachable reference has resolved, the schema's sync flag
//! flips and [`Schema::validate_sync`] becomes available for callers who
//! want to avoid the async path entirely.
//!
//! ## Core Types
//!
//! - [`Pointer`]: RFC 6901 JSON Pointer with query/write over JSON documents
//! - [`SchemaParser`]: compiles schema documents into validators
//! - [`Schema`]: a compiled, reusable schema
//! - [`SchemaRouter`]: the URI-keyed registry behind `$ref` resolution
//! - [`ValidateError`]: mismatch / reference-error / would-suspend outcomes
//!
//! ## Example
//!
//! ```rust
//! use waypoint::{Pointer, SchemaParser};
//! use serde_json::json;
//!
//! let parser = SchemaParser::draft7();
//! let schema = parser
//!     .parse(
//!         json!({
//!             "type": "object",
//!             "properties": {"n": {"type": "integer", "minimum": 0}},
//!             "required": ["n"]
//!         }),
//!         Pointer::from_uri("app://schemas/main").unwrap(),
//!     )
//!     .unwrap();
//!
//! assert!(schema.validate_sync(&json!({"n": 5})).is_ok());
//!
//! let err = schema.validate_sync(&json!({"n": -1})).unwrap_err();
//! assert_eq!(err.as_mismatch().unwrap().keyword, "minimum");
//! ```

pub mod cursor;
pub mod error;
pub mod format;
pub mod keywords;
pub mod pointer;
pub mod router;
pub mod schema;

mod uri;

pub use cursor::{Cursor, CursorMut};
pub use error::{Mismatch, StructureError, ValidateError};
pub use format::{FormatCheck, FormatRegistry};
pub use keywords::{Priority, Validator, ValidatorFactory};
pub use pointer::{Pointer, PointerError};
pub use router::{DocumentLoader, FileLoader, HttpLoader, LoadError, SchemaRouter};
pub use schema::{Dialect, Schema, SchemaParser};
