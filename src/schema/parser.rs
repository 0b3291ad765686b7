//! Schema compilation: keyword walk, dialect selection, registration.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::StructureError;
use crate::format::FormatRegistry;
use crate::keywords::{self, type_name, Validator, ValidatorFactory};
use crate::pointer::Pointer;
use crate::router::SchemaRouter;
use crate::schema::Schema;

/// The keyword dialect a parser compiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// JSON Schema draft-7.
    Draft7,
    /// The OpenAPI 3.0 schema object: no `patternProperties`, `const`,
    /// `if`/`then`/`else`, `dependencies`, `contains` or positional `items`;
    /// adds `nullable` and the boolean form of `exclusiveMinimum`/`Maximum`.
    OpenApi3,
}

struct ParserInner {
    router: SchemaRouter,
    dialect: Dialect,
    factories: Vec<Arc<dyn ValidatorFactory>>,
    ref_factory: Arc<dyn ValidatorFactory>,
    formats: FormatRegistry,
}

/// Compiles schema documents into reusable [`Schema`] values.
///
/// A parser owns its keyword-factory list (selected by [`Dialect`]), a
/// format registry, and a [`SchemaRouter`] that indexes every compiled
/// schema by URI. Parsers are cheap to clone and share their router.
///
/// # Example
///
/// ```rust
/// use waypoint::{Pointer, SchemaParser};
/// use serde_json::json;
///
/// let parser = SchemaParser::draft7();
/// let schema = parser
///     .parse(
///         json!({
///             "type": "object",
///             "properties": {"n": {"type": "integer", "minimum": 0}},
///             "required": ["n"]
///         }),
///         Pointer::from_uri("app://schemas/main").unwrap(),
///     )
///     .unwrap();
///
/// assert!(schema.validate_sync(&json!({"n": 5})).is_ok());
/// assert!(schema.validate_sync(&json!({"n": -1})).is_err());
/// assert!(schema.validate_sync(&json!({})).is_err());
/// ```
#[derive(Clone)]
pub struct SchemaParser {
    inner: Arc<ParserInner>,
}

impl SchemaParser {
    /// Creates a draft-7 parser with a fresh router.
    pub fn draft7() -> Self {
        Self::with_router(Dialect::Draft7, SchemaRouter::new())
    }

    /// Creates an OpenAPI-3 parser with a fresh router.
    pub fn openapi3() -> Self {
        Self::with_router(Dialect::OpenApi3, SchemaRouter::new())
    }

    /// Creates a parser for the given dialect sharing an existing router.
    pub fn with_router(dialect: Dialect, router: SchemaRouter) -> Self {
        Self {
            inner: Arc::new(ParserInner {
                router,
                dialect,
                factories: dialect_factories(dialect),
                ref_factory: Arc::new(keywords::RefFactory),
                formats: FormatRegistry::default(),
            }),
        }
    }

    /// Returns a parser with an additional validator factory appended.
    pub fn with_factory(&self, factory: Arc<dyn ValidatorFactory>) -> Self {
        let mut factories = self.inner.factories.clone();
        factories.push(factory);
        Self {
            inner: Arc::new(ParserInner {
                router: self.inner.router.clone(),
                dialect: self.inner.dialect,
                factories,
                ref_factory: self.inner.ref_factory.clone(),
                formats: self.inner.formats.clone(),
            }),
        }
    }

    /// Returns a parser with the given format registry.
    pub fn with_formats(&self, formats: FormatRegistry) -> Self {
        Self {
            inner: Arc::new(ParserInner {
                router: self.inner.router.clone(),
                dialect: self.inner.dialect,
                factories: self.inner.factories.clone(),
                ref_factory: self.inner.ref_factory.clone(),
                formats,
            }),
        }
    }

    /// The router this parser registers schemas into.
    pub fn router(&self) -> &SchemaRouter {
        &self.inner.router
    }

    /// The dialect this parser compiles.
    pub fn dialect(&self) -> Dialect {
        self.inner.dialect
    }

    /// The format registry consulted by the `format` keyword.
    pub fn formats(&self) -> &FormatRegistry {
        &self.inner.formats
    }

    /// Compiles a schema document node under the given scope.
    ///
    /// Boolean schemas are the permissive (`true`) and always-fail (`false`)
    /// schemas. Object schemas are walked keyword by keyword through the
    /// factory list; sub-schemas re-enter `parse` with a pointer-extended
    /// scope. The compiled schema is registered with the router under its
    /// scope and any `$id` aliases.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError`] when the document is not a schema or a
    /// keyword's value is malformed; never for merely-unknown keywords,
    /// which are ignored.
    pub fn parse(&self, json: Value, scope: Pointer) -> Result<Schema, StructureError> {
        let validators = match &json {
            Value::Bool(true) => Vec::new(),
            Value::Bool(false) => {
                vec![Arc::new(keywords::FalseValidator) as Arc<dyn Validator>]
            }
            Value::Object(map) => {
                // A $ref schema delegates wholesale; sibling keywords are
                // ignored per draft-7.
                if map.contains_key("$ref") {
                    match self.inner.ref_factory.build(map, &scope, self)? {
                        Some(v) => vec![v],
                        None => Vec::new(),
                    }
                } else {
                    let mut validators = Vec::new();
                    for factory in &self.inner.factories {
                        if factory.can_handle(map) {
                            if let Some(v) = factory.build(map, &scope, self)? {
                                validators.push(v);
                            }
                        }
                    }
                    validators
                }
            }
            other => {
                return Err(StructureError::NotASchema {
                    got: type_name(other),
                })
            }
        };

        let schema = Schema::new(json, scope.clone(), validators);
        self.inner.router.add_schema(&schema, &scope)?;
        debug!(scope = %scope.to_uri(), "compiled schema");
        Ok(schema)
    }

    /// Parses unparsed JSON text, then compiles it under the given scope.
    pub fn parse_str(&self, text: &str, scope: Pointer) -> Result<Schema, StructureError> {
        let json: Value = serde_json::from_str(text)?;
        self.parse(json, scope)
    }
}

fn dialect_factories(dialect: Dialect) -> Vec<Arc<dyn ValidatorFactory>> {
    match dialect {
        Dialect::Draft7 => vec![
            Arc::new(keywords::TypeFactory { nullable: false }),
            Arc::new(keywords::ConstFactory),
            Arc::new(keywords::EnumFactory),
            Arc::new(keywords::MultipleOfFactory),
            Arc::new(keywords::RangeFactory {
                exclusive_as_bool: false,
            }),
            Arc::new(keywords::LengthFactory),
            Arc::new(keywords::PatternFactory),
            Arc::new(keywords::FormatFactory),
            Arc::new(keywords::ItemsFactory { positional: true }),
            Arc::new(keywords::ContainsFactory),
            Arc::new(keywords::UniqueItemsFactory),
            Arc::new(keywords::ItemCountFactory),
            Arc::new(keywords::PropertiesFactory { patterns: true }),
            Arc::new(keywords::RequiredFactory),
            Arc::new(keywords::PropertyCountFactory),
            Arc::new(keywords::DependenciesFactory),
            Arc::new(keywords::AllOfFactory),
            Arc::new(keywords::AnyOfFactory),
            Arc::new(keywords::OneOfFactory),
            Arc::new(keywords::NotFactory),
            Arc::new(keywords::IfThenElseFactory),
            Arc::new(keywords::DefinitionsFactory),
        ],
        Dialect::OpenApi3 => vec![
            Arc::new(keywords::TypeFactory { nullable: true }),
            Arc::new(keywords::EnumFactory),
            Arc::new(keywords::MultipleOfFactory),
            Arc::new(keywords::RangeFactory {
                exclusive_as_bool: true,
            }),
            Arc::new(keywords::LengthFactory),
            Arc::new(keywords::PatternFactory),
            Arc::new(keywords::FormatFactory),
            Arc::new(keywords::ItemsFactory { positional: false }),
            Arc::new(keywords::UniqueItemsFactory),
            Arc::new(keywords::ItemCountFactory),
            Arc::new(keywords::PropertiesFactory { patterns: false }),
            Arc::new(keywords::RequiredFactory),
            Arc::new(keywords::PropertyCountFactory),
            Arc::new(keywords::AllOfFactory),
            Arc::new(keywords::AnyOfFactory),
            Arc::new(keywords::OneOfFactory),
            Arc::new(keywords::NotFactory),
        ],
    }
}
