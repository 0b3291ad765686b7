//! Object keyword validators: properties, required, size, dependencies.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{StructureError, ValidateError};
use crate::keywords::{Priority, Validator, ValidatorFactory};
use crate::pointer::Pointer;
use crate::schema::{Schema, SchemaParser};

/// Policy for object keys not covered by `properties` or `patternProperties`.
enum Additional {
    Allow,
    Deny,
    Schema(Schema),
}

struct PatternProperty {
    regex: Regex,
    schema: Schema,
}

/// The `properties`/`patternProperties`/`additionalProperties` trio.
///
/// For each input key: the named schema applies if present, every pattern
/// schema whose pattern matches the key applies (a key may match several),
/// and only if neither matched does the additional-properties policy apply.
struct PropertiesValidator {
    named: IndexMap<String, Schema>,
    patterns: Vec<PatternProperty>,
    additional: Additional,
}

impl PropertiesValidator {
    fn schemas_for<'a>(&'a self, key: &str) -> (Vec<&'a Schema>, bool) {
        let mut matched = Vec::new();
        if let Some(schema) = self.named.get(key) {
            matched.push(schema);
        }
        for pattern in &self.patterns {
            if pattern.regex.is_match(key) {
                matched.push(&pattern.schema);
            }
        }
        let covered = !matched.is_empty();
        if !covered {
            if let Additional::Schema(ref schema) = self.additional {
                matched.push(schema);
            }
        }
        (matched, covered)
    }

    fn deny_error(&self, key: &str, value: &Value) -> ValidateError {
        ValidateError::mismatch(
            "additionalProperties",
            format!("property '{}' is not allowed", key),
            value.clone(),
        )
    }
}

#[async_trait]
impl Validator for PropertiesValidator {
    fn keyword(&self) -> &'static str {
        "properties"
    }

    fn priority(&self) -> Priority {
        Priority::Contextual
    }

    fn children(&self) -> Vec<Schema> {
        let mut children: Vec<Schema> = self.named.values().cloned().collect();
        children.extend(self.patterns.iter().map(|p| p.schema.clone()));
        if let Additional::Schema(ref schema) = self.additional {
            children.push(schema.clone());
        }
        children
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(object) = value.as_object() else {
            return Ok(());
        };
        for (key, entry) in object {
            let (schemas, covered) = self.schemas_for(key);
            if !covered && matches!(self.additional, Additional::Deny) {
                return Err(self.deny_error(key, value));
            }
            for schema in schemas {
                schema.validate_sync(entry)?;
            }
        }
        Ok(())
    }

    async fn validate(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(object) = value.as_object() else {
            return Ok(());
        };
        for (key, entry) in object {
            let (schemas, covered) = self.schemas_for(key);
            if !covered && matches!(self.additional, Additional::Deny) {
                return Err(self.deny_error(key, value));
            }
            for schema in schemas {
                schema.validate(entry).await?;
            }
        }
        Ok(())
    }
}

/// Builds the properties trio; pattern support is disabled under OpenAPI-3.
pub(crate) struct PropertiesFactory {
    pub patterns: bool,
}

impl ValidatorFactory for PropertiesFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("properties")
            || (self.patterns && schema.contains_key("patternProperties"))
            || schema.contains_key("additionalProperties")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        scope: &Pointer,
        parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let mut named = IndexMap::new();
        if let Some(spec) = schema.get("properties") {
            let entries = spec.as_object().ok_or(StructureError::WrongType {
                keyword: "properties",
                expected: "an object of schemas",
            })?;
            let base = scope.push("properties");
            for (key, node) in entries {
                named.insert(
                    key.clone(),
                    parser.parse(node.clone(), base.push(key.as_str()))?,
                );
            }
        }

        let mut patterns = Vec::new();
        if self.patterns {
            if let Some(spec) = schema.get("patternProperties") {
                let entries = spec.as_object().ok_or(StructureError::WrongType {
                    keyword: "patternProperties",
                    expected: "an object of schemas",
                })?;
                let base = scope.push("patternProperties");
                for (pattern, node) in entries {
                    let regex =
                        Regex::new(pattern).map_err(|e| StructureError::InvalidRegex {
                            keyword: "patternProperties",
                            source: Box::new(e),
                        })?;
                    patterns.push(PatternProperty {
                        regex,
                        schema: parser.parse(node.clone(), base.push(pattern.as_str()))?,
                    });
                }
            }
        }

        let additional = match schema.get("additionalProperties") {
            None => Additional::Allow,
            Some(Value::Bool(true)) => Additional::Allow,
            Some(Value::Bool(false)) => Additional::Deny,
            Some(node @ Value::Object(_)) => Additional::Schema(
                parser.parse(node.clone(), scope.push("additionalProperties"))?,
            ),
            Some(_) => {
                return Err(StructureError::WrongType {
                    keyword: "additionalProperties",
                    expected: "a boolean or schema",
                })
            }
        };

        if named.is_empty() && patterns.is_empty() && matches!(additional, Additional::Allow) {
            return Ok(None);
        }
        Ok(Some(Arc::new(PropertiesValidator {
            named,
            patterns,
            additional,
        })))
    }
}

struct RequiredValidator {
    required: Vec<String>,
}

impl Validator for RequiredValidator {
    fn keyword(&self) -> &'static str {
        "required"
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(object) = value.as_object() else {
            return Ok(());
        };
        for key in &self.required {
            if !object.contains_key(key) {
                return Err(ValidateError::mismatch(
                    "required",
                    format!("missing required property '{}'", key),
                    value.clone(),
                ));
            }
        }
        Ok(())
    }
}

pub(crate) struct RequiredFactory;

impl ValidatorFactory for RequiredFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("required")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        _scope: &Pointer,
        _parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let items = schema["required"]
            .as_array()
            .ok_or(StructureError::WrongType {
                keyword: "required",
                expected: "an array of property names",
            })?;
        let required = items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or(StructureError::WrongType {
                        keyword: "required",
                        expected: "an array of property names",
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if required.is_empty() {
            return Ok(None);
        }
        Ok(Some(Arc::new(RequiredValidator { required })))
    }
}

struct PropertyCountValidator {
    min: Option<usize>,
    max: Option<usize>,
}

impl Validator for PropertyCountValidator {
    fn keyword(&self) -> &'static str {
        "minProperties"
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(object) = value.as_object() else {
            return Ok(());
        };
        let count = object.len();
        if let Some(min) = self.min {
            if count < min {
                return Err(ValidateError::mismatch(
                    "minProperties",
                    format!("{} properties is fewer than {}", count, min),
                    value.clone(),
                ));
            }
        }
        if let Some(max) = self.max {
            if count > max {
                return Err(ValidateError::mismatch(
                    "maxProperties",
                    format!("{} properties is more than {}", count, max),
                    value.clone(),
                ));
            }
        }
        Ok(())
    }
}

pub(crate) struct PropertyCountFactory;

impl ValidatorFactory for PropertyCountFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("minProperties") || schema.contains_key("maxProperties")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        _scope: &Pointer,
        _parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let min = count(schema, "minProperties")?;
        let max = count(schema, "maxProperties")?;
        if min.is_none() && max.is_none() {
            return Ok(None);
        }
        Ok(Some(Arc::new(PropertyCountValidator { min, max })))
    }
}

pub(crate) fn count(
    schema: &Map<String, Value>,
    keyword: &'static str,
) -> Result<Option<usize>, StructureError> {
    match schema.get(keyword) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or(StructureError::WrongType {
                keyword,
                expected: "a non-negative integer",
            }),
    }
}

/// The `dependencies` keyword, both forms: a property list (those
/// properties must co-occur with the trigger key) and a schema (the whole
/// object must match when the trigger key is present).
struct DependenciesValidator {
    property_deps: IndexMap<String, Vec<String>>,
    schema_deps: IndexMap<String, Schema>,
}

#[async_trait]
impl Validator for DependenciesValidator {
    fn keyword(&self) -> &'static str {
        "dependencies"
    }

    fn priority(&self) -> Priority {
        Priority::Contextual
    }

    fn children(&self) -> Vec<Schema> {
        self.schema_deps.values().cloned().collect()
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(object) = value.as_object() else {
            return Ok(());
        };
        for (trigger, needed) in &self.property_deps {
            if object.contains_key(trigger) {
                for key in needed {
                    if !object.contains_key(key) {
                        return Err(ValidateError::mismatch(
                            "dependencies",
                            format!("property '{}' requires property '{}'", trigger, key),
                            value.clone(),
                        ));
                    }
                }
            }
        }
        for (trigger, schema) in &self.schema_deps {
            if object.contains_key(trigger) {
                schema.validate_sync(value)?;
            }
        }
        Ok(())
    }

    async fn validate(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(object) = value.as_object() else {
            return Ok(());
        };
        for (trigger, needed) in &self.property_deps {
            if object.contains_key(trigger) {
                for key in needed {
                    if !object.contains_key(key) {
                        return Err(ValidateError::mismatch(
                            "dependencies",
                            format!("property '{}' requires property '{}'", trigger, key),
                            value.clone(),
                        ));
                    }
                }
            }
        }
        for (trigger, schema) in &self.schema_deps {
            if object.contains_key(trigger) {
                schema.validate(value).await?;
            }
        }
        Ok(())
    }
}

pub(crate) struct DependenciesFactory;

impl ValidatorFactory for DependenciesFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("dependencies")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        scope: &Pointer,
        parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let entries = schema["dependencies"]
            .as_object()
            .ok_or(StructureError::WrongType {
                keyword: "dependencies",
                expected: "an object",
            })?;
        let mut property_deps = IndexMap::new();
        let mut schema_deps = IndexMap::new();
        let base = scope.push("dependencies");
        for (trigger, spec) in entries {
            match spec {
                Value::Array(names) => {
                    let needed = names
                        .iter()
                        .map(|v| {
                            v.as_str().map(str::to_string).ok_or(
                                StructureError::WrongType {
                                    keyword: "dependencies",
                                    expected: "an array of property names or a schema",
                                },
                            )
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    property_deps.insert(trigger.clone(), needed);
                }
                node @ (Value::Object(_) | Value::Bool(_)) => {
                    schema_deps.insert(
                        trigger.clone(),
                        parser.parse(node.clone(), base.push(trigger.as_str()))?,
                    );
                }
                _ => {
                    return Err(StructureError::WrongType {
                        keyword: "dependencies",
                        expected: "an array of property names or a schema",
                    })
                }
            }
        }
        if property_deps.is_empty() && schema_deps.is_empty() {
            return Ok(None);
        }
        Ok(Some(Arc::new(DependenciesValidator {
            property_deps,
            schema_deps,
        })))
    }
}
