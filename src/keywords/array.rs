//! Array keyword validators: items, contains, uniqueness, size.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{StructureError, ValidateError};
use crate::keywords::object::count;
use crate::keywords::{Priority, Validator, ValidatorFactory};
use crate::pointer::Pointer;
use crate::schema::{Schema, SchemaParser};

/// Policy for elements beyond a positional `items` list.
enum AdditionalItems {
    Allow,
    Deny,
    Schema(Schema),
}

enum ItemsMode {
    /// A single schema applied to every element.
    Single(Schema),
    /// Positional schemas, element `i` against schema `i`, with an
    /// `additionalItems` policy beyond the list.
    Positional {
        schemas: Vec<Schema>,
        additional: AdditionalItems,
    },
}

struct ItemsValidator {
    mode: ItemsMode,
}

impl ItemsValidator {
    fn deny_error(&self, index: usize, value: &Value) -> ValidateError {
        ValidateError::mismatch(
            "additionalItems",
            format!("item {} is beyond the permitted item list", index),
            value.clone(),
        )
    }
}

#[async_trait]
impl Validator for ItemsValidator {
    fn keyword(&self) -> &'static str {
        "items"
    }

    fn priority(&self) -> Priority {
        Priority::Contextual
    }

    fn children(&self) -> Vec<Schema> {
        match &self.mode {
            ItemsMode::Single(schema) => vec![schema.clone()],
            ItemsMode::Positional { schemas, additional } => {
                let mut children = schemas.clone();
                if let AdditionalItems::Schema(ref schema) = additional {
                    children.push(schema.clone());
                }
                children
            }
        }
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(items) = value.as_array() else {
            return Ok(());
        };
        match &self.mode {
            ItemsMode::Single(schema) => {
                for item in items {
                    schema.validate_sync(item)?;
                }
            }
            ItemsMode::Positional { schemas, additional } => {
                for (index, item) in items.iter().enumerate() {
                    match schemas.get(index) {
                        Some(schema) => schema.validate_sync(item)?,
                        None => match additional {
                            AdditionalItems::Allow => {}
                            AdditionalItems::Deny => {
                                return Err(self.deny_error(index, value))
                            }
                            AdditionalItems::Schema(schema) => schema.validate_sync(item)?,
                        },
                    }
                }
            }
        }
        Ok(())
    }

    async fn validate(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(items) = value.as_array() else {
            return Ok(());
        };
        match &self.mode {
            ItemsMode::Single(schema) => {
                for item in items {
                    schema.validate(item).await?;
                }
            }
            ItemsMode::Positional { schemas, additional } => {
                for (index, item) in items.iter().enumerate() {
                    match schemas.get(index) {
                        Some(schema) => schema.validate(item).await?,
                        None => match additional {
                            AdditionalItems::Allow => {}
                            AdditionalItems::Deny => {
                                return Err(self.deny_error(index, value))
                            }
                            AdditionalItems::Schema(schema) => schema.validate(item).await?,
                        },
                    }
                }
            }
        }
        Ok(())
    }
}

/// Builds the `items`/`additionalItems` validator.
///
/// The positional (array-of-schemas) form is draft-7 only; under OpenAPI-3
/// `items` must be a single schema.
pub(crate) struct ItemsFactory {
    pub positional: bool,
}

impl ValidatorFactory for ItemsFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("items")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        scope: &Pointer,
        parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let mode = match &schema["items"] {
            Value::Array(nodes) if self.positional => {
                let base = scope.push("items");
                let schemas = nodes
                    .iter()
                    .enumerate()
                    .map(|(i, node)| parser.parse(node.clone(), base.push(i.to_string())))
                    .collect::<Result<Vec<_>, _>>()?;
                let additional = match schema.get("additionalItems") {
                    None | Some(Value::Bool(true)) => AdditionalItems::Allow,
                    Some(Value::Bool(false)) => AdditionalItems::Deny,
                    Some(node @ Value::Object(_)) => AdditionalItems::Schema(
                        parser.parse(node.clone(), scope.push("additionalItems"))?,
                    ),
                    Some(_) => {
                        return Err(StructureError::WrongType {
                            keyword: "additionalItems",
                            expected: "a boolean or schema",
                        })
                    }
                };
                ItemsMode::Positional { schemas, additional }
            }
            node @ (Value::Object(_) | Value::Bool(_)) => {
                ItemsMode::Single(parser.parse(node.clone(), scope.push("items"))?)
            }
            _ => {
                return Err(StructureError::WrongType {
                    keyword: "items",
                    expected: if self.positional {
                        "a schema or array of schemas"
                    } else {
                        "a schema"
                    },
                })
            }
        };
        Ok(Some(Arc::new(ItemsValidator { mode })))
    }
}

/// The `contains` keyword: at least one array element must match.
struct ContainsValidator {
    schema: Schema,
}

#[async_trait]
impl Validator for ContainsValidator {
    fn keyword(&self) -> &'static str {
        "contains"
    }

    fn priority(&self) -> Priority {
        Priority::Contextual
    }

    fn children(&self) -> Vec<Schema> {
        vec![self.schema.clone()]
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(items) = value.as_array() else {
            return Ok(());
        };
        for item in items {
            match self.schema.validate_sync(item) {
                Ok(()) => return Ok(()),
                Err(e @ ValidateError::Reference { .. }) => return Err(e),
                Err(ValidateError::WouldSuspend) => return Err(ValidateError::WouldSuspend),
                Err(ValidateError::Mismatch(_)) => {}
            }
        }
        Err(ValidateError::mismatch(
            "contains",
            "no array element matched the contained schema",
            value.clone(),
        ))
    }

    async fn validate(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(items) = value.as_array() else {
            return Ok(());
        };
        for item in items {
            match self.schema.validate(item).await {
                Ok(()) => return Ok(()),
                Err(e @ ValidateError::Reference { .. }) => return Err(e),
                Err(ValidateError::WouldSuspend) => return Err(ValidateError::WouldSuspend),
                Err(ValidateError::Mismatch(_)) => {}
            }
        }
        Err(ValidateError::mismatch(
            "contains",
            "no array element matched the contained schema",
            value.clone(),
        ))
    }
}

pub(crate) struct ContainsFactory;

impl ValidatorFactory for ContainsFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("contains")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        scope: &Pointer,
        parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let node = &schema["contains"];
        if !matches!(node, Value::Object(_) | Value::Bool(_)) {
            return Err(StructureError::WrongType {
                keyword: "contains",
                expected: "a schema",
            });
        }
        Ok(Some(Arc::new(ContainsValidator {
            schema: parser.parse(node.clone(), scope.push("contains"))?,
        })))
    }
}

struct UniqueItemsValidator;

impl Validator for UniqueItemsValidator {
    fn keyword(&self) -> &'static str {
        "uniqueItems"
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(items) = value.as_array() else {
            return Ok(());
        };
        for (i, left) in items.iter().enumerate() {
            for right in items.iter().skip(i + 1) {
                if left == right {
                    return Err(ValidateError::mismatch(
                        "uniqueItems",
                        format!("duplicate item {}", left),
                        value.clone(),
                    ));
                }
            }
        }
        Ok(())
    }
}

pub(crate) struct UniqueItemsFactory;

impl ValidatorFactory for UniqueItemsFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("uniqueItems")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        _scope: &Pointer,
        _parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        match schema["uniqueItems"].as_bool() {
            Some(true) => Ok(Some(Arc::new(UniqueItemsValidator))),
            Some(false) => Ok(None),
            None => Err(StructureError::WrongType {
                keyword: "uniqueItems",
                expected: "a boolean",
            }),
        }
    }
}

struct ItemCountValidator {
    min: Option<usize>,
    max: Option<usize>,
}

impl Validator for ItemCountValidator {
    fn keyword(&self) -> &'static str {
        "minItems"
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(items) = value.as_array() else {
            return Ok(());
        };
        let count = items.len();
        if let Some(min) = self.min {
            if count < min {
                return Err(ValidateError::mismatch(
                    "minItems",
                    format!("{} items is fewer than {}", count, min),
                    value.clone(),
                ));
            }
        }
        if let Some(max) = self.max {
            if count > max {
                return Err(ValidateError::mismatch(
                    "maxItems",
                    format!("{} items is more than {}", count, max),
                    value.clone(),
                ));
            }
        }
        Ok(())
    }
}

pub(crate) struct ItemCountFactory;

impl ValidatorFactory for ItemCountFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("minItems") || schema.contains_key("maxItems")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        _scope: &Pointer,
        _parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let min = count(schema, "minItems")?;
        let max = count(schema, "maxItems")?;
        if min.is_none() && max.is_none() {
            return Ok(None);
        }
        Ok(Some(Arc::new(ItemCountValidator { min, max })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unique_items() {
        let v = UniqueItemsValidator;
        assert!(v.validate_sync(&json!([1, 2, 3])).is_ok());
        assert!(v.validate_sync(&json!([1, 2, 1])).is_err());
        assert!(v.validate_sync(&json!([{"a": 1}, {"a": 1}])).is_err());
    }

    #[test]
    fn test_item_count() {
        let v = ItemCountValidator {
            min: Some(1),
            max: Some(2),
        };
        assert!(v.validate_sync(&json!([1])).is_ok());
        assert!(v.validate_sync(&json!([])).is_err());
        assert!(v.validate_sync(&json!([1, 2, 3])).is_err());
    }
}
