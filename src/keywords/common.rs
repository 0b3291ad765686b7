//! Type, const and enum checks, plus the always-fail boolean schema.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{StructureError, ValidateError};
use crate::keywords::{type_name, Priority, Validator, ValidatorFactory};
use crate::pointer::Pointer;
use crate::schema::SchemaParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(JsonType::Null),
            "boolean" => Some(JsonType::Boolean),
            "integer" => Some(JsonType::Integer),
            "number" => Some(JsonType::Number),
            "string" => Some(JsonType::String),
            "array" => Some(JsonType::Array),
            "object" => Some(JsonType::Object),
            _ => None,
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            JsonType::Null => value.is_null(),
            JsonType::Boolean => value.is_boolean(),
            JsonType::Number => value.is_number(),
            JsonType::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            JsonType::String => value.is_string(),
            JsonType::Array => value.is_array(),
            JsonType::Object => value.is_object(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }
}

struct TypeValidator {
    allowed: Vec<JsonType>,
    allow_null: bool,
}

impl Validator for TypeValidator {
    fn keyword(&self) -> &'static str {
        "type"
    }

    fn priority(&self) -> Priority {
        Priority::Critical
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        if self.allow_null && value.is_null() {
            return Ok(());
        }
        if self.allowed.iter().any(|t| t.matches(value)) {
            return Ok(());
        }
        let expected: Vec<&str> = self.allowed.iter().map(|t| t.name()).collect();
        Err(ValidateError::mismatch(
            "type",
            format!(
                "expected {}, got {}",
                expected.join(" or "),
                type_name(value)
            ),
            value.clone(),
        ))
    }
}

/// Builds the `type` validator; under OpenAPI-3 the sibling `nullable`
/// keyword widens the check to accept null.
pub(crate) struct TypeFactory {
    pub nullable: bool,
}

impl ValidatorFactory for TypeFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("type")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        _scope: &Pointer,
        _parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let spec = &schema["type"];
        let names: Vec<&str> = match spec {
            Value::String(s) => vec![s.as_str()],
            Value::Array(items) => items
                .iter()
                .map(|v| {
                    v.as_str().ok_or(StructureError::WrongType {
                        keyword: "type",
                        expected: "a type name or array of type names",
                    })
                })
                .collect::<Result<_, _>>()?,
            Value::Null => return Err(StructureError::NullKeyword { keyword: "type" }),
            _ => {
                return Err(StructureError::WrongType {
                    keyword: "type",
                    expected: "a type name or array of type names",
                })
            }
        };
        let allowed = names
            .iter()
            .map(|name| {
                JsonType::from_name(name).ok_or(StructureError::WrongType {
                    keyword: "type",
                    expected: "a valid JSON type name",
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let allow_null =
            self.nullable && schema.get("nullable").and_then(Value::as_bool) == Some(true);
        Ok(Some(Arc::new(TypeValidator { allowed, allow_null })))
    }
}

struct ConstValidator {
    expected: Value,
}

impl Validator for ConstValidator {
    fn keyword(&self) -> &'static str {
        "const"
    }

    fn priority(&self) -> Priority {
        Priority::Critical
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        if *value == self.expected {
            Ok(())
        } else {
            Err(ValidateError::mismatch(
                "const",
                format!("value is not the constant {}", self.expected),
                value.clone(),
            ))
        }
    }
}

pub(crate) struct ConstFactory;

impl ValidatorFactory for ConstFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("const")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        _scope: &Pointer,
        _parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        Ok(Some(Arc::new(ConstValidator {
            expected: schema["const"].clone(),
        })))
    }
}

struct EnumValidator {
    options: Vec<Value>,
}

impl Validator for EnumValidator {
    fn keyword(&self) -> &'static str {
        "enum"
    }

    fn priority(&self) -> Priority {
        Priority::Critical
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        if self.options.contains(value) {
            Ok(())
        } else {
            Err(ValidateError::mismatch(
                "enum",
                "value is not one of the enumerated options",
                value.clone(),
            ))
        }
    }
}

pub(crate) struct EnumFactory;

impl ValidatorFactory for EnumFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("enum")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        _scope: &Pointer,
        _parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let options = schema["enum"]
            .as_array()
            .ok_or(StructureError::WrongType {
                keyword: "enum",
                expected: "an array of values",
            })?
            .clone();
        Ok(Some(Arc::new(EnumValidator { options })))
    }
}

/// The `false` boolean schema: rejects every value.
pub(crate) struct FalseValidator;

impl Validator for FalseValidator {
    fn keyword(&self) -> &'static str {
        "false"
    }

    fn priority(&self) -> Priority {
        Priority::Critical
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        Err(ValidateError::mismatch(
            "false",
            "false schema forbids all values",
            value.clone(),
        ))
    }
}
