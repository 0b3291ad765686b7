//! Numeric range and multiple-of checks.
//!
//! Numeric keywords apply only to numbers; other value types pass through
//! untouched, with `type` responsible for shape enforcement.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{StructureError, ValidateError};
use crate::keywords::{Validator, ValidatorFactory};
use crate::pointer::Pointer;
use crate::schema::SchemaParser;

struct MultipleOfValidator {
    multiple: f64,
}

impl Validator for MultipleOfValidator {
    fn keyword(&self) -> &'static str {
        "multipleOf"
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(number) = value.as_f64() else {
            return Ok(());
        };
        // Float remainder, precision-sensitive for non-integer multiples.
        if number % self.multiple != 0.0 {
            return Err(ValidateError::mismatch(
                "multipleOf",
                format!("{} is not a multiple of {}", number, self.multiple),
                value.clone(),
            ));
        }
        Ok(())
    }
}

pub(crate) struct MultipleOfFactory;

impl ValidatorFactory for MultipleOfFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("multipleOf")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        _scope: &Pointer,
        _parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let multiple = schema["multipleOf"]
            .as_f64()
            .filter(|m| *m > 0.0)
            .ok_or(StructureError::WrongType {
                keyword: "multipleOf",
                expected: "a positive number",
            })?;
        Ok(Some(Arc::new(MultipleOfValidator { multiple })))
    }
}

struct RangeValidator {
    minimum: Option<f64>,
    maximum: Option<f64>,
    exclusive_minimum: Option<f64>,
    exclusive_maximum: Option<f64>,
}

impl Validator for RangeValidator {
    fn keyword(&self) -> &'static str {
        "minimum"
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(number) = value.as_f64() else {
            return Ok(());
        };
        if let Some(min) = self.minimum {
            if number < min {
                return Err(ValidateError::mismatch(
                    "minimum",
                    format!("{} is less than {}", number, min),
                    value.clone(),
                ));
            }
        }
        if let Some(min) = self.exclusive_minimum {
            if number <= min {
                return Err(ValidateError::mismatch(
                    "exclusiveMinimum",
                    format!("{} is not greater than {}", number, min),
                    value.clone(),
                ));
            }
        }
        if let Some(max) = self.maximum {
            if number > max {
                return Err(ValidateError::mismatch(
                    "maximum",
                    format!("{} is greater than {}", number, max),
                    value.clone(),
                ));
            }
        }
        if let Some(max) = self.exclusive_maximum {
            if number >= max {
                return Err(ValidateError::mismatch(
                    "exclusiveMaximum",
                    format!("{} is not less than {}", number, max),
                    value.clone(),
                ));
            }
        }
        Ok(())
    }
}

const RANGE_KEYWORDS: [&str; 4] = [
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
];

/// Builds the numeric range validator.
///
/// With `exclusive_as_bool` set (OpenAPI-3), `exclusiveMinimum`/`Maximum`
/// are booleans that tighten the paired `minimum`/`maximum` instead of
/// carrying their own numbers.
pub(crate) struct RangeFactory {
    pub exclusive_as_bool: bool,
}

impl RangeFactory {
    fn bound(
        schema: &Map<String, Value>,
        keyword: &'static str,
    ) -> Result<Option<f64>, StructureError> {
        match schema.get(keyword) {
            None => Ok(None),
            Some(Value::Null) => Err(StructureError::NullKeyword { keyword }),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or(StructureError::WrongType {
                    keyword,
                    expected: "a number",
                }),
        }
    }

    fn flag(schema: &Map<String, Value>, keyword: &'static str) -> Result<bool, StructureError> {
        match schema.get(keyword) {
            None => Ok(false),
            Some(v) => v.as_bool().ok_or(StructureError::WrongType {
                keyword,
                expected: "a boolean",
            }),
        }
    }
}

impl ValidatorFactory for RangeFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        RANGE_KEYWORDS.iter().any(|k| schema.contains_key(*k))
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        _scope: &Pointer,
        _parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let mut minimum = Self::bound(schema, "minimum")?;
        let mut maximum = Self::bound(schema, "maximum")?;
        let mut exclusive_minimum = None;
        let mut exclusive_maximum = None;

        if self.exclusive_as_bool {
            if Self::flag(schema, "exclusiveMinimum")? {
                exclusive_minimum = minimum.take();
            }
            if Self::flag(schema, "exclusiveMaximum")? {
                exclusive_maximum = maximum.take();
            }
        } else {
            exclusive_minimum = Self::bound(schema, "exclusiveMinimum")?;
            exclusive_maximum = Self::bound(schema, "exclusiveMaximum")?;
        }

        if minimum.is_none()
            && maximum.is_none()
            && exclusive_minimum.is_none()
            && exclusive_maximum.is_none()
        {
            return Ok(None);
        }
        Ok(Some(Arc::new(RangeValidator {
            minimum,
            maximum,
            exclusive_minimum,
            exclusive_maximum,
        })))
    }
}
