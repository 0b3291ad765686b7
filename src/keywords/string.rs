//! String length, pattern and format checks.

use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{StructureError, ValidateError};
use crate::format::FormatCheck;
use crate::keywords::{Validator, ValidatorFactory};
use crate::pointer::Pointer;
use crate::schema::SchemaParser;

struct LengthValidator {
    min: Option<usize>,
    max: Option<usize>,
}

impl Validator for LengthValidator {
    fn keyword(&self) -> &'static str {
        "minLength"
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(text) = value.as_str() else {
            return Ok(());
        };
        // Length is counted in Unicode scalar values, not bytes.
        let length = text.chars().count();
        if let Some(min) = self.min {
            if length < min {
                return Err(ValidateError::mismatch(
                    "minLength",
                    format!("length {} is less than {}", length, min),
                    value.clone(),
                ));
            }
        }
        if let Some(max) = self.max {
            if length > max {
                return Err(ValidateError::mismatch(
                    "maxLength",
                    format!("length {} is greater than {}", length, max),
                    value.clone(),
                ));
            }
        }
        Ok(())
    }
}

pub(crate) struct LengthFactory;

impl LengthFactory {
    fn count(
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
}

impl ValidatorFactory for LengthFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("minLength") || schema.contains_key("maxLength")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        _scope: &Pointer,
        _parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let min = Self::count(schema, "minLength")?;
        let max = Self::count(schema, "maxLength")?;
        if min.is_none() && max.is_none() {
            return Ok(None);
        }
        Ok(Some(Arc::new(LengthValidator { min, max })))
    }
}

struct PatternValidator {
    regex: Regex,
    pattern: String,
}

impl Validator for PatternValidator {
    fn keyword(&self) -> &'static str {
        "pattern"
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(text) = value.as_str() else {
            return Ok(());
        };
        if self.regex.is_match(text) {
            Ok(())
        } else {
            Err(ValidateError::mismatch(
                "pattern",
                format!("string does not match pattern '{}'", self.pattern),
                value.clone(),
            ))
        }
    }
}

pub(crate) struct PatternFactory;

impl ValidatorFactory for PatternFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("pattern")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        _scope: &Pointer,
        _parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let pattern = schema["pattern"]
            .as_str()
            .ok_or(StructureError::WrongType {
                keyword: "pattern",
                expected: "a string",
            })?;
        let regex = Regex::new(pattern).map_err(|e| StructureError::InvalidRegex {
            keyword: "pattern",
            source: Box::new(e),
        })?;
        Ok(Some(Arc::new(PatternValidator {
            regex,
            pattern: pattern.to_string(),
        })))
    }
}

struct FormatValidator {
    name: String,
    check: FormatCheck,
}

impl Validator for FormatValidator {
    fn keyword(&self) -> &'static str {
        "format"
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        let Some(text) = value.as_str() else {
            return Ok(());
        };
        if (self.check)(text) {
            Ok(())
        } else {
            Err(ValidateError::mismatch(
                "format",
                format!("string is not a valid {}", self.name),
                value.clone(),
            ))
        }
    }
}

pub(crate) struct FormatFactory;

impl ValidatorFactory for FormatFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("format")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        _scope: &Pointer,
        parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let name = schema["format"]
            .as_str()
            .ok_or(StructureError::WrongType {
                keyword: "format",
                expected: "a string",
            })?;
        // Unknown format names are annotations, not errors.
        match parser.formats().get(name) {
            Some(check) => Ok(Some(Arc::new(FormatValidator {
                name: name.to_string(),
                check,
            }))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_length_counts_chars_not_bytes() {
        let v = LengthValidator {
            min: Some(3),
            max: Some(3),
        };
        assert!(v.validate_sync(&json!("äöü")).is_ok());
        assert!(v.validate_sync(&json!("ab")).is_err());
        assert!(v.validate_sync(&json!("abcd")).is_err());
        assert!(v.validate_sync(&json!(42)).is_ok());
    }

    #[test]
    fn test_pattern_match() {
        let v = PatternValidator {
            regex: Regex::new(r"^\d+$").unwrap(),
            pattern: r"^\d+$".to_string(),
        };
        assert!(v.validate_sync(&json!("123")).is_ok());
        assert!(v.validate_sync(&json!("abc")).is_err());
    }
}
