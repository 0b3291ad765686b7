//! Schema combinators: allOf, anyOf, oneOf, not, if/then/else.
//!
//! Combinators recover branch mismatches only as far as their own semantics
//! require; reference errors are never swallowed, so a broken `$ref` inside
//! a branch always surfaces as a reference error.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{StructureError, ValidateError};
use crate::keywords::{parse_children, Priority, Validator, ValidatorFactory};
use crate::pointer::Pointer;
use crate::schema::{Schema, SchemaParser};

/// Distinguishes "branch did not match" from errors that must propagate.
fn branch_failed(result: Result<(), ValidateError>) -> Result<bool, ValidateError> {
    match result {
        Ok(()) => Ok(false),
        Err(ValidateError::Mismatch(_)) => Ok(true),
        Err(e) => Err(e),
    }
}

struct AllOfValidator {
    branches: Vec<Schema>,
}

#[async_trait]
impl Validator for AllOfValidator {
    fn keyword(&self) -> &'static str {
        "allOf"
    }

    fn priority(&self) -> Priority {
        Priority::Contextual
    }

    fn children(&self) -> Vec<Schema> {
        self.branches.clone()
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        for branch in &self.branches {
            if let Err(e) = branch.validate_sync(value) {
                return Err(wrap_all_of(e, value));
            }
        }
        Ok(())
    }

    async fn validate(&self, value: &Value) -> Result<(), ValidateError> {
        let checks = self.branches.iter().map(|branch| branch.validate(value));
        match futures::future::try_join_all(checks).await {
            Ok(_) => Ok(()),
            Err(e) => Err(wrap_all_of(e, value)),
        }
    }
}

fn wrap_all_of(inner: ValidateError, value: &Value) -> ValidateError {
    match inner {
        ValidateError::Mismatch(m) => ValidateError::mismatch(
            "allOf",
            format!("a subschema did not match: {}", m),
            value.clone(),
        ),
        other => other,
    }
}

pub(crate) struct AllOfFactory;

impl ValidatorFactory for AllOfFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("allOf")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        scope: &Pointer,
        parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let branches = parse_children(parser, "allOf", &schema["allOf"], scope)?;
        Ok(Some(Arc::new(AllOfValidator { branches })))
    }
}

struct AnyOfValidator {
    branches: Vec<Schema>,
}

#[async_trait]
impl Validator for AnyOfValidator {
    fn keyword(&self) -> &'static str {
        "anyOf"
    }

    fn priority(&self) -> Priority {
        Priority::Contextual
    }

    fn children(&self) -> Vec<Schema> {
        self.branches.clone()
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        for branch in &self.branches {
            if !branch_failed(branch.validate_sync(value))? {
                return Ok(());
            }
        }
        Err(ValidateError::mismatch(
            "anyOf",
            format!("value did not match any of {} schemas", self.branches.len()),
            value.clone(),
        ))
    }

    async fn validate(&self, value: &Value) -> Result<(), ValidateError> {
        for branch in &self.branches {
            if !branch_failed(branch.validate(value).await)? {
                return Ok(());
            }
        }
        Err(ValidateError::mismatch(
            "anyOf",
            format!("value did not match any of {} schemas", self.branches.len()),
            value.clone(),
        ))
    }
}

pub(crate) struct AnyOfFactory;

impl ValidatorFactory for AnyOfFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("anyOf")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        scope: &Pointer,
        parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let branches = parse_children(parser, "anyOf", &schema["anyOf"], scope)?;
        Ok(Some(Arc::new(AnyOfValidator { branches })))
    }
}

struct OneOfValidator {
    branches: Vec<Schema>,
}

impl OneOfValidator {
    fn outcome(&self, matched: usize, value: &Value) -> Result<(), ValidateError> {
        match matched {
            1 => Ok(()),
            0 => Err(ValidateError::mismatch(
                "oneOf",
                format!("value did not match any of {} schemas", self.branches.len()),
                value.clone(),
            )),
            n => Err(ValidateError::mismatch(
                "oneOf",
                format!("value matched {} schemas, expected exactly one", n),
                value.clone(),
            )),
        }
    }
}

#[async_trait]
impl Validator for OneOfValidator {
    fn keyword(&self) -> &'static str {
        "oneOf"
    }

    fn priority(&self) -> Priority {
        Priority::Contextual
    }

    fn children(&self) -> Vec<Schema> {
        self.branches.clone()
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        let mut matched = 0;
        for branch in &self.branches {
            if !branch_failed(branch.validate_sync(value))? {
                matched += 1;
            }
        }
        self.outcome(matched, value)
    }

    async fn validate(&self, value: &Value) -> Result<(), ValidateError> {
        let mut matched = 0;
        for branch in &self.branches {
            if !branch_failed(branch.validate(value).await)? {
                matched += 1;
            }
        }
        self.outcome(matched, value)
    }
}

pub(crate) struct OneOfFactory;

impl ValidatorFactory for OneOfFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("oneOf")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        scope: &Pointer,
        parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let branches = parse_children(parser, "oneOf", &schema["oneOf"], scope)?;
        Ok(Some(Arc::new(OneOfValidator { branches })))
    }
}

struct NotValidator {
    inner: Schema,
}

#[async_trait]
impl Validator for NotValidator {
    fn keyword(&self) -> &'static str {
        "not"
    }

    fn priority(&self) -> Priority {
        Priority::Contextual
    }

    fn children(&self) -> Vec<Schema> {
        vec![self.inner.clone()]
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        if branch_failed(self.inner.validate_sync(value))? {
            Ok(())
        } else {
            Err(ValidateError::mismatch(
                "not",
                "value matched the forbidden schema",
                value.clone(),
            ))
        }
    }

    async fn validate(&self, value: &Value) -> Result<(), ValidateError> {
        if branch_failed(self.inner.validate(value).await)? {
            Ok(())
        } else {
            Err(ValidateError::mismatch(
                "not",
                "value matched the forbidden schema",
                value.clone(),
            ))
        }
    }
}

pub(crate) struct NotFactory;

impl ValidatorFactory for NotFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("not")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        scope: &Pointer,
        parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let node = &schema["not"];
        if !matches!(node, Value::Object(_) | Value::Bool(_)) {
            return Err(StructureError::WrongType {
                keyword: "not",
                expected: "a schema",
            });
        }
        Ok(Some(Arc::new(NotValidator {
            inner: parser.parse(node.clone(), scope.push("not"))?,
        })))
    }
}

/// `if`/`then`/`else`: the condition's outcome selects which branch applies;
/// an absent branch passes.
struct IfThenElseValidator {
    condition: Schema,
    then_branch: Option<Schema>,
    else_branch: Option<Schema>,
}

#[async_trait]
impl Validator for IfThenElseValidator {
    fn keyword(&self) -> &'static str {
        "if"
    }

    fn priority(&self) -> Priority {
        Priority::Contextual
    }

    fn children(&self) -> Vec<Schema> {
        let mut children = vec![self.condition.clone()];
        children.extend(self.then_branch.clone());
        children.extend(self.else_branch.clone());
        children
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        let branch = if branch_failed(self.condition.validate_sync(value))? {
            &self.else_branch
        } else {
            &self.then_branch
        };
        match branch {
            Some(schema) => schema.validate_sync(value),
            None => Ok(()),
        }
    }

    async fn validate(&self, value: &Value) -> Result<(), ValidateError> {
        let branch = if branch_failed(self.condition.validate(value).await)? {
            &self.else_branch
        } else {
            &self.then_branch
        };
        match branch {
            Some(schema) => schema.validate(value).await,
            None => Ok(()),
        }
    }
}

pub(crate) struct IfThenElseFactory;

impl ValidatorFactory for IfThenElseFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("if")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        scope: &Pointer,
        parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let condition = parser.parse(schema["if"].clone(), scope.push("if"))?;
        let then_branch = match schema.get("then") {
            Some(node) => Some(parser.parse(node.clone(), scope.push("then"))?),
            None => None,
        };
        let else_branch = match schema.get("else") {
            Some(node) => Some(parser.parse(node.clone(), scope.push("else"))?),
            None => None,
        };
        Ok(Some(Arc::new(IfThenElseValidator {
            condition,
            then_branch,
            else_branch,
        })))
    }
}
