//! Keyword validators and the factory contract used to build them.
//!
//! Each JSON Schema keyword (or tight keyword group) compiles to one
//! [`Validator`]. Validators are selected by [`ValidatorFactory`] instances
//! registered on the parser: a factory inspects the schema node via
//! [`can_handle`](ValidatorFactory::can_handle) and builds its validator via
//! [`build`](ValidatorFactory::build), which may return `None` when the
//! keywords reduce to a no-op.
//!
//! Execution order is governed by [`Priority`]: cheap, highly selective
//! checks run before structural ones so a `type` mismatch short-circuits
//! ahead of `required`, `properties` and friends.

mod array;
mod combinators;
mod common;
mod numeric;
mod object;
mod ref_;
mod string;

pub(crate) use array::{ContainsFactory, ItemCountFactory, ItemsFactory, UniqueItemsFactory};
pub(crate) use combinators::{
    AllOfFactory, AnyOfFactory, IfThenElseFactory, NotFactory, OneOfFactory,
};
pub(crate) use common::{ConstFactory, EnumFactory, FalseValidator, TypeFactory};
pub(crate) use numeric::{MultipleOfFactory, RangeFactory};
pub(crate) use object::{
    DependenciesFactory, PropertiesFactory, PropertyCountFactory, RequiredFactory,
};
pub(crate) use ref_::{DefinitionsFactory, RefFactory};
pub(crate) use string::{FormatFactory, LengthFactory, PatternFactory};

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{StructureError, ValidateError};
use crate::pointer::Pointer;
use crate::schema::{Schema, SchemaParser};

/// Identity set used while computing sync state over a cyclic schema graph.
///
/// A schema already present in the set is treated as synchronous: a cycle is
/// locally checkable once every reference on it has resolved.
pub type SyncVisited = HashSet<usize>;

/// Execution priority of a validator within its schema.
///
/// Validators run in ascending priority order; the ordering is part of the
/// validation contract, not an optimization detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Cheap, highly selective checks: `type`, `const`, `enum`.
    Critical,
    /// Stateless predicate checks over the input value.
    Normal,
    /// Structural applicators, combinators and references.
    Contextual,
}

/// A single compiled keyword check, leaf or composite.
///
/// Leaf validators are pure predicates and inherit the default
/// implementations. Composite validators own child [`Schema`]s and override
/// [`children`](Validator::children), [`sync_state`](Validator::sync_state)
/// and the async [`validate`](Validator::validate) path.
#[async_trait]
pub trait Validator: Send + Sync {
    /// The keyword this validator enforces.
    fn keyword(&self) -> &'static str;

    /// Execution priority within the owning schema.
    fn priority(&self) -> Priority {
        Priority::Normal
    }

    /// Child schemas owned by this validator.
    fn children(&self) -> Vec<Schema> {
        Vec::new()
    }

    /// Called once when a compiled schema takes ownership of this validator.
    ///
    /// The default wires the owner as parent of every child schema so
    /// sync-flag changes propagate upward.
    fn attach(&self, owner: &Schema) {
        for child in self.children() {
            child.add_parent(owner);
        }
    }

    /// True when this validator can currently run without suspension.
    fn sync_state(&self, visited: &mut SyncVisited) -> bool {
        self.children()
            .iter()
            .all(|child| child.sync_state(visited))
    }

    /// Validates without suspension.
    ///
    /// Returns [`ValidateError::WouldSuspend`] when an unresolved reference
    /// is reached.
    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError>;

    /// Validates, suspending on unresolved references as needed.
    async fn validate(&self, value: &Value) -> Result<(), ValidateError> {
        self.validate_sync(value)
    }
}

/// Builds validators from schema nodes.
///
/// Factories are consulted in registration order; each applicable factory
/// contributes at most one validator. A factory may re-enter the parser to
/// compile sub-schemas, extending the scope pointer for each child.
pub trait ValidatorFactory: Send + Sync {
    /// True when this factory applies to the schema node.
    fn can_handle(&self, schema: &Map<String, Value>) -> bool;

    /// Builds the validator for this factory's keywords.
    ///
    /// Returns `Ok(None)` when the keywords reduce to a no-op (an unknown
    /// `format`, an empty `required` list). Structure errors surface here,
    /// at compile time.
    fn build(
        &self,
        schema: &Map<String, Value>,
        scope: &Pointer,
        parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError>;
}

/// Names the JSON type of a value for error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Compiles an array of schemas at `schema[keyword]`, one scope per index.
pub(crate) fn parse_children(
    parser: &SchemaParser,
    keyword: &'static str,
    nodes: &Value,
    scope: &Pointer,
) -> Result<Vec<Schema>, StructureError> {
    let items = nodes
        .as_array()
        .ok_or(StructureError::WrongType {
            keyword,
            expected: "an array of schemas",
        })?;
    if items.is_empty() {
        return Err(StructureError::WrongType {
            keyword,
            expected: "a non-empty array of schemas",
        });
    }
    items
        .iter()
        .enumerate()
        .map(|(i, node)| parser.parse(node.clone(), scope.push(keyword).push(i.to_string())))
        .collect()
}
