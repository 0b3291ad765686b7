//! Compiled schemas and the validation entry points.
//!
//! A [`Schema`] is the compiled representation of one schema document node:
//! the raw JSON node, the scope URI it lives under, and a priority-ordered
//! collection of keyword validators. Schemas are cheap to clone and shared
//! freely across the router's address tree, composite validators and `$ref`
//! targets; recursive schema graphs are expected and supported.

mod parser;

pub use parser::{Dialect, SchemaParser};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::ValidateError;
use crate::keywords::{SyncVisited, Validator};
use crate::pointer::Pointer;

pub(crate) struct SchemaCore {
    raw: Value,
    scope: Pointer,
    validators: Vec<Arc<dyn Validator>>,
    sync: AtomicBool,
    parents: RwLock<Vec<Weak<SchemaCore>>>,
}

/// A compiled, reusable schema.
///
/// Produced by [`SchemaParser::parse`]; validates JSON values through
/// [`validate`](Schema::validate) (async, suspends on unresolved references)
/// or [`validate_sync`](Schema::validate_sync) (fails fast with
/// [`ValidateError::WouldSuspend`] while references remain unresolved).
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
///         json!({"type": "integer", "minimum": 0}),
///         Pointer::from_uri("app://schemas/count").unwrap(),
///     )
///     .unwrap();
///
/// assert!(schema.is_sync());
/// assert!(schema.validate_sync(&json!(5)).is_ok());
/// assert!(schema.validate_sync(&json!(-1)).is_err());
/// ```
#[derive(Clone)]
pub struct Schema {
    core: Arc<SchemaCore>,
}

impl Schema {
    pub(crate) fn new(raw: Value, scope: Pointer, validators: Vec<Arc<dyn Validator>>) -> Self {
        let mut validators = validators;
        validators.sort_by_key(|v| v.priority());
        let schema = Self {
            core: Arc::new(SchemaCore {
                raw,
                scope,
                validators,
                sync: AtomicBool::new(false),
                parents: RwLock::new(Vec::new()),
            }),
        };
        for validator in &schema.core.validators {
            validator.attach(&schema);
        }
        schema.recompute_sync();
        schema
    }

    /// The raw JSON node this schema was compiled from.
    pub fn raw(&self) -> &Value {
        &self.core.raw
    }

    /// The scope URI this schema is registered under.
    pub fn scope(&self) -> &Pointer {
        &self.core.scope
    }

    /// True when every reachable reference has resolved, so the schema can
    /// be validated without suspension.
    ///
    /// The flag is monotonic: once a schema becomes synchronous it never
    /// regresses.
    pub fn is_sync(&self) -> bool {
        self.core.sync.load(Ordering::Acquire)
    }

    /// Validates a value, resolving references as needed.
    ///
    /// Validators run in priority order; the first synchronous failure
    /// terminates immediately. Validators that would suspend are collected
    /// and awaited concurrently, failing on the first discovered failure.
    pub async fn validate(&self, value: &Value) -> Result<(), ValidateError> {
        let mut pending: Vec<&Arc<dyn Validator>> = Vec::new();
        for validator in &self.core.validators {
            let mut visited = SyncVisited::new();
            if validator.sync_state(&mut visited) {
                validator
                    .validate_sync(value)
                    .map_err(|e| e.fill_scope(&self.core.scope))?;
            } else {
                pending.push(validator);
            }
        }
        if !pending.is_empty() {
            futures::future::try_join_all(pending.iter().map(|v| v.validate(value)))
                .await
                .map_err(|e| e.fill_scope(&self.core.scope))?;
        }
        Ok(())
    }

    /// Validates a value without suspension.
    ///
    /// # Errors
    ///
    /// Returns [`ValidateError::WouldSuspend`] when the schema still
    /// contains unresolved references; otherwise behaves exactly like
    /// [`validate`](Schema::validate) with every check inline.
    pub fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        if !self.is_sync() {
            // References resolvable from the cache are adopted here, so a
            // fully-local schema graph never needs the async path.
            self.recompute_sync();
            if !self.is_sync() {
                return Err(ValidateError::WouldSuspend);
            }
        }
        for validator in &self.core.validators {
            validator
                .validate_sync(value)
                .map_err(|e| e.fill_scope(&self.core.scope))?;
        }
        Ok(())
    }

    /// Registers `parent` to be notified when this schema's sync flag flips.
    pub(crate) fn add_parent(&self, parent: &Schema) {
        let weak = Arc::downgrade(&parent.core);
        let mut parents = self.core.parents.write();
        if !parents
            .iter()
            .any(|p| Weak::ptr_eq(p, &weak))
        {
            parents.push(weak);
        }
    }

    /// Computes whether this schema is currently synchronous.
    ///
    /// Cycles are cut at already-visited schemas: a reference loop counts as
    /// synchronous once every reference on it has a resolved target.
    pub(crate) fn sync_state(&self, visited: &mut SyncVisited) -> bool {
        if self.is_sync() {
            return true;
        }
        if !visited.insert(self.identity()) {
            return true;
        }
        self.core
            .validators
            .iter()
            .all(|v| v.sync_state(visited))
    }

    /// Recomputes the sync flag and, on a false→true transition, notifies
    /// every registered parent so the change propagates to the schema root.
    pub(crate) fn recompute_sync(&self) {
        if self.is_sync() {
            return;
        }
        let mut visited = SyncVisited::new();
        if !self.sync_state(&mut visited) {
            return;
        }
        self.core.sync.store(true, Ordering::Release);
        let parents: Vec<Weak<SchemaCore>> = self.core.parents.read().clone();
        for parent in parents {
            if let Some(core) = parent.upgrade() {
                Schema { core }.recompute_sync();
            }
        }
    }

    /// Returns a weak handle that does not keep the schema alive.
    pub(crate) fn downgrade(&self) -> WeakSchema {
        WeakSchema(Arc::downgrade(&self.core))
    }

    fn identity(&self) -> usize {
        Arc::as_ptr(&self.core) as usize
    }
}

/// A weak back-reference to a schema, used by `$ref` validators to reach
/// their owner without creating an ownership cycle.
pub(crate) struct WeakSchema(Weak<SchemaCore>);

impl WeakSchema {
    pub(crate) fn upgrade(&self) -> Option<Schema> {
        self.0.upgrade().map(|core| Schema { core })
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("scope", &self.core.scope.to_uri())
            .field("sync", &self.is_sync())
            .finish()
    }
}
