//! Reference resolution: `$ref` and eager `definitions` compilation.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{StructureError, ValidateError};
use crate::keywords::{Priority, SyncVisited, Validator, ValidatorFactory};
use crate::pointer::Pointer;
use crate::schema::{Schema, SchemaParser};

/// The `$ref` keyword: this schema is defined elsewhere.
///
/// The target is resolved through the schema router, locally when cached and
/// through a fetch otherwise. The first successful resolution fills the
/// target cache exactly once; every later validation reuses it. Resolution
/// flips the owning schema's sync flag through
/// [`Schema::recompute_sync`], releasing the synchronous validation path.
struct RefValidator {
    reference: Pointer,
    scope: Pointer,
    parser: SchemaParser,
    target: OnceLock<Schema>,
    owner: OnceLock<crate::schema::WeakSchema>,
}

impl RefValidator {
    /// Adopts a resolved target (a cache-fill, not a general mutation) and
    /// propagates the sync-state change upward from the owning schema.
    fn adopt(&self, target: Schema) {
        if self.target.set(target.clone()).is_err() {
            return;
        }
        if let Some(owner) = self.owner.get().and_then(|w| w.upgrade()) {
            target.add_parent(&owner);
            owner.recompute_sync();
        }
    }

    /// Attempts a purely local, no-I/O resolution through the router cache.
    fn try_cached(&self) -> Option<Schema> {
        if let Some(target) = self.target.get() {
            return Some(target.clone());
        }
        let cached = self
            .parser
            .router()
            .resolve_cached(&self.reference, &self.scope, &self.parser)?;
        self.adopt(cached.clone());
        Some(cached)
    }
}

#[async_trait]
impl Validator for RefValidator {
    fn keyword(&self) -> &'static str {
        "$ref"
    }

    fn priority(&self) -> Priority {
        Priority::Contextual
    }

    fn children(&self) -> Vec<Schema> {
        match self.target.get() {
            Some(target) => vec![target.clone()],
            None => Vec::new(),
        }
    }

    fn attach(&self, owner: &Schema) {
        let _ = self.owner.set(owner.downgrade());
    }

    fn sync_state(&self, visited: &mut SyncVisited) -> bool {
        match self.try_cached() {
            Some(target) => target.sync_state(visited),
            None => false,
        }
    }

    fn validate_sync(&self, value: &Value) -> Result<(), ValidateError> {
        match self.try_cached() {
            Some(target) => target.validate_sync(value),
            None => Err(ValidateError::WouldSuspend),
        }
    }

    async fn validate(&self, value: &Value) -> Result<(), ValidateError> {
        let target = match self.try_cached() {
            Some(target) => target,
            None => {
                let resolved = self
                    .parser
                    .router()
                    .resolve_ref(&self.reference, &self.scope, &self.parser)
                    .await?;
                self.adopt(resolved.clone());
                resolved
            }
        };
        target.validate(value).await
    }
}

pub(crate) struct RefFactory;

impl ValidatorFactory for RefFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("$ref")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        scope: &Pointer,
        parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let text = schema["$ref"].as_str().ok_or(StructureError::WrongType {
            keyword: "$ref",
            expected: "a string",
        })?;
        let reference = Pointer::from_uri(text)?;
        Ok(Some(Arc::new(RefValidator {
            reference,
            scope: scope.clone(),
            parser: parser.clone(),
            target: OnceLock::new(),
            owner: OnceLock::new(),
        })))
    }
}

/// Eagerly compiles `definitions` children so local references resolve
/// without lazy cache walks. Contributes no validator of its own.
pub(crate) struct DefinitionsFactory;

impl ValidatorFactory for DefinitionsFactory {
    fn can_handle(&self, schema: &Map<String, Value>) -> bool {
        schema.contains_key("definitions")
    }

    fn build(
        &self,
        schema: &Map<String, Value>,
        scope: &Pointer,
        parser: &SchemaParser,
    ) -> Result<Option<Arc<dyn Validator>>, StructureError> {
        let entries = schema["definitions"]
            .as_object()
            .ok_or(StructureError::WrongType {
                keyword: "definitions",
                expected: "an object of schemas",
            })?;
        let base = scope.push("definitions");
        for (name, node) in entries {
            parser.parse(node.clone(), base.push(name.as_str()))?;
        }
        Ok(None)
    }
}
