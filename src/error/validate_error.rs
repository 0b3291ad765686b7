//! Runtime validation error types.

use std::fmt::{self, Display};

use serde_json::Value;

use crate::pointer::Pointer;

/// A single validation mismatch with full context.
///
/// `Mismatch` captures everything needed to trace a failure back to the
/// exact sub-schema and input location that produced it:
/// - **keyword**: the schema keyword whose rule was violated
/// - **message**: human-readable description of the failure
/// - **value**: the offending input value
/// - **scope**: the URI/pointer identity of the sub-schema that failed,
///   filled in by the owning schema as the error propagates
///
/// # Example
///
/// ```rust
/// use waypoint::{Mismatch, ValidateError};
/// use serde_json::json;
///
/// let err = ValidateError::mismatch("minimum", "-1 is less than 0", json!(-1));
/// match err {
///     ValidateError::Mismatch(m) => assert_eq!(m.keyword, "minimum"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// The schema keyword that produced the failure.
    pub keyword: String,
    /// Human-readable error message.
    pub message: String,
    /// The input value that failed validation.
    pub value: Value,
    /// Scope of the sub-schema that produced the failure.
    pub scope: Option<Pointer>,
}

impl Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' failed: {}", self.keyword, self.message)?;
        if let Some(ref scope) = self.scope {
            write!(f, " (schema {})", scope.to_uri())?;
        }
        Ok(())
    }
}

impl std::error::Error for Mismatch {}

/// The outcome of a failed validation call.
///
/// A single validation yields at most one of these: either the input value
/// violated a keyword's rule ([`Mismatch`]), a `$ref` could not be resolved
/// ([`Reference`](ValidateError::Reference)), or a synchronous entry point
/// was invoked on a schema that still contains unresolved references
/// ([`WouldSuspend`](ValidateError::WouldSuspend)).
///
/// Reference errors are deliberately distinct from mismatches so callers can
/// tell "invalid document" apart from "broken schema".
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidateError {
    /// The input value failed a keyword's rule.
    #[error(transparent)]
    Mismatch(Box<Mismatch>),

    /// A `$ref` could not be resolved: not found after fetch, or the fetch
    /// itself failed.
    #[error("unresolvable $ref '{uri}': {reason}")]
    Reference {
        /// The reference URI that failed to resolve.
        uri: String,
        /// What went wrong while resolving it.
        reason: String,
    },

    /// Synchronous validation was requested while the schema still contains
    /// unresolved references.
    #[error("schema contains unresolved references, synchronous validation would suspend")]
    WouldSuspend,
}

impl ValidateError {
    /// Creates a mismatch error for the given keyword.
    ///
    /// The scope is left empty; the owning schema fills it in as the error
    /// propagates outward.
    pub fn mismatch(
        keyword: impl Into<String>,
        message: impl Into<String>,
        value: Value,
    ) -> Self {
        ValidateError::Mismatch(Box::new(Mismatch {
            keyword: keyword.into(),
            message: message.into(),
            value,
            scope: None,
        }))
    }

    /// Fills the mismatch scope if it has not been set yet.
    ///
    /// Inner schemas fill their scope first; outer schemas see the scope
    /// already present and leave it alone, so the error always points at the
    /// deepest sub-schema that produced it.
    pub(crate) fn fill_scope(mut self, scope: &Pointer) -> Self {
        if let ValidateError::Mismatch(ref mut m) = self {
            if m.scope.is_none() {
                m.scope = Some(scope.clone());
            }
        }
        self
    }

    /// Returns true if this is a validation mismatch.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, ValidateError::Mismatch(_))
    }

    /// Returns true if this is a reference-resolution error.
    pub fn is_reference(&self) -> bool {
        matches!(self, ValidateError::Reference { .. })
    }

    /// Returns the mismatch details, if this is a mismatch.
    pub fn as_mismatch(&self) -> Option<&Mismatch> {
        match self {
            ValidateError::Mismatch(m) => Some(m),
            _ => None,
        }
    }
}
