//! Error types for schema compilation and validation.
//!
//! This module provides the compile-time [`StructureError`] and the runtime
//! [`ValidateError`]/[`Mismatch`] types, keeping "broken schema" failures
//! distinct from "invalid document" failures.

mod structure_error;
mod validate_error;

pub use structure_error::StructureError;
pub use validate_error::{Mismatch, ValidateError};
