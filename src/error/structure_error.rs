//! Schema structure errors raised at compile time.

use crate::pointer::PointerError;

/// An error in the schema document itself, detected while compiling.
///
/// Structure errors are raised by [`SchemaParser::parse`](crate::SchemaParser::parse)
/// when a keyword's value has the wrong JSON type, is null where a value is
/// required, or carries an invalid regex pattern. They are never produced by
/// validation: a schema that compiled successfully only ever reports
/// [`ValidateError`](crate::ValidateError) at runtime.
#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    /// A keyword's value has the wrong JSON type.
    #[error("'{keyword}' must be {expected}")]
    WrongType {
        /// The offending keyword.
        keyword: &'static str,
        /// A description of the expected JSON shape.
        expected: &'static str,
    },

    /// A keyword's value is null where a value is required.
    #[error("'{keyword}' must not be null")]
    NullKeyword {
        /// The offending keyword.
        keyword: &'static str,
    },

    /// A regex-bearing keyword contains an invalid pattern.
    #[error("invalid pattern in '{keyword}': {source}")]
    InvalidRegex {
        /// The offending keyword.
        keyword: &'static str,
        /// The underlying regex compilation error.
        #[source]
        source: Box<regex::Error>,
    },

    /// A URI-bearing keyword ($id, $ref) contains an unusable URI.
    #[error("invalid uri in '{keyword}': '{uri}'")]
    InvalidUri {
        /// The offending keyword.
        keyword: &'static str,
        /// The URI text that failed to parse.
        uri: String,
    },

    /// The schema document is neither an object nor a boolean.
    #[error("schema must be an object or boolean, got {got}")]
    NotASchema {
        /// The JSON type that was found instead.
        got: &'static str,
    },

    /// Unparsed schema text is not valid JSON.
    #[error("schema text is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A pointer embedded in the schema ($ref fragment) is malformed.
    #[error(transparent)]
    Pointer(#[from] PointerError),
}
