//! Error types for TOON encoding/decoding and query evaluation.

use thiserror::Error;

/// Errors that can occur during TOON encoding or decoding.
#[derive(Error, Debug)]
pub enum ToonError {
    /// The input was not valid TOON.
    /// Includes the 1-based line number where the error was detected.
    #[error("TOON parse error at line {line}: {message}")]
    Decode { line: usize, message: String },

    /// A tabular row did not have as many cells as the header declares.
    #[error("TOON parse error at line {line}: field count mismatch (expected {expected} fields, got {actual})")]
    FieldCountMismatch {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// A structural error during encoding (non-finite number, bad options).
    #[error("Encoding error: {0}")]
    Encode(String),

    /// The input string was not valid JSON (string convenience path).
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToonError {
    pub(crate) fn decode(line: usize, message: impl Into<String>) -> Self {
        ToonError::Decode {
            line,
            message: message.into(),
        }
    }
}

/// Errors raised while parsing or evaluating a query.
///
/// Every variant aborts the whole query; there is no partial-result mode.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The query text is malformed. `position` is a 0-based character offset
    /// and `snippet` the text starting there.
    #[error("parse error at position {position} near '{snippet}': {message}")]
    Parse {
        position: usize,
        snippet: String,
        message: String,
    },

    /// An operation received a value of the wrong type.
    #[error("{operation}: expected {expected}, got {actual}")]
    Type {
        operation: String,
        expected: String,
        actual: String,
    },

    /// An array index was still out of range after resolving negatives.
    #[error("index {index} out of range for array of length {length}")]
    IndexOutOfRange { index: i64, length: usize },

    /// A builtin was called with an unsupported number of arguments.
    #[error("{function}: expected {expected} argument(s)")]
    Arity { function: String, expected: String },

    /// No builtin with this name exists.
    #[error("unknown function: {name}")]
    UnknownFunction { name: String },

    /// A builtin received an argument of the right type but an unusable value
    /// (zero step, negative count, unparsable number, ...).
    #[error("{function}: {message}")]
    InvalidArgument { function: String, message: String },
}

impl QueryError {
    pub(crate) fn type_error(
        operation: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        QueryError::Type {
            operation: operation.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub(crate) fn invalid(function: impl Into<String>, message: impl Into<String>) -> Self {
        QueryError::InvalidArgument {
            function: function.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias used by the codec modules.
pub type Result<T> = std::result::Result<T, ToonError>;

/// Convenience alias used by the query modules.
pub type QueryResult<T> = std::result::Result<T, QueryError>;
