//! Error types for the value crate.

use crate::value::ValueKind;
use thiserror::Error;

/// Result type for value operations.
pub type ValueResult<T> = Result<T, ValueError>;

/// Errors that can occur when converting or inspecting values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A value had a different shape than the caller required.
    #[error("expected {expected} value, found {found}")]
    UnexpectedKind {
        /// Kind the caller asked for.
        expected: ValueKind,
        /// Kind that was actually present.
        found: ValueKind,
    },

    /// Text could not be parsed as a UUID.
    #[error("invalid uuid: {input:?}")]
    InvalidUuid {
        /// The rejected text.
        input: String,
    },
}

impl ValueError {
    /// Create an unexpected kind error.
    pub fn unexpected_kind(expected: ValueKind, found: ValueKind) -> Self {
        Self::UnexpectedKind { expected, found }
    }

    /// Create an invalid uuid error.
    pub fn invalid_uuid(input: impl Into<String>) -> Self {
        Self::InvalidUuid {
            input: input.into(),
        }
    }
}
