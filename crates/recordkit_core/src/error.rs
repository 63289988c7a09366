//! Error types for recordkit core.

use recordkit_value::ValueError;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur in entity model and relation operations.
///
/// Every mutating operation that returns one of these leaves the model
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A to-one relation link was set with an empty identifier.
    #[error("referenced id for {relation} cannot be empty, use delete to remove")]
    EmptyIdentifier {
        /// Name of the relation attribute.
        relation: String,
    },

    /// No relation descriptor matches the given name.
    #[error("relationship not found: {relation}")]
    RelationNotFound {
        /// The name that failed to match.
        relation: String,
    },

    /// Relation kind text outside the four supported kinds.
    #[error("unsupported relation kind: {kind}")]
    UnsupportedRelationKind {
        /// The rejected kind text.
        kind: String,
    },

    /// An attribute is present but has an unexpected shape.
    #[error("attribute {attribute} has unexpected type: expected {expected}, found {found}")]
    TypeAssertion {
        /// Attribute name.
        attribute: String,
        /// What the operation required.
        expected: String,
        /// What was actually stored.
        found: String,
    },

    /// A required attribute is absent.
    #[error("attribute {attribute} is not set")]
    MissingAttribute {
        /// Attribute name.
        attribute: String,
    },

    /// Attempt to overwrite an identifier that is already assigned.
    #[error("reference_id is immutable once assigned")]
    ImmutableIdentifier,

    /// Foreign key target text could not be parsed.
    #[error("invalid foreign key reference: {input:?}")]
    InvalidForeignKey {
        /// The rejected text.
        input: String,
    },

    /// Entity kind is not registered.
    #[error("entity kind not found: {kind}")]
    KindNotFound {
        /// Name of the kind.
        kind: String,
    },

    /// Value conversion error.
    #[error("value error: {0}")]
    Value(#[from] ValueError),
}

impl ModelError {
    /// Creates an empty identifier error.
    pub fn empty_identifier(relation: impl Into<String>) -> Self {
        Self::EmptyIdentifier {
            relation: relation.into(),
        }
    }

    /// Creates a relation not found error.
    pub fn relation_not_found(relation: impl Into<String>) -> Self {
        Self::RelationNotFound {
            relation: relation.into(),
        }
    }

    /// Creates an unsupported relation kind error.
    pub fn unsupported_relation_kind(kind: impl Into<String>) -> Self {
        Self::UnsupportedRelationKind { kind: kind.into() }
    }

    /// Creates a type assertion error.
    pub fn type_assertion(
        attribute: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeAssertion {
            attribute: attribute.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates a missing attribute error.
    pub fn missing_attribute(attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid foreign key error.
    pub fn invalid_foreign_key(input: impl Into<String>) -> Self {
        Self::InvalidForeignKey {
            input: input.into(),
        }
    }

    /// Creates a kind not found error.
    pub fn kind_not_found(kind: impl Into<String>) -> Self {
        Self::KindNotFound { kind: kind.into() }
    }
}
