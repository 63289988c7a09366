//! Relationship output types consumed by the wire serializer.

use recordkit_value::Value;
use serde::{Deserialize, Serialize};

/// Cardinality of a relationship as seen from one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    /// At most one related entity.
    ToOne,
    /// Any number of related entities.
    ToMany,
}

/// One concrete link from an entity to a related entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceId {
    /// Kind of the related entity.
    pub kind: String,
    /// Relationship (key) name.
    pub name: String,
    /// Identifier of the related entity.
    pub id: String,
    /// Cardinality of the relationship.
    pub relationship: Relationship,
}

/// Shape of a relationship, independent of any populated value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Kind on the far side of the relationship.
    pub kind: String,
    /// Relationship (key) name.
    pub name: String,
    /// Cardinality of the relationship.
    pub relationship: Relationship,
}

/// Old and new value of one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// Value before the change; `Null` if the attribute is new.
    pub old: Value,
    /// Value after the change.
    pub new: Value,
}

/// A staged unlink of one related entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeleteReferenceInfo {
    /// Relation the entity is unlinked from.
    pub relation_name: String,
    /// Identifier of the unlinked entity.
    pub reference_id: String,
}
