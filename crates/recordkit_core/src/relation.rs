//! Relation descriptors between entity kinds.
//!
//! A [`TableRelation`] describes a directed relationship from a subject
//! kind to an object kind. Foreign-key column names default to
//! `<kind>_id` and, like the join table name, are fixed when the
//! descriptor is built. Descriptors are immutable and can be shared
//! freely between threads.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Subject references exactly one object.
    HasOne,
    /// Subject belongs to one object; the object sees many subjects.
    BelongsTo,
    /// Subject has many objects through a join table.
    HasMany,
    /// Many-to-many in both directions through a join table.
    HasManyAndBelongsToMany,
}

impl RelationKind {
    /// Returns the wire name of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            RelationKind::HasOne => "has_one",
            RelationKind::BelongsTo => "belongs_to",
            RelationKind::HasMany => "has_many",
            RelationKind::HasManyAndBelongsToMany => "has_many_and_belongs_to_many",
        }
    }

    /// True for `has_one` and `belongs_to`.
    pub const fn is_singular(self) -> bool {
        matches!(self, RelationKind::HasOne | RelationKind::BelongsTo)
    }

    /// True for `has_many` and `has_many_and_belongs_to_many`.
    pub const fn is_plural(self) -> bool {
        !self.is_singular()
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s {
            "has_one" => Ok(RelationKind::HasOne),
            "belongs_to" => Ok(RelationKind::BelongsTo),
            "has_many" => Ok(RelationKind::HasMany),
            "has_many_and_belongs_to_many" => Ok(RelationKind::HasManyAndBelongsToMany),
            other => Err(ModelError::unsupported_relation_kind(other)),
        }
    }
}

/// Serialized shape of a relation; key names are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTableRelation {
    subject: String,
    relation: RelationKind,
    object: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    subject_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    object_name: String,
}

/// A directed relationship between two entity kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawTableRelation", into = "RawTableRelation")]
pub struct TableRelation {
    subject: String,
    object: String,
    kind: RelationKind,
    subject_key: String,
    object_key: String,
    join_table: String,
}

impl From<RawTableRelation> for TableRelation {
    fn from(raw: RawTableRelation) -> Self {
        TableRelation::with_names(
            raw.subject,
            raw.subject_name,
            raw.relation,
            raw.object,
            raw.object_name,
        )
    }
}

impl From<TableRelation> for RawTableRelation {
    fn from(rel: TableRelation) -> Self {
        RawTableRelation {
            subject: rel.subject,
            relation: rel.kind,
            object: rel.object,
            subject_name: rel.subject_key,
            object_name: rel.object_key,
        }
    }
}

impl TableRelation {
    /// Creates a relation with default key names.
    pub fn new(subject: impl Into<String>, kind: RelationKind, object: impl Into<String>) -> Self {
        Self::with_names(subject, String::new(), kind, object, String::new())
    }

    /// Creates a relation with explicit key names.
    ///
    /// An empty key name falls back to `<kind>_id`.
    pub fn with_names(
        subject: impl Into<String>,
        subject_key: impl Into<String>,
        kind: RelationKind,
        object: impl Into<String>,
        object_key: impl Into<String>,
    ) -> Self {
        let subject = subject.into();
        let object = object.into();
        let subject_key = key_or_default(subject_key.into(), &subject);
        let object_key = key_or_default(object_key.into(), &object);
        let join_table = format!("{subject}_{subject_key}_has_{object}_{object_key}");

        Self {
            subject,
            object,
            kind,
            subject_key,
            object_key,
            join_table,
        }
    }

    /// Creates a relation from a textual kind such as `"has_many"`.
    pub fn parse(
        subject: impl Into<String>,
        kind: &str,
        object: impl Into<String>,
    ) -> ModelResult<Self> {
        Ok(Self::new(subject, kind.parse()?, object))
    }

    /// Subject kind name.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Object kind name.
    pub fn object(&self) -> &str {
        &self.object
    }

    /// Relation cardinality.
    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    /// Foreign-key column naming the subject.
    pub fn subject_key_name(&self) -> &str {
        &self.subject_key
    }

    /// Foreign-key column naming the object.
    pub fn object_key_name(&self) -> &str {
        &self.object_key
    }

    /// Name of the synthetic join table used by plural relations.
    pub fn join_table_name(&self) -> &str {
        &self.join_table
    }

    /// Stable identity text for de-duplication.
    pub fn hash_key(&self) -> String {
        format!(
            "[{}][{}][{}][{}][{}]",
            self.subject_key, self.kind, self.object_key, self.subject, self.object
        )
    }

    /// True if `name` is the object kind or the object key name.
    pub fn matches_object_side(&self, name: &str) -> bool {
        self.object == name || self.object_key == name
    }

    /// True if `name` is the subject kind or the subject key name.
    pub fn matches_subject_side(&self, name: &str) -> bool {
        self.subject == name || self.subject_key == name
    }

    /// Join clause anchored on the subject table.
    ///
    /// The text is consumed verbatim by the query builder.
    pub fn forward_join_fragment(&self) -> String {
        let (s, o) = (&self.subject, &self.object);
        let (sk, ok, jt) = (&self.subject_key, &self.object_key, &self.join_table);
        if self.kind.is_singular() {
            format!(" {o} {ok} on {s}.{ok} = {ok}.id ")
        } else {
            format!(
                " {jt} {jt} on      {jt}.{sk} = {s}.id             join {o} {ok}  on  {jt}.{ok} = {ok}.id "
            )
        }
    }

    /// Join clause anchored on the object table.
    pub fn reverse_join_fragment(&self) -> String {
        let (s, o) = (&self.subject, &self.object);
        let (sk, ok, jt) = (&self.subject_key, &self.object_key, &self.join_table);
        if self.kind.is_singular() {
            format!(" {s} {sk} on {sk}.{ok} = {o}.id ")
        } else {
            format!(" {jt} {jt} on {jt}.{ok} = {o}.id join {s} {sk} on {jt}.{sk} = {sk}.id ")
        }
    }
}

fn key_or_default(key: String, kind: &str) -> String {
    if key.is_empty() {
        format!("{kind}_id")
    } else {
        key
    }
}

impl fmt::Display for TableRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[TableRelation] [{}][{}][{}]",
            self.subject_key, self.kind, self.object_key
        )
    }
}
