//! Dynamic entity model with change tracking.
//!
//! An [`Api2GoModel`] is one row of a runtime-registered kind. Its
//! attributes live in a string-keyed [`AttributeMap`]; the kind's
//! [`KindSchema`] supplies column metadata and relation descriptors.
//!
//! # Dirty tracking
//!
//! A model starts clean. The first tracked write that changes a value
//! (compared structurally, see [`recordkit_value::are_values_equal`])
//! copies the current attributes into a previous snapshot and marks the
//! model dirty. Later writes update the current attributes only; the
//! previous snapshot stays as it was captured until the model is rebuilt.
//!
//! ```
//! use recordkit_core::{Api2GoModel, KindSchema};
//! use recordkit_value::Value;
//! use std::sync::Arc;
//!
//! let schema = Arc::new(KindSchema::builder("post").build());
//! let mut post = Api2GoModel::new(schema);
//!
//! post.set_attribute("title", Value::from("hello")).unwrap();
//! post.set_attribute("title", Value::from("hello")).unwrap();
//! assert!(!post.is_dirty());
//!
//! post.set_attribute("title", Value::from("world")).unwrap();
//! assert!(post.is_dirty());
//! assert_eq!(post.changes()["title"].old, Value::from("hello"));
//! ```

use crate::column::ColumnInfo;
use crate::config::VersionPolicy;
use crate::error::{ModelError, ModelResult};
use crate::identifier::{
    self, new_reference_id, normalize_identifier, ID, REFERENCE_ID, TYPE_ATTRIBUTE, VERSION,
};
use crate::observer::{default_observer, SharedObserver};
use crate::reference::{Change, DeleteReferenceInfo, Reference, ReferenceId, Relationship};
use crate::relation::{RelationKind, TableRelation};
use crate::schema::KindSchema;
use recordkit_value::{are_values_equal, AttributeMap, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

static EMPTY: AttributeMap = BTreeMap::new();

/// A dynamically typed entity instance.
///
/// Models are single-owner values; the schema and its relation
/// descriptors are shared read-only.
#[derive(Clone)]
pub struct Api2GoModel {
    schema: Arc<KindSchema>,
    /// Current attributes; `None` until the first write.
    data: Option<AttributeMap>,
    /// Attributes as they were before the first change. Present iff dirty.
    previous: Option<AttributeMap>,
    /// To-many unlinks staged for the persistence layer.
    pending_deletions: BTreeMap<String, Vec<String>>,
    includes: Vec<Api2GoModel>,
    observer: SharedObserver,
}

impl fmt::Debug for Api2GoModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api2GoModel")
            .field("kind", &self.schema.name())
            .field("data", &self.data)
            .field("previous", &self.previous)
            .field("pending_deletions", &self.pending_deletions)
            .field("includes", &self.includes.len())
            .finish_non_exhaustive()
    }
}

impl Api2GoModel {
    /// Creates an empty model of the given kind.
    pub fn new(schema: Arc<KindSchema>) -> Self {
        Self {
            schema,
            data: None,
            previous: None,
            pending_deletions: BTreeMap::new(),
            includes: Vec::new(),
            observer: default_observer(),
        }
    }

    /// Creates a clean model from loaded attributes.
    ///
    /// The `__type` attribute is set to the kind name.
    pub fn with_data(schema: Arc<KindSchema>, mut data: AttributeMap) -> Self {
        data.insert(TYPE_ATTRIBUTE.to_string(), Value::from(schema.name()));
        let mut model = Self::new(schema);
        model.data = Some(data);
        model
    }

    /// Creates a clean model from a decoded JSON object.
    ///
    /// Numbers are narrowed to integer, float or text.
    pub fn from_json(schema: Arc<KindSchema>, json: serde_json::Value) -> ModelResult<Self> {
        let data = Value::from_json(json).into_map()?;
        Ok(Self::with_data(schema, data))
    }

    /// Replaces the observer that receives state transition events.
    #[must_use]
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    // ------------------------------------------------------------------
    // Schema accessors
    // ------------------------------------------------------------------

    /// Kind name.
    pub fn kind(&self) -> &str {
        self.schema.name()
    }

    /// Kind schema.
    pub fn schema(&self) -> &Arc<KindSchema> {
        &self.schema
    }

    /// Column schema in declaration order.
    pub fn columns(&self) -> &[ColumnInfo] {
        self.schema.columns()
    }

    /// Column metadata by storage name.
    pub fn column(&self, column_name: &str) -> Option<&ColumnInfo> {
        self.schema.column(column_name)
    }

    /// Storage names of all columns.
    pub fn column_names(&self) -> Vec<&str> {
        self.schema.column_names()
    }

    /// See [`KindSchema::has_column`].
    pub fn has_column(&self, column_name: &str) -> bool {
        self.schema.has_column(column_name)
    }

    /// See [`KindSchema::has_many`].
    pub fn has_many(&self, kind: &str) -> bool {
        self.schema.has_many(kind)
    }

    /// Relation descriptors applicable to this kind.
    pub fn relations(&self) -> &[Arc<TableRelation>] {
        self.schema.relations()
    }

    /// Default access permission for the kind.
    pub fn default_permission(&self) -> i64 {
        self.schema.default_permission()
    }

    // ------------------------------------------------------------------
    // Attribute reads
    // ------------------------------------------------------------------

    /// True once a tracked write changed a value.
    pub fn is_dirty(&self) -> bool {
        self.previous.is_some()
    }

    /// Current attributes.
    pub fn attributes(&self) -> &AttributeMap {
        self.data.as_ref().unwrap_or(&EMPTY)
    }

    /// Current value of one attribute.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes().get(name)
    }

    /// Snapshot captured at the first change, if dirty.
    pub fn previous_attributes(&self) -> Option<&AttributeMap> {
        self.previous.as_ref()
    }

    /// Attributes as last loaded: the previous snapshot if dirty,
    /// otherwise the current attributes.
    pub fn unmodified_attributes(&self) -> &AttributeMap {
        self.previous.as_ref().unwrap_or_else(|| self.attributes())
    }

    /// Value of a column as last loaded.
    pub fn column_original_value(&self, column_name: &str) -> Option<&Value> {
        self.unmodified_attributes().get(column_name)
    }

    /// Current attributes, completed with keys only present in the
    /// previous snapshot, and tagged with the kind.
    pub fn all_as_attributes(&self) -> AttributeMap {
        let mut attrs = self.attributes().clone();
        attrs.insert(TYPE_ATTRIBUTE.to_string(), Value::from(self.kind()));
        if let Some(previous) = &self.previous {
            for (k, v) in previous {
                attrs.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        attrs
    }

    /// Identifier as last loaded.
    pub fn id(&self) -> Option<String> {
        self.unmodified_attributes()
            .get(REFERENCE_ID)
            .and_then(Value::to_id_string)
    }

    /// Current identifier.
    pub fn reference_id(&self) -> Option<String> {
        self.get(REFERENCE_ID).and_then(Value::to_id_string)
    }

    /// Attributes safe to send to API clients.
    ///
    /// Columns excluded from the API are dropped and sensitive columns are
    /// blanked (unless disabled in the kind's configuration).
    pub fn serializable_attributes(&self) -> AttributeMap {
        let redact = self.schema.config().redact_sensitive;
        self.attributes()
            .iter()
            .filter_map(|(k, v)| match self.schema.column(k) {
                Some(col) if col.exclude_from_api => None,
                Some(col) if redact && col.is_sensitive() => {
                    Some((k.clone(), Value::from("")))
                }
                _ => Some((k.clone(), v.clone())),
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Untracked writes (loaders, persistence hooks)
    // ------------------------------------------------------------------

    /// Writes an attribute without dirty tracking.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.data
            .get_or_insert_with(AttributeMap::new)
            .insert(name.into(), value.into());
    }

    /// Overrides the `__type` attribute.
    pub fn set_type(&mut self, kind: impl Into<String>) {
        self.set(TYPE_ATTRIBUTE, Value::from(kind.into()));
    }

    /// Assigns the identifier before creation.
    ///
    /// Text that parses as a UUID is stored as one.
    pub fn set_id(&mut self, id: &str) {
        self.set(REFERENCE_ID, identifier::identifier_value(id));
    }

    /// Assigns a fresh time-ordered identifier. Called right before the
    /// first insert.
    pub fn before_create(&mut self) -> Uuid {
        let id = new_reference_id();
        self.set(REFERENCE_ID, Value::Uuid(id));
        id
    }

    // ------------------------------------------------------------------
    // Tracked writes
    // ------------------------------------------------------------------

    /// Merges attributes into the model, tracking changes.
    ///
    /// The first write to a model without data adopts the attributes as its
    /// loaded state. After that, the first write that changes any value
    /// captures the previous snapshot. There is no way back to clean short
    /// of rebuilding the model.
    ///
    /// # Errors
    ///
    /// [`ModelError::ImmutableIdentifier`] if the write would change an
    /// already assigned `reference_id`. The model is left untouched.
    pub fn set_attributes(&mut self, mut attrs: AttributeMap) -> ModelResult<()> {
        if let Some(incoming) = attrs.get_mut(REFERENCE_ID) {
            normalize_identifier(incoming);
            let assigned = self.get(REFERENCE_ID).filter(|v| !v.is_null());
            if let Some(existing) = assigned {
                if !are_values_equal(Some(existing), Some(incoming)) {
                    return Err(self.reject(ModelError::ImmutableIdentifier));
                }
            }
        }

        if self.data.is_none() {
            attrs.insert(TYPE_ATTRIBUTE.to_string(), Value::from(self.kind()));
            self.data = Some(attrs);
            return Ok(());
        }
        let current = self.data.get_or_insert_with(AttributeMap::new);

        if self.previous.is_none() {
            let changed = attrs
                .iter()
                .filter(|(k, _)| k.as_str() != REFERENCE_ID)
                .find(|(k, v)| match current.get(k.as_str()) {
                    Some(existing) => !are_values_equal(Some(existing), Some(*v)),
                    None => true,
                })
                .map(|(k, _)| k.clone());

            if let Some(attribute) = changed {
                self.previous = Some(current.clone());
                self.observer.became_dirty(self.schema.name(), &attribute);
            }
        }

        current.extend(attrs);
        Ok(())
    }

    /// Sets one attribute, tracking changes.
    pub fn set_attribute(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> ModelResult<()> {
        let mut attrs = AttributeMap::new();
        attrs.insert(name.into(), value.into());
        self.set_attributes(attrs)
    }

    /// Links a single related entity by id.
    ///
    /// # Errors
    ///
    /// [`ModelError::EmptyIdentifier`] if `id` is empty; use
    /// [`delete_to_many_references`](Self::delete_to_many_references) to
    /// unlink.
    pub fn set_to_one_reference(&mut self, name: &str, id: &str) -> ModelResult<()> {
        if id.is_empty() {
            return Err(self.reject(ModelError::empty_identifier(name)));
        }
        self.set_attribute(name, Value::from(id))
    }

    /// Replaces the rows linked through a relation.
    ///
    /// `name` selects the relation by kind or key name on either side.
    /// Each row receives the owner's identifier under the key of the
    /// matched side. Rows of plural relations also get `reference_id`
    /// copied from `id`; rows of singular relations are tagged with the
    /// related kind in `__type`. The rows are stored under `name` through
    /// the tracked write path. An empty row list changes nothing.
    ///
    /// # Errors
    ///
    /// [`ModelError::RelationNotFound`] if no relation matches `name`.
    pub fn set_to_many_references(
        &mut self,
        name: &str,
        rows: Vec<AttributeMap>,
    ) -> ModelResult<()> {
        let Some(relation) = self
            .find_relation(|rel| rel.matches_object_side(name) || rel.matches_subject_side(name))
        else {
            return Err(self.reject(ModelError::relation_not_found(name)));
        };

        if rows.is_empty() {
            return Ok(());
        }

        let (key, related_kind) = if relation.matches_object_side(name) {
            (relation.object_key_name(), relation.object())
        } else {
            (relation.subject_key_name(), relation.subject())
        };
        let owner_id = self.get(REFERENCE_ID).cloned().unwrap_or(Value::Null);

        let rows: Vec<Value> = rows
            .into_iter()
            .map(|mut row| {
                if relation.kind().is_plural() {
                    let id = row.get(ID).cloned().unwrap_or(Value::Null);
                    row.insert(REFERENCE_ID.to_string(), id);
                } else {
                    row.insert(TYPE_ATTRIBUTE.to_string(), Value::from(related_kind));
                }
                row.insert(key.to_string(), owner_id.clone());
                Value::Map(row)
            })
            .collect();

        self.set_attribute(name, Value::Array(rows))
    }

    /// Additive to-many edits are not supported; replace the full set
    /// with [`set_to_many_references`](Self::set_to_many_references).
    ///
    /// # Errors
    ///
    /// Always [`ModelError::RelationNotFound`].
    pub fn add_to_many_references(&mut self, name: &str, _ids: &[String]) -> ModelResult<()> {
        Err(self.reject(ModelError::relation_not_found(name)))
    }

    /// Unlinks related entities.
    ///
    /// For a singular relation owned by this kind, the attribute is
    /// cleared (tracked) when it currently holds the first id. For any
    /// other relation the ids are staged in
    /// [`pending_deletions`](Self::pending_deletions), replacing earlier
    /// ids staged for the same name.
    ///
    /// # Errors
    ///
    /// [`ModelError::RelationNotFound`] if no relation matches `name`.
    pub fn delete_to_many_references(&mut self, name: &str, ids: &[String]) -> ModelResult<()> {
        let kind = self.schema.name();
        let Some(relation) = self.find_relation(|rel| {
            (rel.subject() == kind && rel.matches_object_side(name))
                || (rel.object() == kind && rel.matches_subject_side(name))
        }) else {
            return Err(self.reject(ModelError::relation_not_found(name)));
        };

        if relation.kind().is_singular() && relation.subject() == self.kind() {
            let current = self.get(name).and_then(Value::to_id_string);
            if let (Some(current), Some(first)) = (current, ids.first()) {
                if &current == first {
                    self.set_attribute(name, Value::Null)?;
                    self.observer.reference_cleared(self.schema.name(), name);
                }
            }
        } else {
            self.pending_deletions
                .insert(name.to_string(), ids.to_vec());
            self.observer
                .deletion_staged(self.schema.name(), name, ids);
        }
        Ok(())
    }

    /// Unlinks staged by [`delete_to_many_references`](Self::delete_to_many_references),
    /// keyed by relation name.
    pub fn pending_deletions(&self) -> &BTreeMap<String, Vec<String>> {
        &self.pending_deletions
    }

    /// Removes and returns the staged unlinks.
    pub fn take_pending_deletions(&mut self) -> BTreeMap<String, Vec<String>> {
        std::mem::take(&mut self.pending_deletions)
    }

    /// Staged unlinks as a flat list.
    pub fn delete_reference_infos(&self) -> Vec<DeleteReferenceInfo> {
        self.pending_deletions
            .iter()
            .flat_map(|(relation, ids)| {
                ids.iter().map(move |id| DeleteReferenceInfo {
                    relation_name: relation.clone(),
                    reference_id: id.clone(),
                })
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Relationship output
    // ------------------------------------------------------------------

    /// Concrete links from this entity, read from its current attributes.
    ///
    /// # Errors
    ///
    /// [`ModelError::TypeAssertion`] if a relation attribute holds
    /// something that is not an identifier (or a sequence of them, for
    /// to-many relations).
    pub fn referenced_identifiers(&self) -> ModelResult<Vec<ReferenceId>> {
        let mut references = Vec::new();

        for rel in self.relations() {
            let owns = rel.subject() == self.kind();
            let (far_kind, key) = if owns {
                (rel.object(), rel.object_key_name())
            } else {
                (rel.subject(), rel.subject_key_name())
            };

            let Some(value) = self.get(key).filter(|v| !v.is_null()) else {
                continue;
            };

            if relationship(rel.kind(), owns) == Relationship::ToOne {
                // Rows written by set_to_many_references arrive as a one-row list.
                let linked = match value {
                    Value::Array(items) if items.is_empty() => continue,
                    Value::Array(items) if items.len() == 1 => &items[0],
                    other => other,
                };
                let id = row_identifier(linked).ok_or_else(|| {
                    ModelError::type_assertion(key, "identifier", value.kind().to_string())
                })?;
                references.push(ReferenceId {
                    kind: far_kind.to_string(),
                    name: key.to_string(),
                    id,
                    relationship: Relationship::ToOne,
                });
            } else {
                for id in identifier_list(key, value)? {
                    references.push(ReferenceId {
                        kind: far_kind.to_string(),
                        name: key.to_string(),
                        id,
                        relationship: Relationship::ToMany,
                    });
                }
            }
        }

        Ok(references)
    }

    /// Relationship shapes of this kind, whether populated or not.
    pub fn references(&self) -> Vec<Reference> {
        self.relations()
            .iter()
            .map(|rel| {
                let owns = rel.subject() == self.kind();
                let (kind, name) = if owns {
                    (rel.object(), rel.object_key_name())
                } else {
                    (rel.subject(), rel.subject_key_name())
                };
                Reference {
                    kind: kind.to_string(),
                    name: name.to_string(),
                    relationship: relationship(rel.kind(), owns),
                }
            })
            .collect()
    }

    /// Adds a related model to be serialized alongside this one.
    pub fn add_include(&mut self, model: Api2GoModel) {
        self.includes.push(model);
    }

    /// Related models added with [`add_include`](Self::add_include).
    pub fn referenced_models(&self) -> &[Api2GoModel] {
        &self.includes
    }

    // ------------------------------------------------------------------
    // Audit, changes, versions
    // ------------------------------------------------------------------

    /// Historical record of this entity as last loaded.
    ///
    /// The audit model has kind `<kind>_audit`, carries no identifier
    /// attributes, and is built from the previous snapshot when dirty.
    pub fn audit_snapshot(&self) -> Api2GoModel {
        let schema = Arc::new(self.schema.audit_schema());
        let data: AttributeMap = self
            .unmodified_attributes()
            .iter()
            .filter(|(k, _)| k.as_str() != REFERENCE_ID && k.as_str() != ID)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Api2GoModel::with_data(schema, data).with_observer(Arc::clone(&self.observer))
    }

    /// Attributes that differ from the previous snapshot.
    ///
    /// Empty while the model is clean.
    pub fn changes(&self) -> BTreeMap<String, Change> {
        let Some(previous) = &self.previous else {
            return BTreeMap::new();
        };

        self.attributes()
            .iter()
            .filter_map(|(key, new)| match previous.get(key) {
                None => Some((
                    key.clone(),
                    Change {
                        old: Value::Null,
                        new: new.clone(),
                    },
                )),
                Some(old) if !are_values_equal(Some(old), Some(new)) => Some((
                    key.clone(),
                    Change {
                        old: old.clone(),
                        new: new.clone(),
                    },
                )),
                Some(_) => None,
            })
            .collect()
    }

    /// True if the last loaded attributes carry a `version`.
    pub fn has_version(&self) -> bool {
        self.unmodified_attributes()
            .get(VERSION)
            .is_some_and(|v| !v.is_null())
    }

    /// Version as last loaded.
    ///
    /// # Errors
    ///
    /// [`ModelError::MissingAttribute`] if absent under
    /// [`VersionPolicy::Required`]; [`ModelError::TypeAssertion`] if the
    /// version is not an integer.
    pub fn current_version(&self) -> ModelResult<i64> {
        match self.unmodified_attributes().get(VERSION) {
            None | Some(Value::Null) => match self.schema.config().version_policy {
                VersionPolicy::Required => Err(ModelError::missing_attribute(VERSION)),
                VersionPolicy::DefaultZero => Ok(0),
            },
            Some(Value::Integer(n)) => Ok(*n),
            Some(other) => Err(ModelError::type_assertion(
                VERSION,
                "integer",
                other.kind().to_string(),
            )),
        }
    }

    /// Version the next write should carry.
    pub fn next_version(&self) -> ModelResult<i64> {
        Ok(self.current_version()?.saturating_add(1))
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn find_relation(&self, pred: impl Fn(&TableRelation) -> bool) -> Option<Arc<TableRelation>> {
        self.relations().iter().find(|rel| pred(rel.as_ref())).cloned()
    }

    fn reject(&self, err: ModelError) -> ModelError {
        self.observer.mutation_rejected(self.schema.name(), &err);
        err
    }
}

/// Cardinality of a relation as seen from one of its sides.
fn relationship(kind: RelationKind, owns: bool) -> Relationship {
    match (kind, owns) {
        (RelationKind::HasOne, _) | (RelationKind::BelongsTo, true) => Relationship::ToOne,
        (RelationKind::BelongsTo, false)
        | (RelationKind::HasMany, _)
        | (RelationKind::HasManyAndBelongsToMany, _) => Relationship::ToMany,
    }
}

fn identifier_list(attribute: &str, value: &Value) -> ModelResult<Vec<String>> {
    let items = value.as_array().ok_or_else(|| {
        ModelError::type_assertion(attribute, "sequence of identifiers", value.kind().to_string())
    })?;

    items
        .iter()
        .map(|item| {
            row_identifier(item).ok_or_else(|| {
                ModelError::type_assertion(attribute, "identifier", item.kind().to_string())
            })
        })
        .collect()
}

/// Identifier of a linked entity given as a scalar id or as a row.
fn row_identifier(item: &Value) -> Option<String> {
    match item {
        Value::Map(row) => row
            .get(REFERENCE_ID)
            .or_else(|| row.get(ID))
            .and_then(Value::to_id_string),
        other => other.to_id_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::observer::recording::RecordingObserver;
    use recordkit_value::Record;
    use serde_json::json;

    fn attrs(json: serde_json::Value) -> AttributeMap {
        Value::from_json(json).into_map().unwrap()
    }

    fn post_schema() -> Arc<KindSchema> {
        Arc::new(
            KindSchema::builder("post")
                .column(ColumnInfo::new("reference_id", "alias"))
                .column(ColumnInfo::new("title", "label"))
                .column(ColumnInfo::new("password", "password"))
                .column(ColumnInfo::new("internal_note", "content").exclude_from_api())
                .relation(TableRelation::new("post", RelationKind::HasMany, "comment"))
                .relation(TableRelation::new("post", RelationKind::BelongsTo, "user_account"))
                .relation(TableRelation::new("blog", RelationKind::HasMany, "post"))
                .build(),
        )
    }

    fn post(data: serde_json::Value) -> Api2GoModel {
        Api2GoModel::from_json(post_schema(), data).unwrap()
    }

    #[test]
    fn loaded_models_are_clean_and_typed() {
        let model = post(json!({"title": "hello", "version": 1}));
        assert!(!model.is_dirty());
        assert_eq!(model.get("__type"), Some(&Value::from("post")));
        assert_eq!(model.get("version"), Some(&Value::Integer(1)));
        assert!(model.changes().is_empty());
    }

    #[test]
    fn adopted_attributes_are_tagged_with_kind() {
        let mut model = Api2GoModel::new(post_schema());
        model.set_attributes(attrs(json!({"title": "hello"}))).unwrap();
        assert_eq!(model.get("__type"), Some(&Value::from("post")));
        assert_eq!(
            model.attributes(),
            post(json!({"title": "hello"})).attributes()
        );
    }

    #[test]
    fn first_write_to_empty_model_is_not_a_change() {
        let mut model = Api2GoModel::new(post_schema());
        model
            .set_attributes(attrs(json!({"title": "hello", "version": 1})))
            .unwrap();
        model
            .set_attributes(attrs(json!({"title": "hello", "version": 1})))
            .unwrap();
        assert!(!model.is_dirty());

        model
            .set_attributes(attrs(json!({"title": "world", "version": 1})))
            .unwrap();
        assert!(model.is_dirty());
        assert_eq!(
            model.previous_attributes(),
            Some(&attrs(json!({"title": "hello", "version": 1, "__type": "post"})))
        );

        let changes = model.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["title"].old, Value::from("hello"));
        assert_eq!(changes["title"].new, Value::from("world"));
    }

    #[test]
    fn structurally_equal_writes_keep_model_clean() {
        let mut model = post(json!({"tags": [{"k": "a"}, {"k": "b"}], "meta": {"x": 1, "y": 2}}));
        model
            .set_attributes(attrs(json!({"meta": {"y": 2, "x": 1}, "tags": [{"k": "a"}, {"k": "b"}]})))
            .unwrap();
        assert!(!model.is_dirty());
        assert!(model.previous_attributes().is_none());
    }

    #[test]
    fn previous_snapshot_is_captured_once() {
        let mut model = post(json!({"title": "a"}));
        model.set_attribute("title", "b").unwrap();
        let captured = model.previous_attributes().cloned();
        model.set_attribute("title", "c").unwrap();
        model.set_attribute("body", "new").unwrap();

        assert_eq!(model.previous_attributes().cloned(), captured);
        assert_eq!(model.previous_attributes().unwrap()["title"], Value::from("a"));

        let changes = model.changes();
        assert_eq!(changes["title"].old, Value::from("a"));
        assert_eq!(changes["title"].new, Value::from("c"));
        assert_eq!(changes["body"].old, Value::Null);
        assert!(!changes.contains_key("__type"));
    }

    #[test]
    fn reverted_values_stay_dirty() {
        let mut model = post(json!({"title": "a"}));
        model.set_attribute("title", "b").unwrap();
        model.set_attribute("title", "a").unwrap();
        assert!(model.is_dirty());
        assert!(model.changes().is_empty());
    }

    #[test]
    fn new_keys_mark_dirty() {
        let mut model = post(json!({"title": "a"}));
        model.set_attribute("subtitle", Value::Null).unwrap();
        assert!(model.is_dirty());
    }

    #[test]
    fn numeric_kinds_are_not_coerced() {
        let mut model = post(json!({"score": 1}));
        model.set_attribute("score", 1.0).unwrap();
        assert!(model.is_dirty());
    }

    #[test]
    fn records_compare_public_fields() {
        let mut model = Api2GoModel::with_data(post_schema(), AttributeMap::new());
        model.set(
            "geo",
            Record::new("Point").with_field("x", 1).with_private_field("cache", 1),
        );
        model
            .set_attribute(
                "geo",
                Record::new("Point").with_field("x", 1).with_private_field("cache", 2),
            )
            .unwrap();
        assert!(!model.is_dirty());
    }

    #[test]
    fn reference_id_is_immutable() {
        let mut model = post(json!({"reference_id": "p1", "title": "a"}));
        let before = model.attributes().clone();

        let err = model
            .set_attributes(attrs(json!({"reference_id": "p2", "title": "b"})))
            .unwrap_err();
        assert_eq!(err, ModelError::ImmutableIdentifier);
        assert_eq!(model.attributes(), &before);
        assert!(!model.is_dirty());

        model
            .set_attributes(attrs(json!({"reference_id": "p1", "title": "b"})))
            .unwrap();
        assert!(model.is_dirty());
    }

    #[test]
    fn reference_id_text_is_parsed_as_uuid() {
        let id = Uuid::new_v4();
        let mut model = post(json!({"title": "a"}));
        model
            .set_attribute("reference_id", id.to_string())
            .unwrap();
        assert_eq!(model.get("reference_id"), Some(&Value::Uuid(id)));
        assert!(!model.is_dirty());
        assert_eq!(model.reference_id(), Some(id.to_string()));
    }

    #[test]
    fn to_one_reference_rejects_empty_ids() {
        let observer = Arc::new(RecordingObserver::default());
        let mut model = post(json!({"title": "a"})).with_observer(observer.clone());

        let err = model.set_to_one_reference("user_account_id", "").unwrap_err();
        assert_eq!(err, ModelError::empty_identifier("user_account_id"));
        assert!(!model.is_dirty());
        assert_eq!(
            observer.events.lock().as_slice(),
            ["rejected post: referenced id for user_account_id cannot be empty, use delete to remove"]
        );

        model.set_to_one_reference("user_account_id", "u1").unwrap();
        assert!(model.is_dirty());
        assert_eq!(model.get("user_account_id"), Some(&Value::from("u1")));
    }

    #[test]
    fn to_many_rows_get_back_references() {
        let mut model = post(json!({"reference_id": "p1"}));
        model
            .set_to_many_references("comment", vec![attrs(json!({"id": "c1"}))])
            .unwrap();

        let rows = model.get("comment").unwrap().as_array().unwrap();
        assert_eq!(
            rows[0],
            Value::from_json(json!({"id": "c1", "reference_id": "c1", "comment_id": "p1"}))
        );
        assert!(model.is_dirty());
    }

    #[test]
    fn to_many_subject_side_uses_subject_key() {
        let mut model = post(json!({"reference_id": "p1"}));
        model
            .set_to_many_references("blog_id", vec![attrs(json!({"id": "b1"}))])
            .unwrap();
        let rows = model.get("blog_id").unwrap().as_array().unwrap();
        assert_eq!(rows[0].get("blog_id"), Some(&Value::from("p1")));
    }

    #[test]
    fn to_many_singular_relation_tags_rows() {
        let mut model = post(json!({"reference_id": "p1"}));
        model
            .set_to_many_references("user_account_id", vec![attrs(json!({"id": "u1"}))])
            .unwrap();
        let rows = model.get("user_account_id").unwrap().as_array().unwrap();
        assert_eq!(rows[0].get("__type"), Some(&Value::from("user_account")));
        assert_eq!(rows[0].get("reference_id"), None);
    }

    #[test]
    fn singular_rows_are_readable_as_links() {
        let mut model = post(json!({"reference_id": "p1"}));
        model
            .set_to_many_references("user_account_id", vec![attrs(json!({"id": "u1"}))])
            .unwrap();

        let refs = model.referenced_identifiers().unwrap();
        assert_eq!(
            refs,
            vec![ReferenceId {
                kind: "user_account".into(),
                name: "user_account_id".into(),
                id: "u1".into(),
                relationship: Relationship::ToOne,
            }]
        );

        let linked = post(json!({"user_account_id": {"reference_id": "u2"}}));
        assert_eq!(linked.referenced_identifiers().unwrap()[0].id, "u2");

        let ambiguous = post(json!({"user_account_id": ["u1", "u2"]}));
        assert!(matches!(
            ambiguous.referenced_identifiers(),
            Err(ModelError::TypeAssertion { .. })
        ));
    }

    #[test]
    fn to_many_unknown_relation_is_an_error() {
        let mut model = post(json!({"reference_id": "p1"}));
        let before = model.attributes().clone();
        let err = model
            .set_to_many_references("tag", vec![attrs(json!({"id": "t1"}))])
            .unwrap_err();
        assert_eq!(err, ModelError::relation_not_found("tag"));
        assert_eq!(model.attributes(), &before);
    }

    #[test]
    fn to_many_empty_rows_change_nothing() {
        let mut model = post(json!({"reference_id": "p1"}));
        model.set_to_many_references("comment", Vec::new()).unwrap();
        assert!(!model.is_dirty());
        assert!(model.get("comment").is_none());
    }

    #[test]
    fn add_to_many_is_not_supported() {
        let mut model = post(json!({}));
        assert!(matches!(
            model.add_to_many_references("comment", &["c1".to_string()]),
            Err(ModelError::RelationNotFound { .. })
        ));
    }

    #[test]
    fn delete_plural_stages_ids() {
        let observer = Arc::new(RecordingObserver::default());
        let mut model = post(json!({"reference_id": "p1"})).with_observer(observer.clone());
        model
            .delete_to_many_references("comment", &["c1".to_string()])
            .unwrap();

        assert!(!model.is_dirty());
        assert_eq!(
            model.pending_deletions().get("comment"),
            Some(&vec!["c1".to_string()])
        );
        assert_eq!(
            model.delete_reference_infos(),
            vec![DeleteReferenceInfo {
                relation_name: "comment".to_string(),
                reference_id: "c1".to_string(),
            }]
        );
        assert_eq!(observer.events.lock().as_slice(), ["staged post.comment c1"]);

        let taken = model.take_pending_deletions();
        assert_eq!(taken.len(), 1);
        assert!(model.pending_deletions().is_empty());
    }

    #[test]
    fn delete_singular_clears_matching_link() {
        let mut model = post(json!({"user_account_id": "u1"}));

        model
            .delete_to_many_references("user_account_id", &["u2".to_string()])
            .unwrap();
        assert!(!model.is_dirty());

        model
            .delete_to_many_references("user_account_id", &["u1".to_string()])
            .unwrap();
        assert!(model.is_dirty());
        assert_eq!(model.get("user_account_id"), Some(&Value::Null));
        assert!(model.pending_deletions().is_empty());
    }

    #[test]
    fn delete_from_object_side_stages() {
        let mut model = post(json!({}));
        model
            .delete_to_many_references("blog_id", &["b1".to_string()])
            .unwrap();
        assert_eq!(model.pending_deletions()["blog_id"], vec!["b1".to_string()]);
    }

    #[test]
    fn delete_unknown_relation_is_an_error() {
        let mut model = post(json!({}));
        let err = model
            .delete_to_many_references("tag", &["t1".to_string()])
            .unwrap_err();
        assert_eq!(err, ModelError::relation_not_found("tag"));
    }

    #[test]
    fn referenced_identifiers_read_relation_attributes() {
        let model = post(json!({
            "comment_id": ["c1", "c2"],
            "user_account_id": "u1",
            "blog_id": [{"reference_id": "b1"}]
        }));
        let refs = model.referenced_identifiers().unwrap();
        assert_eq!(
            refs,
            vec![
                ReferenceId {
                    kind: "comment".into(),
                    name: "comment_id".into(),
                    id: "c1".into(),
                    relationship: Relationship::ToMany,
                },
                ReferenceId {
                    kind: "comment".into(),
                    name: "comment_id".into(),
                    id: "c2".into(),
                    relationship: Relationship::ToMany,
                },
                ReferenceId {
                    kind: "user_account".into(),
                    name: "user_account_id".into(),
                    id: "u1".into(),
                    relationship: Relationship::ToOne,
                },
                ReferenceId {
                    kind: "blog".into(),
                    name: "blog_id".into(),
                    id: "b1".into(),
                    relationship: Relationship::ToMany,
                },
            ]
        );
    }

    #[test]
    fn referenced_identifiers_skip_nil_and_reject_bad_shapes() {
        let model = post(json!({"user_account_id": null}));
        assert!(model.referenced_identifiers().unwrap().is_empty());

        let model = post(json!({"comment_id": "c1"}));
        assert!(matches!(
            model.referenced_identifiers(),
            Err(ModelError::TypeAssertion { .. })
        ));
    }

    #[test]
    fn has_one_is_to_one_from_both_sides() {
        let cover = Arc::new(
            KindSchema::builder("cover")
                .relation(TableRelation::new("post", RelationKind::HasOne, "cover"))
                .build(),
        );
        let model = Api2GoModel::from_json(cover, json!({"post_id": "p1"})).unwrap();
        let refs = model.referenced_identifiers().unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].id, "p1");
        assert_eq!(refs[0].relationship, Relationship::ToOne);
        assert_eq!(model.references()[0].relationship, Relationship::ToOne);
    }

    #[test]
    fn references_describe_relationship_shapes() {
        let model = Api2GoModel::new(post_schema());
        let refs = model.references();
        assert_eq!(refs.len(), 3);
        assert_eq!(
            refs[0],
            Reference {
                kind: "comment".into(),
                name: "comment_id".into(),
                relationship: Relationship::ToMany,
            }
        );
        assert_eq!(refs[1].relationship, Relationship::ToOne);
        assert_eq!(refs[2].kind, "blog");
        assert_eq!(refs[2].name, "blog_id");
        assert_eq!(refs[2].relationship, Relationship::ToMany);
    }

    #[test]
    fn audit_snapshot_uses_previous_state() {
        let mut model = post(json!({"id": 4, "reference_id": "p1", "title": "a"}));
        let clean_audit = model.audit_snapshot();
        assert_eq!(clean_audit.kind(), "post_audit");
        assert_eq!(clean_audit.get("title"), Some(&Value::from("a")));

        model.set_attribute("title", "b").unwrap();
        let audit = model.audit_snapshot();
        assert_eq!(audit.kind(), "post_audit");
        assert_eq!(audit.get("__type"), Some(&Value::from("post_audit")));
        assert_eq!(audit.get("title"), Some(&Value::from("a")));
        assert!(audit.get("reference_id").is_none());
        assert!(audit.get("id").is_none());
        assert!(!audit.is_dirty());
        assert!(audit.relations().is_empty());
    }

    #[test]
    fn versions_come_from_loaded_state() {
        let mut model = post(json!({"version": 3}));
        model.set_attribute("version", 4).unwrap();
        assert!(model.has_version());
        assert_eq!(model.current_version().unwrap(), 3);
        assert_eq!(model.next_version().unwrap(), 4);
    }

    #[test]
    fn version_errors() {
        let model = post(json!({"version": "three"}));
        assert_eq!(
            model.current_version().unwrap_err(),
            ModelError::type_assertion("version", "integer", "text")
        );

        let model = post(json!({}));
        assert!(!model.has_version());
        assert_eq!(
            model.current_version().unwrap_err(),
            ModelError::missing_attribute("version")
        );

        let lenient = Arc::new(
            KindSchema::builder("note")
                .config(ModelConfig::new().version_policy(VersionPolicy::DefaultZero))
                .build(),
        );
        let model = Api2GoModel::new(lenient);
        assert_eq!(model.current_version().unwrap(), 0);
        assert_eq!(model.next_version().unwrap(), 1);
    }

    #[test]
    fn serializable_attributes_filter_and_redact() {
        let model = post(json!({"title": "t", "password": "hunter2", "internal_note": "x"}));
        let out = model.serializable_attributes();
        assert_eq!(out.get("title"), Some(&Value::from("t")));
        assert_eq!(out.get("password"), Some(&Value::from("")));
        assert!(!out.contains_key("internal_note"));
        assert_eq!(out.get("__type"), Some(&Value::from("post")));
    }

    #[test]
    fn before_create_assigns_v7_id() {
        let mut model = Api2GoModel::new(post_schema());
        let id = model.before_create();
        assert_eq!(id.get_version_num(), 7);
        assert_eq!(model.get("reference_id"), Some(&Value::Uuid(id)));
        assert_eq!(model.id(), Some(id.to_string()));
    }

    #[test]
    fn original_values_and_merged_view() {
        let mut model = post(json!({"title": "a", "legacy": true}));
        model
            .set_attributes(attrs(json!({"title": "b"})))
            .unwrap();
        assert_eq!(model.column_original_value("title"), Some(&Value::from("a")));
        assert_eq!(model.unmodified_attributes()["title"], Value::from("a"));

        let all = model.all_as_attributes();
        assert_eq!(all["title"], Value::from("b"));
        assert_eq!(all["legacy"], Value::Bool(true));
        assert_eq!(all["__type"], Value::from("post"));
    }

    #[test]
    fn set_id_and_untracked_writes() {
        let mut model = Api2GoModel::new(post_schema());
        model.set_id("p1");
        model.set_type("draft_post");
        assert_eq!(model.reference_id().as_deref(), Some("p1"));
        assert_eq!(model.get("__type"), Some(&Value::from("draft_post")));
        assert!(!model.is_dirty());
    }

    #[test]
    fn includes_are_kept() {
        let mut model = Api2GoModel::new(post_schema());
        model.add_include(post(json!({"reference_id": "p2"})));
        assert_eq!(model.referenced_models().len(), 1);
    }

    #[test]
    fn dirty_transition_is_observed() {
        let observer = Arc::new(RecordingObserver::default());
        let mut model = post(json!({"title": "a"})).with_observer(observer.clone());
        model.set_attribute("title", "b").unwrap();
        model.set_attribute("title", "c").unwrap();
        assert_eq!(observer.events.lock().as_slice(), ["dirty post.title"]);
    }
}
