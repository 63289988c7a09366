//! Kind schemas and the schema registry.

use crate::column::ColumnInfo;
use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};
use crate::model::Api2GoModel;
use crate::relation::{RelationKind, TableRelation};
use parking_lot::RwLock;
use recordkit_value::AttributeMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Schema of one entity kind: columns, relations and configuration.
///
/// Built once at registration time and shared read-only by every model
/// of the kind.
#[derive(Debug, Clone)]
pub struct KindSchema {
    name: String,
    columns: Vec<ColumnInfo>,
    column_index: HashMap<String, usize>,
    relations: Vec<Arc<TableRelation>>,
    default_permission: i64,
    config: ModelConfig,
}

impl KindSchema {
    /// Starts building a schema for the named kind.
    pub fn builder(name: impl Into<String>) -> KindSchemaBuilder {
        KindSchemaBuilder {
            name: name.into(),
            columns: Vec::new(),
            relations: Vec::new(),
            default_permission: 0,
            config: ModelConfig::default(),
        }
    }

    /// Kind name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Looks up a column by its storage name.
    pub fn column(&self, column_name: &str) -> Option<&ColumnInfo> {
        self.column_index
            .get(column_name)
            .map(|&i| &self.columns[i])
    }

    /// Storage names of all columns, in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.column_name.as_str()).collect()
    }

    /// True if the kind has the column, or a `belongs_to` relation keyed by it.
    pub fn has_column(&self, column_name: &str) -> bool {
        self.column_index.contains_key(column_name)
            || self.relations.iter().any(|rel| {
                rel.kind() == RelationKind::BelongsTo && rel.object_key_name() == column_name
            })
    }

    /// True if the kind has a `has_many` relation to `kind`.
    pub fn has_many(&self, kind: &str) -> bool {
        self.relations
            .iter()
            .any(|rel| rel.kind() == RelationKind::HasMany && rel.object() == kind)
    }

    /// Relations in which this kind takes part.
    pub fn relations(&self) -> &[Arc<TableRelation>] {
        &self.relations
    }

    /// Permission applied to new instances.
    pub fn default_permission(&self) -> i64 {
        self.default_permission
    }

    /// Model configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Schema for audit snapshots of this kind.
    ///
    /// Same columns and configuration, kind `<kind><audit_suffix>`, no
    /// relations.
    pub fn audit_schema(&self) -> KindSchema {
        KindSchema {
            name: format!("{}{}", self.name, self.config.audit_suffix),
            columns: self.columns.clone(),
            column_index: self.column_index.clone(),
            relations: Vec::new(),
            default_permission: self.default_permission,
            config: self.config.clone(),
        }
    }
}

/// Builder for [`KindSchema`].
#[derive(Debug)]
pub struct KindSchemaBuilder {
    name: String,
    columns: Vec<ColumnInfo>,
    relations: Vec<Arc<TableRelation>>,
    default_permission: i64,
    config: ModelConfig,
}

impl KindSchemaBuilder {
    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: ColumnInfo) -> Self {
        self.columns.push(column);
        self
    }

    /// Appends several columns.
    #[must_use]
    pub fn columns(mut self, columns: impl IntoIterator<Item = ColumnInfo>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Adds a relation.
    #[must_use]
    pub fn relation(mut self, relation: impl Into<Arc<TableRelation>>) -> Self {
        self.relations.push(relation.into());
        self
    }

    /// Adds several shared relations.
    #[must_use]
    pub fn relations(mut self, relations: impl IntoIterator<Item = Arc<TableRelation>>) -> Self {
        self.relations.extend(relations);
        self
    }

    /// Sets the default permission.
    #[must_use]
    pub const fn default_permission(mut self, permission: i64) -> Self {
        self.default_permission = permission;
        self
    }

    /// Sets the model configuration.
    #[must_use]
    pub fn config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    /// Finishes the schema.
    pub fn build(self) -> KindSchema {
        let column_index = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.column_name.clone(), i))
            .collect();

        KindSchema {
            name: self.name,
            columns: self.columns,
            column_index,
            relations: self.relations,
            default_permission: self.default_permission,
            config: self.config,
        }
    }
}

/// Registry of kind schemas, shared across request handlers.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    kinds: RwLock<HashMap<String, Arc<KindSchema>>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a kind schema.
    pub fn register(&self, schema: KindSchema) -> Arc<KindSchema> {
        let schema = Arc::new(schema);
        tracing::debug!(
            kind = schema.name(),
            columns = schema.columns().len(),
            relations = schema.relations().len(),
            "registered kind"
        );
        self.kinds
            .write()
            .insert(schema.name().to_string(), Arc::clone(&schema));
        schema
    }

    /// Returns the schema of a registered kind.
    pub fn get(&self, kind: &str) -> ModelResult<Arc<KindSchema>> {
        self.kinds
            .read()
            .get(kind)
            .cloned()
            .ok_or_else(|| ModelError::kind_not_found(kind))
    }

    /// Names of all registered kinds, sorted.
    pub fn kinds(&self) -> Vec<String> {
        let mut names: Vec<String> = self.kinds.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Every registered relation in which `kind` is subject or object.
    ///
    /// Relations declared on several kinds are returned once.
    pub fn relations_for(&self, kind: &str) -> Vec<Arc<TableRelation>> {
        let kinds = self.kinds.read();
        let mut found: BTreeMap<String, Arc<TableRelation>> = BTreeMap::new();
        for schema in kinds.values() {
            for rel in schema.relations() {
                if rel.subject() == kind || rel.object() == kind {
                    found
                        .entry(rel.hash_key())
                        .or_insert_with(|| Arc::clone(rel));
                }
            }
        }
        found.into_values().collect()
    }

    /// Creates an empty model of a registered kind.
    pub fn new_model(&self, kind: &str) -> ModelResult<Api2GoModel> {
        Ok(Api2GoModel::new(self.get(kind)?))
    }

    /// Creates a model of a registered kind from decoded attributes.
    pub fn new_model_with_data(&self, kind: &str, data: AttributeMap) -> ModelResult<Api2GoModel> {
        Ok(Api2GoModel::with_data(self.get(kind)?, data))
    }
}
