//! Schema fixtures and model helpers.
//!
//! The fixture domain is a blog: `post` has many `comment`s and belongs to
//! a `user_account`.

use recordkit_core::{
    Api2GoModel, ColumnInfo, KindSchema, RelationKind, SchemaRegistry, TableRelation,
};
use recordkit_value::{AttributeMap, Value};
use std::sync::{Arc, Once};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a test-friendly `tracing` subscriber once per process.
///
/// Output goes through the test harness capture and honours `RUST_LOG`
/// (default `warn`).
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        // Another crate in the same binary may have installed one already.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// `post has_many comment`.
pub fn post_comments() -> Arc<TableRelation> {
    Arc::new(TableRelation::new("post", RelationKind::HasMany, "comment"))
}

/// `post belongs_to user_account`.
pub fn post_author() -> Arc<TableRelation> {
    Arc::new(TableRelation::new(
        "post",
        RelationKind::BelongsTo,
        "user_account",
    ))
}

/// Schema of the `post` kind.
pub fn post_schema() -> KindSchema {
    KindSchema::builder("post")
        .column(ColumnInfo::new("reference_id", "alias").unique())
        .column(ColumnInfo::new("title", "label"))
        .column(ColumnInfo::new("body", "content").nullable())
        .column(ColumnInfo::new("version", "measurement").data_type("int(11)"))
        .relations([post_comments(), post_author()])
        .build()
}

/// Schema of the `comment` kind.
pub fn comment_schema() -> KindSchema {
    KindSchema::builder("comment")
        .column(ColumnInfo::new("reference_id", "alias").unique())
        .column(ColumnInfo::new("body", "content"))
        .relations([post_comments()])
        .build()
}

/// Registry holding the `post` and `comment` kinds.
pub fn post_comment_registry() -> SchemaRegistry {
    let registry = SchemaRegistry::new();
    registry.register(post_schema());
    registry.register(comment_schema());
    registry
}

/// A clean `post` whose `reference_id` is `id`.
pub fn post_with_reference(id: &str) -> Api2GoModel {
    let mut data = AttributeMap::new();
    data.insert("reference_id".to_string(), Value::from(id));
    Api2GoModel::with_data(Arc::new(post_schema()), data)
}

/// Builds an attribute map from a JSON object literal.
///
/// # Panics
///
/// Panics if `json` is not an object.
pub fn attrs(json: serde_json::Value) -> AttributeMap {
    recordkit_value::attributes_from_json(json).expect("attribute fixture must be a JSON object")
}
