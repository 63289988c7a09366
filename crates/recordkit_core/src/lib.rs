//! # recordkit core
//!
//! Schema-driven entity models for JSON:API style services.
//!
//! This crate provides:
//! - [`TableRelation`] descriptors with derived key, join-table and join
//!   clause names
//! - [`KindSchema`] and the shared [`SchemaRegistry`]
//! - [`Api2GoModel`], a dynamically typed entity with dirty tracking,
//!   relation link management and audit snapshots
//! - Observation hooks ([`ModelObserver`]) that default to `tracing`
//!
//! ## Usage
//!
//! ```
//! use recordkit_core::{KindSchema, RelationKind, SchemaRegistry, TableRelation};
//!
//! let registry = SchemaRegistry::new();
//! registry.register(
//!     KindSchema::builder("post")
//!         .relation(TableRelation::new("post", RelationKind::HasMany, "comment"))
//!         .build(),
//! );
//!
//! let mut post = registry.new_model("post").unwrap();
//! post.set_id("p1");
//! post.delete_to_many_references("comment", &["c1".to_string()]).unwrap();
//! assert_eq!(post.pending_deletions()["comment"], vec!["c1".to_string()]);
//! assert!(!post.is_dirty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod column;
mod config;
mod error;
pub mod identifier;
mod model;
mod observer;
mod reference;
mod relation;
mod schema;

pub use column::{ColumnInfo, ForeignKeyData, ValueOption, SENSITIVE_COLUMN_TYPE};
pub use config::{ModelConfig, VersionPolicy};
pub use error::{ModelError, ModelResult};
pub use model::Api2GoModel;
pub use observer::{ModelObserver, NoopObserver, SharedObserver, TracingObserver};
pub use reference::{Change, DeleteReferenceInfo, Reference, ReferenceId, Relationship};
pub use relation::{RelationKind, TableRelation};
pub use schema::{KindSchema, KindSchemaBuilder, SchemaRegistry};

pub use recordkit_value;
