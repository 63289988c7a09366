//! # recordkit value
//!
//! Dynamic attribute values for schema-driven records.
//!
//! This crate provides:
//! - [`Value`], the closed set of attribute shapes (scalars, maps,
//!   sequences, records and optional references)
//! - Number normalization for decoded JSON payloads
//! - Deep structural comparison with first-difference diagnostics
//!
//! ## Usage
//!
//! ```
//! use recordkit_value::{are_values_equal, Value};
//! use serde_json::json;
//!
//! let a = Value::from_json(json!({"title": "hello", "version": 1}));
//! let b = Value::from_json(json!({"version": 1, "title": "hello"}));
//! assert!(are_values_equal(Some(&a), Some(&b)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod compare;
mod error;
mod json;
mod value;

pub use compare::{are_values_equal, deep_compare_rows, deep_compare_values, Comparison};
pub use error::{ValueError, ValueResult};
pub use json::{attributes_from_json, normalize_number_literal};
pub use value::{Record, RecordField, Value, ValueKind, Visibility};

/// String-keyed attribute mapping, the storage shape of an entity snapshot.
pub type AttributeMap = std::collections::BTreeMap<String, Value>;
