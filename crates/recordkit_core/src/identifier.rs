//! Entity identifiers.
//!
//! Every persisted entity carries a `reference_id` attribute. New ids are
//! UUIDv7, so they sort by creation time. Ids that arrive as text are
//! stored as [`Value::Uuid`] when they parse, and kept as text otherwise.

use recordkit_value::Value;
use uuid::Uuid;

/// Attribute holding the unique identifier.
pub const REFERENCE_ID: &str = "reference_id";

/// Attribute holding the storage row id.
pub const ID: &str = "id";

/// Attribute holding the kind name.
pub const TYPE_ATTRIBUTE: &str = "__type";

/// Attribute holding the optimistic-concurrency version.
pub const VERSION: &str = "version";

/// Generates a new time-ordered identifier.
#[must_use]
pub fn new_reference_id() -> Uuid {
    Uuid::now_v7()
}

/// Converts identifier text to a UUID value when it parses as one.
pub fn identifier_value(text: &str) -> Value {
    Uuid::parse_str(text).map_or_else(|_| Value::from(text), Value::Uuid)
}

pub(crate) fn normalize_identifier(value: &mut Value) {
    if let Value::Text(text) = value {
        if let Ok(uuid) = Uuid::parse_str(text) {
            *value = Value::Uuid(uuid);
        }
    }
}
