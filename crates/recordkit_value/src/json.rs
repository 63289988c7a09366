//! Bridge between decoded JSON payloads and [`Value`].
//!
//! Payloads arrive from the wire with abstract numeric literals. Every
//! numeric leaf is narrowed to the first representation that accepts it,
//! in this order: integer, float, string.

use crate::value::Value;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Number;
use std::collections::BTreeMap;

/// Narrows a textual numeric literal to integer, float or text.
///
/// Words such as `NaN` or `inf` stay text; only finite floats are kept.
pub fn normalize_number_literal(literal: &str) -> Value {
    if let Ok(n) = literal.parse::<i64>() {
        return Value::Integer(n);
    }
    if let Ok(n) = literal.parse::<f64>() {
        if n.is_finite() {
            return Value::Float(n);
        }
    }
    Value::Text(literal.to_string())
}

fn normalize_number(number: &Number) -> Value {
    if let Some(n) = number.as_i64() {
        return Value::Integer(n);
    }
    if let Some(n) = number.as_f64() {
        return Value::Float(n);
    }
    Value::Text(number.to_string())
}

impl Value {
    /// Converts a decoded JSON document into a value tree.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => normalize_number(&n),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts this value into a JSON document.
    ///
    /// Records become objects of their public fields. Non-finite floats
    /// have no JSON form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Ref(None) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(n) => serde_json::Value::from(*n),
            Value::Float(n) => Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Uuid(u) => serde_json::Value::String(u.to_string()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Record(r) => serde_json::Value::Object(
                r.public_fields()
                    .map(|f| (f.name.clone(), f.value.to_json()))
                    .collect(),
            ),
            Value::Ref(Some(inner)) => inner.to_json(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

/// Converts a JSON object into an attribute map.
///
/// Returns `None` if the document is not an object.
pub fn attributes_from_json(json: serde_json::Value) -> Option<BTreeMap<String, Value>> {
    match Value::from_json(json) {
        Value::Map(m) => Some(m),
        _ => None,
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Ref(None) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Uuid(u) => serializer.collect_str(u),
            Value::Array(items) => serializer.collect_seq(items),
            Value::Map(m) => serializer.collect_map(m),
            Value::Record(r) => {
                let fields: Vec<_> = r.public_fields().collect();
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for field in fields {
                    map.serialize_entry(&field.name, &field.value)?;
                }
                map.end()
            }
            Value::Ref(Some(inner)) => inner.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from_json)
    }
}
