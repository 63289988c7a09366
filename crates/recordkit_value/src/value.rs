//! Dynamic attribute value type.

use crate::error::{ValueError, ValueResult};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Visibility of a record field.
///
/// Only public fields take part in structural comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Field is part of the record's public contract.
    Public,
    /// Field is internal bookkeeping and ignored by comparison.
    Private,
}

/// A single named field of a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    /// Field name.
    pub name: String,
    /// Whether the field is publicly visible.
    pub visibility: Visibility,
    /// Field value.
    pub value: Value,
}

/// A named record with ordered fields.
///
/// Records model typed, struct-like payload values whose shape is known
/// to the producer but not to this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Record type name. Records with different names never compare equal.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<RecordField>,
}

impl Record {
    /// Creates an empty record of the given type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a public field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(RecordField {
            name: name.into(),
            visibility: Visibility::Public,
            value: value.into(),
        });
        self
    }

    /// Appends a private field.
    #[must_use]
    pub fn with_private_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(RecordField {
            name: name.into(),
            visibility: Visibility::Private,
            value: value.into(),
        });
        self
    }

    /// Iterates over the public fields in declaration order.
    pub fn public_fields(&self) -> impl Iterator<Item = &RecordField> {
        self.fields
            .iter()
            .filter(|f| f.visibility == Visibility::Public)
    }

    /// Looks up a public field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.public_fields()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }
}

/// A dynamic attribute value.
///
/// This is the closed set of shapes an entity attribute can hold once a
/// payload has been decoded. Numbers are already narrowed to either
/// [`Value::Integer`] or [`Value::Float`]; no coercion happens between
/// the two.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent / nil value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Text string.
    Text(String),
    /// Parsed UUID, used for entity identifiers.
    Uuid(Uuid),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// String-keyed mapping (keys are kept sorted).
    Map(BTreeMap<String, Value>),
    /// Typed record with public and private fields.
    Record(Record),
    /// Owned optional reference to another value.
    Ref(Option<Box<Value>>),
}

/// Dynamic type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::Null`]
    Null,
    /// [`Value::Bool`]
    Bool,
    /// [`Value::Integer`]
    Integer,
    /// [`Value::Float`]
    Float,
    /// [`Value::Text`]
    Text,
    /// [`Value::Uuid`]
    Uuid,
    /// [`Value::Array`]
    Array,
    /// [`Value::Map`]
    Map,
    /// [`Value::Record`]
    Record,
    /// [`Value::Ref`]
    Ref,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Uuid => "uuid",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
            ValueKind::Record => "record",
            ValueKind::Ref => "reference",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Creates a map value from key/value pairs.
    pub fn map<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Creates a reference to the given value.
    pub fn reference(value: impl Into<Value>) -> Self {
        Value::Ref(Some(Box::new(value.into())))
    }

    /// Returns the dynamic type tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Uuid(_) => ValueKind::Uuid,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
            Value::Record(_) => ValueKind::Record,
            Value::Ref(_) => ValueKind::Ref,
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a float, if it is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as a UUID, if it is one.
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Get this value as an array, if it is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a map, if it is one.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Consumes this value and returns the inner map.
    pub fn into_map(self) -> ValueResult<BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Ok(m),
            other => Err(ValueError::unexpected_kind(ValueKind::Map, other.kind())),
        }
    }

    /// Look up a key in a map value, or a public field in a record value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(key),
            Value::Record(r) => r.field(key),
            _ => None,
        }
    }

    /// Renders this value as an identifier string.
    ///
    /// Scalars are rendered with their natural text form; nil values and
    /// containers have no identifier form.
    pub fn to_id_string(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Uuid(u) => Some(u.to_string()),
            Value::Integer(n) => Some(n.to_string()),
            Value::Float(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Ref(Some(inner)) => inner.to_id_string(),
            Value::Null
            | Value::Ref(None)
            | Value::Array(_)
            | Value::Map(_)
            | Value::Record(_) => None,
        }
    }

    /// Parses a text value as a UUID.
    pub fn parse_uuid(text: &str) -> ValueResult<Self> {
        Uuid::parse_str(text)
            .map(Value::Uuid)
            .map_err(|_| ValueError::invalid_uuid(text))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null | Value::Ref(None) => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Uuid(u) => write!(f, "{u}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(m) => {
                f.write_str("map[")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                f.write_str("]")
            }
            Value::Record(r) => {
                write!(f, "{}{{", r.name)?;
                for (i, field) in r.public_fields().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", field.name, field.value)?;
                }
                f.write_str("}")
            }
            Value::Ref(Some(inner)) => write!(f, "&{inner}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(m: BTreeMap<String, Value>) -> Self {
        Value::Map(m)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_keys_are_sorted() {
        let map = Value::map([("z", 1), ("a", 2), ("m", 3)]);

        let keys: Vec<&str> = map
            .as_map()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["a", "m", "z"]);
    }

    #[test]
    fn value_accessors() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(true).is_null());

        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Integer(42).as_bool(), None);

        assert_eq!(Value::Integer(42).as_integer(), Some(42));
        assert_eq!(Value::Float(4.5).as_integer(), None);
        assert_eq!(Value::Float(4.5).as_float(), Some(4.5));

        assert_eq!(Value::Text("hello".to_string()).as_text(), Some("hello"));
        assert_eq!(Value::from(vec![1, 2]).as_array().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn get_reads_maps_and_public_record_fields() {
        let map = Value::map([("name", "Alice")]);
        assert_eq!(map.get("name"), Some(&Value::from("Alice")));
        assert_eq!(map.get("missing"), None);

        let record = Value::from(
            Record::new("User")
                .with_field("name", "Bob")
                .with_private_field("secret", "x"),
        );
        assert_eq!(record.get("name"), Some(&Value::from("Bob")));
        assert_eq!(record.get("secret"), None);
    }

    #[test]
    fn id_strings() {
        let id = Uuid::nil();
        assert_eq!(Value::from("c1").to_id_string().as_deref(), Some("c1"));
        assert_eq!(Value::Integer(7).to_id_string().as_deref(), Some("7"));
        assert_eq!(
            Value::Uuid(id).to_id_string(),
            Some("00000000-0000-0000-0000-000000000000".to_string())
        );
        assert_eq!(Value::Null.to_id_string(), None);
        assert_eq!(Value::map([("a", 1)]).to_id_string(), None);
    }

    #[test]
    fn into_map_rejects_other_kinds() {
        let err = Value::Integer(1).into_map().unwrap_err();
        assert_eq!(
            err,
            ValueError::UnexpectedKind {
                expected: ValueKind::Map,
                found: ValueKind::Integer,
            }
        );
    }

    #[test]
    fn parse_uuid() {
        assert!(Value::parse_uuid("not-a-uuid").is_err());
        let parsed = Value::parse_uuid("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(parsed.kind(), ValueKind::Uuid);
    }

    #[test]
    fn from_impls() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42i64), Value::Integer(42));
        assert_eq!(Value::from(42i32), Value::Integer(42));
        assert_eq!(Value::from(1.5), Value::Float(1.5));
        assert_eq!(Value::from("hello"), Value::Text("hello".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(()), Value::Null);
    }

    #[test]
    fn display_is_compact() {
        let v = Value::map([("a", Value::from(vec![1, 2])), ("b", Value::Null)]);
        assert_eq!(v.to_string(), "map[a:[1 2] b:nil]");
    }
}
