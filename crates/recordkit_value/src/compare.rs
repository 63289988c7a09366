//! Deep structural comparison of values.
//!
//! Equality here is structural: two maps built in a different order are
//! equal, two records are equal when their public fields are, and two
//! references are equal when their targets are. There is no numeric
//! coercion, so `Integer(1)` and `Float(1.0)` differ.
//!
//! Values are owned trees, so comparison always terminates.

use crate::value::{Record, Value};
use std::collections::BTreeMap;

/// Outcome of a deep comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// Both sides are structurally equal.
    Equal,
    /// The sides differ; the text describes the first difference found.
    Different(String),
}

impl Comparison {
    /// Returns true if the comparison found no difference.
    pub fn is_equal(&self) -> bool {
        matches!(self, Comparison::Equal)
    }

    /// Returns the first-difference description, if any.
    pub fn difference(&self) -> Option<&str> {
        match self {
            Comparison::Equal => None,
            Comparison::Different(reason) => Some(reason),
        }
    }

    fn different(reason: impl Into<String>) -> Self {
        Comparison::Different(reason.into())
    }

    fn context(self, prefix: impl FnOnce() -> String) -> Self {
        match self {
            Comparison::Equal => Comparison::Equal,
            Comparison::Different(reason) => {
                Comparison::Different(format!("{}: {reason}", prefix()))
            }
        }
    }
}

/// Returns true if the two (possibly absent) values are structurally equal.
///
/// `None` and `Some(Value::Null)` are both treated as nil.
pub fn are_values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    deep_compare_values(a, b).is_equal()
}

/// Compares two (possibly absent) values and describes the first difference.
pub fn deep_compare_values(a: Option<&Value>, b: Option<&Value>) -> Comparison {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Comparison::Equal,
        (None, Some(_)) | (Some(_), None) => {
            Comparison::different("one value is nil, the other is not")
        }
        (Some(a), Some(b)) => compare_present(a, b),
    }
}

/// Compares two sequences of string-keyed maps, index by index.
pub fn deep_compare_rows(
    a: &[BTreeMap<String, Value>],
    b: &[BTreeMap<String, Value>],
) -> Comparison {
    let a: Vec<&BTreeMap<String, Value>> = a.iter().collect();
    let b: Vec<&BTreeMap<String, Value>> = b.iter().collect();
    compare_rows(&a, &b)
}

fn compare_present(a: &Value, b: &Value) -> Comparison {
    if a.kind() != b.kind() {
        return Comparison::different(format!("type mismatch: {} vs {}", a.kind(), b.kind()));
    }

    match (a, b) {
        (Value::Map(x), Value::Map(y)) => compare_maps(x, y),
        (Value::Array(x), Value::Array(y)) => compare_sequences(x, y),
        (Value::Record(x), Value::Record(y)) => compare_records(x, y),
        (Value::Ref(x), Value::Ref(y)) => match (x, y) {
            (None, None) => Comparison::Equal,
            (Some(x), Some(y)) => deep_compare_values(Some(x), Some(y)),
            _ => Comparison::different("one reference is nil, the other is not"),
        },
        _ if a == b => Comparison::Equal,
        _ => Comparison::different(format!("values not equal: {a} vs {b}")),
    }
}

fn compare_maps(a: &BTreeMap<String, Value>, b: &BTreeMap<String, Value>) -> Comparison {
    if a.len() != b.len() {
        return Comparison::different(format!(
            "map length mismatch: {} vs {}",
            a.len(),
            b.len()
        ));
    }

    // BTreeMap iterates in sorted key order, so the reported difference is
    // deterministic.
    for (key, value_a) in a {
        let Some(value_b) = b.get(key) else {
            return Comparison::different(format!(
                "key '{key}' exists in first map but not in second"
            ));
        };
        let result = deep_compare_values(Some(value_a), Some(value_b))
            .context(|| format!("value mismatch for key '{key}'"));
        if !result.is_equal() {
            return result;
        }
    }

    Comparison::Equal
}

fn compare_sequences(a: &[Value], b: &[Value]) -> Comparison {
    if matches!(a.first(), Some(Value::Map(_))) {
        if let (Some(rows_a), Some(rows_b)) = (as_rows(a), as_rows(b)) {
            return compare_rows(&rows_a, &rows_b);
        }
    }

    if a.len() != b.len() {
        return Comparison::different(format!(
            "sequence length mismatch: {} vs {}",
            a.len(),
            b.len()
        ));
    }

    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        let result =
            deep_compare_values(Some(x), Some(y)).context(|| format!("difference at index {i}"));
        if !result.is_equal() {
            return result;
        }
    }

    Comparison::Equal
}

fn as_rows(items: &[Value]) -> Option<Vec<&BTreeMap<String, Value>>> {
    items.iter().map(Value::as_map).collect()
}

fn compare_rows(a: &[&BTreeMap<String, Value>], b: &[&BTreeMap<String, Value>]) -> Comparison {
    if a.len() != b.len() {
        return Comparison::different(format!("length mismatch: {} vs {}", a.len(), b.len()));
    }

    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        let result = compare_maps(x, y).context(|| format!("difference at index {i}"));
        if !result.is_equal() {
            return result;
        }
    }

    Comparison::Equal
}

fn compare_records(a: &Record, b: &Record) -> Comparison {
    if a.name != b.name {
        return Comparison::different(format!(
            "type mismatch: record {} vs record {}",
            a.name, b.name
        ));
    }

    for field in a.public_fields() {
        let result = match b.field(&field.name) {
            Some(other) => deep_compare_values(Some(&field.value), Some(other)),
            None => Comparison::different("field missing from second record"),
        }
        .context(|| format!("difference in field '{}'", field.name));
        if !result.is_equal() {
            return result;
        }
    }

    if let Some(extra) = b.public_fields().find(|f| a.field(&f.name).is_none()) {
        return Comparison::different(format!(
            "difference in field '{}': field missing from first record",
            extra.name
        ));
    }

    Comparison::Equal
}
