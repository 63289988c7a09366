//! Property-based test generators using proptest.
//!
//! Generated values stay inside what a decoded JSON payload can produce,
//! plus records and references.

use proptest::prelude::*;
use recordkit_value::{AttributeMap, Record, Value};

/// Strategy for attribute names.
///
/// Never yields `reference_id`, which models refuse to overwrite.
pub fn attribute_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}")
        .expect("Invalid regex")
        .prop_filter("reference_id is immutable", |s| s != "reference_id")
}

/// Strategy for scalar values.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        // Finite floats only; NaN never equals itself.
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        "[a-zA-Z0-9 ]{0,16}".prop_map(Value::Text),
        any::<u128>().prop_map(|n| Value::Uuid(uuid::Uuid::from_u128(n))),
    ]
}

/// Strategy for arbitrary nested values.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(attribute_name_strategy(), inner.clone(), 0..4)
                .prop_map(Value::Map),
            prop::collection::btree_map(attribute_name_strategy(), inner.clone(), 0..3).prop_map(
                |fields| {
                    Value::Record(fields.into_iter().fold(
                        Record::new("Generated"),
                        |record, (name, value)| record.with_field(name, value),
                    ))
                }
            ),
            prop::option::of(inner).prop_map(|v| Value::Ref(v.map(Box::new))),
        ]
    })
}

/// Strategy for entity attribute maps.
pub fn attribute_map_strategy() -> impl Strategy<Value = AttributeMap> {
    prop::collection::btree_map(attribute_name_strategy(), value_strategy(), 0..8)
}
