//! Column schema descriptors.

use crate::error::{ModelError, ModelResult};
use recordkit_value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column type whose values are never sent back to API clients.
pub const SENSITIVE_COLUMN_TYPE: &str = "password";

/// Target of a foreign-key column.
///
/// Parsed from `"[datasource:]kind(column)"`; the data source defaults
/// to `"self"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyData {
    /// Data source holding the referenced kind.
    pub data_source: String,
    /// Referenced kind.
    pub namespace: String,
    /// Referenced column.
    pub key_name: String,
}

impl FromStr for ForeignKeyData {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        let invalid = || ModelError::invalid_foreign_key(s);

        let (target, rest) = s.split_once('(').ok_or_else(invalid)?;
        let (key_name, trailing) = rest.split_once(')').ok_or_else(invalid)?;
        if !trailing.is_empty() {
            return Err(invalid());
        }

        let (data_source, namespace) = match target.split_once(':') {
            Some((source, kind)) => (source, kind),
            None => ("self", target),
        };

        if namespace.is_empty() || key_name.is_empty() || data_source.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            data_source: data_source.to_string(),
            namespace: namespace.to_string(),
            key_name: key_name.to_string(),
        })
    }
}

impl fmt::Display for ForeignKeyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.namespace, self.key_name)
    }
}

/// One selectable value of an enumerated column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueOption {
    /// Type tag of the option value.
    pub value_type: String,
    /// The option value.
    pub value: Value,
    /// Human readable label.
    pub label: String,
}

/// Metadata for one column of an entity kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnInfo {
    /// Wire / display name.
    pub name: String,
    /// Storage column name, also the attribute key.
    pub column_name: String,
    /// Free-form description.
    pub column_description: String,
    /// Semantic type tag (`label`, `password`, `datetime`, ...).
    pub column_type: String,
    /// Part of the primary key.
    pub is_primary_key: bool,
    /// Value assigned by the store.
    pub is_auto_increment: bool,
    /// Column is indexed.
    pub is_indexed: bool,
    /// Values are unique.
    pub is_unique: bool,
    /// Column accepts nil.
    pub is_nullable: bool,
    /// Column permission bits.
    pub permission: u64,
    /// Column references another kind.
    pub is_foreign_key: bool,
    /// Column is never exposed through the API.
    pub exclude_from_api: bool,
    /// Target of the foreign key, when `is_foreign_key` is set.
    pub foreign_key_data: Option<ForeignKeyData>,
    /// Storage data type.
    pub data_type: String,
    /// Default value expression.
    pub default_value: String,
    /// Enumerated options.
    pub options: Vec<ValueOption>,
}

impl ColumnInfo {
    /// Creates a column whose wire and storage names are both `name`.
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            column_name: name.clone(),
            name,
            column_type: column_type.into(),
            ..Self::default()
        }
    }

    /// Sets the data type.
    #[must_use]
    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = data_type.into();
        self
    }

    /// Marks the column as part of the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Marks the column as auto-incremented.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.is_auto_increment = true;
        self
    }

    /// Marks the column as indexed.
    #[must_use]
    pub const fn indexed(mut self) -> Self {
        self.is_indexed = true;
        self
    }

    /// Marks the column as unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Marks the column as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    /// Hides the column from API output.
    #[must_use]
    pub const fn exclude_from_api(mut self) -> Self {
        self.exclude_from_api = true;
        self
    }

    /// Sets a default value expression.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    /// Makes this a foreign key to the given target.
    pub fn foreign_key(mut self, target: &str) -> ModelResult<Self> {
        self.foreign_key_data = Some(target.parse()?);
        self.is_foreign_key = true;
        Ok(self)
    }

    /// True for columns whose values must be redacted on output.
    pub fn is_sensitive(&self) -> bool {
        self.column_type == SENSITIVE_COLUMN_TYPE
    }
}
