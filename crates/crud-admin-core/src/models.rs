// ABOUTME: Column metadata, per-model table details, and dynamically typed cell values
// ABOUTME: Shared vocabulary between schema introspection, coercion, storage, and rendering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Data models describing introspected tables and the values stored in them.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Display format used for date-time cells; fractional seconds only when present
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
/// Display format used for date cells
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Display format used for time cells
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Logical type a column's form values are coerced into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Whole numbers
    Integer,
    /// Floating point numbers
    Float,
    /// Fixed point numbers (stored as floats in `SQLite`)
    Decimal,
    /// True/false flags
    Boolean,
    /// Free text
    Text,
    /// Calendar date
    Date,
    /// Date with time of day
    DateTime,
    /// Time of day
    Time,
    /// JSON documents
    Json,
    /// Raw bytes
    Blob,
    /// Hashed secret (column name carries the `_hash` marker)
    Hash,
}

impl ColumnType {
    /// Map a declared SQL type name to a column type.
    ///
    /// The length suffix (`VARCHAR(255)`) must already be stripped. Returns `None`
    /// for types outside the types map; callers fall back to [`ColumnType::Text`].
    #[must_use]
    pub fn from_sql(type_name: &str) -> Option<Self> {
        let upper = type_name.trim().to_ascii_uppercase();
        let ty = match upper.as_str() {
            "INTEGER" | "INT" | "BIGINT" | "SMALLINT" | "TINYINT" | "MEDIUMINT" | "INT2"
            | "INT4" | "INT8" | "SERIAL" | "BIGSERIAL" | "UNSIGNED BIG INT" => Self::Integer,
            "FLOAT" | "REAL" | "DOUBLE" | "DOUBLE PRECISION" | "FLOAT4" | "FLOAT8" => Self::Float,
            "NUMERIC" | "DECIMAL" => Self::Decimal,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "VARCHAR" | "CHAR" | "CHARACTER" | "NCHAR" | "NVARCHAR" | "VARYING CHARACTER"
            | "CHARACTER VARYING" | "TEXT" | "STRING" | "CLOB" | "UUID" | "ENUM" => Self::Text,
            "DATE" => Self::Date,
            "DATETIME" | "TIMESTAMP" | "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => {
                Self::DateTime
            }
            "TIME" => Self::Time,
            "JSON" | "JSONB" => Self::Json,
            "BLOB" | "BYTEA" => Self::Blob,
            _ => return None,
        };
        Some(ty)
    }
}

/// Foreign key declared on a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyRef {
    /// Physical name of the referencing column
    pub column: String,
    /// Referenced table
    pub target_table: String,
    /// Referenced column
    pub target_column: String,
}

/// Metadata for a single column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnData {
    /// Display name (hash marker stripped)
    pub name: String,
    /// Physical column name
    pub db_name: String,
    /// Logical type used for coercion
    pub column_type: ColumnType,
    /// Declared SQL type as written in the schema
    pub db_type: String,
    /// Declared length, e.g. 255 for `VARCHAR(255)`
    pub len: Option<usize>,
    /// Column accepts NULL
    pub nullable: bool,
    /// Column carries a single-column unique constraint
    pub unique: bool,
    /// Column is part of the primary key
    pub primary: bool,
    /// Foreign keys declared on the column
    pub foreign_keys: Vec<ForeignKeyRef>,
}

impl ColumnData {
    /// Whether the column stores a hashed secret
    #[must_use]
    pub fn is_hashed(&self) -> bool {
        self.column_type == ColumnType::Hash
    }
}

/// Local and remote columns of a foreign key, keyed by target table in [`TableDetails`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyLink {
    /// Display name of the referencing column in this model
    pub column: String,
    /// Column in the referenced table
    pub target_column: String,
}

/// Everything the admin panel knows about one model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDetails {
    /// Table name, also the URL segment
    pub model_id: String,
    /// Display names of unique columns
    pub unique_columns: Vec<String>,
    /// Display names of columns that must be filled
    pub required_columns: Vec<String>,
    /// Column metadata in table order
    pub columns_data: Vec<ColumnData>,
    /// Display names of primary key columns
    pub primary_keys: Vec<String>,
    /// Display names in table order
    pub columns_names: Vec<String>,
    /// Positions of hashed columns
    pub hashed_indexes: Vec<usize>,
    /// Target table to link
    pub foreign_keys: BTreeMap<String, ForeignKeyLink>,
    /// Columns identifying a row: primary keys, or unique columns if there are none
    pub identity: Vec<String>,
}

impl TableDetails {
    /// Look up a column by display name
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns_data.iter().find(|c| c.name == name)
    }

    /// Look up a column by display name or physical name
    #[must_use]
    pub fn column_by_any_name(&self, name: &str) -> Option<&ColumnData> {
        self.columns_data
            .iter()
            .find(|c| c.name == name || c.db_name == name)
    }

    /// Whether the named column stores a hashed secret
    #[must_use]
    pub fn is_hashed(&self, name: &str) -> bool {
        self.column(name).is_some_and(ColumnData::is_hashed)
    }
}

/// A single dynamically typed cell
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// SQL NULL
    Null,
    /// Integer cell
    Integer(i64),
    /// Floating point cell
    Float(f64),
    /// Boolean cell
    Boolean(bool),
    /// Text cell
    Text(String),
    /// Date cell
    Date(NaiveDate),
    /// Date-time cell
    DateTime(NaiveDateTime),
    /// Time cell
    Time(NaiveTime),
    /// JSON document cell
    Json(Value),
    /// Binary cell
    Blob(Vec<u8>),
}

impl FieldValue {
    /// Whether the cell is NULL
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert a JSON scalar into a cell; arrays and objects stay JSON
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(*b),
            Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or_default()), Self::Integer),
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Json(other.clone()),
        }
    }

    /// Convert the cell into JSON
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Integer(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Json(v) => v.clone(),
            other => Value::String(other.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            Self::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
            Self::Json(v) => write!(f, "{v}"),
            Self::Blob(bytes) => f.write_str(&hex::encode(bytes)),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// A row keyed by column display name
pub type Row = BTreeMap<String, FieldValue>;

/// Identity of a row: identity column name to value.
///
/// Its JSON encoding is the wire form of the `_id` query parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectId(pub BTreeMap<String, FieldValue>);

impl ObjectId {
    /// Whether no identity column was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over identity columns and values
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    /// JSON object form
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_map_is_case_insensitive() {
        assert_eq!(ColumnType::from_sql("varchar"), Some(ColumnType::Text));
        assert_eq!(ColumnType::from_sql("BIGINT"), Some(ColumnType::Integer));
        assert_eq!(ColumnType::from_sql("Timestamp"), Some(ColumnType::DateTime));
        assert_eq!(ColumnType::from_sql("jsonb"), Some(ColumnType::Json));
        assert_eq!(ColumnType::from_sql("GEOMETRY"), None);
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Null.to_string(), "");
        assert_eq!(FieldValue::Integer(7).to_string(), "7");
        assert_eq!(FieldValue::Blob(vec![0xde, 0xad]).to_string(), "dead");
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(FieldValue::DateTime(dt).to_string(), "2024-03-01 10:30:00");
        let precise = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(10, 30, 0, 250)
            .unwrap();
        assert_eq!(
            FieldValue::DateTime(precise).to_string(),
            "2024-03-01 10:30:00.250"
        );
    }

    #[test]
    fn test_object_id_json_round_trip_through_from_json() {
        let mut id = ObjectId::default();
        id.0.insert("id".into(), FieldValue::Integer(3));
        id.0.insert("code".into(), FieldValue::Text("a-1".into()));
        assert_eq!(id.to_string(), r#"{"code":"a-1","id":3}"#);

        let parsed: Value = serde_json::from_str(&id.to_string()).unwrap();
        let back = FieldValue::from_json(&parsed["id"]);
        assert_eq!(back, FieldValue::Integer(3));
    }
}
