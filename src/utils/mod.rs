// ABOUTME: Helpers shared by form handlers, the CSV importer, and the JSON API
// ABOUTME: Object id parsing, type correction, hash-name reversal, change diffs, required checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Form processing helpers.
//!
//! Raw request parameters arrive as [`Params`]: display or physical column name to
//! string. These helpers turn them into typed [`Row`]s and [`ObjectId`]s using the
//! model's [`TableDetails`].

use crate::errors::{AppError, AppResult, CoercionError};
use crate::hashing::HashMethod;
use crud_admin_core::coercion::coerce;
use crud_admin_core::models::{ColumnType, FieldValue, ObjectId, Row, TableDetails};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub use crate::schema::capitalize;

/// Raw request parameters, column name to submitted text
pub type Params = BTreeMap<String, String>;

/// Parse the JSON `_id` query value into an [`ObjectId`].
///
/// Single-quoted objects (`{'id': 1}`) are accepted as well.
///
/// # Errors
///
/// Returns `InvalidInput` if the value is not a JSON object
pub fn extract_obj_id_from_query(raw: &str) -> AppResult<ObjectId> {
    let parsed = serde_json::from_str::<Value>(raw)
        .or_else(|_| serde_json::from_str::<Value>(&raw.replace('\'', "\"")))
        .map_err(|e| AppError::invalid_input(format!("Malformed object id '{raw}': {e}")))?;

    match parsed {
        Value::Object(map) => Ok(ObjectId(
            map.iter()
                .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
                .collect(),
        )),
        other => Err(AppError::invalid_input(format!(
            "Object id must be a JSON object, got {other}"
        ))),
    }
}

/// Re-type object id values that JSON could only carry as text (dates, times).
///
/// # Errors
///
/// Returns [`CoercionError`] if a textual value does not parse as its column's type
pub fn correct_id_types(details: &TableDetails, id: ObjectId) -> Result<ObjectId, CoercionError> {
    id.0.into_iter()
        .map(|(name, value)| -> Result<(String, FieldValue), CoercionError> {
            let value = match (value, details.column_by_any_name(&name)) {
                (FieldValue::Text(text), Some(column))
                    if !matches!(column.column_type, ColumnType::Text | ColumnType::Hash) =>
                {
                    coerce(&text, column)?
                }
                (value, _) => value,
            };
            Ok((name, value))
        })
        .collect::<Result<_, _>>()
        .map(ObjectId)
}

/// Pick the identity columns out of a typed row
#[must_use]
pub fn get_obj_id_from_row(details: &TableDetails, row: &Row) -> ObjectId {
    ObjectId(
        details
            .identity
            .iter()
            .filter_map(|name| {
                let value = row.get(name).or_else(|| {
                    details
                        .column(name)
                        .and_then(|column| row.get(&column.db_name))
                })?;
                Some((name.clone(), value.clone()))
            })
            .collect(),
    )
}

/// Coerce every parameter that names a model column; other keys are dropped.
///
/// # Errors
///
/// Returns the first [`CoercionError`] encountered
pub fn correct_types(params: &Params, details: &TableDetails) -> Result<Row, CoercionError> {
    params
        .iter()
        .filter_map(|(key, raw)| {
            details
                .column_by_any_name(key)
                .map(|column| coerce(raw, column).map(|value| (key.clone(), value)))
        })
        .collect()
}

/// Rename hashed columns from display to physical names and hash their values.
///
/// An empty hashed field is removed, so an edit leaves the stored hash unchanged.
///
/// # Errors
///
/// Returns an error if hashing fails
pub fn reverse_hash_names(
    details: &TableDetails,
    mut params: Params,
    hash_method: HashMethod,
) -> AppResult<Params> {
    for column in details.columns_data.iter().filter(|c| c.is_hashed()) {
        if let Some(value) = params.remove(&column.name) {
            if !value.is_empty() {
                params.insert(column.db_name.clone(), hash_method.hash(&value)?);
            }
        }
    }
    Ok(params)
}

/// The single integer primary key the database assigns on insert, if any
#[must_use]
pub fn rowid_alias(details: &TableDetails) -> Option<&str> {
    match details.primary_keys.as_slice() {
        [pk] => details
            .column(pk)
            .filter(|c| c.column_type == ColumnType::Integer)
            .map(|c| c.name.as_str()),
        _ => None,
    }
}

/// Required columns that are missing or empty.
///
/// The [`rowid_alias`] is assigned by the database and never reported.
#[must_use]
pub fn not_filled(details: &TableDetails, params: &Params) -> Vec<String> {
    let rowid_alias = rowid_alias(details);

    details
        .required_columns
        .iter()
        .filter(|name| Some(name.as_str()) != rowid_alias)
        .filter(|name| {
            let value = params.get(*name).or_else(|| {
                details
                    .column(name)
                    .and_then(|column| params.get(&column.db_name))
            });
            value.map_or(true, |v| v.trim().is_empty())
        })
        .cloned()
        .collect()
}

/// Values that differ between two versions of a row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    /// Previous values of changed columns
    pub from: Row,
    /// New values of changed columns
    pub to: Row,
}

impl Changes {
    /// Whether nothing changed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to.is_empty()
    }
}

/// Compare two versions of a row
#[must_use]
pub fn get_changes(old: &Row, new: &Row) -> Changes {
    let mut changes = Changes::default();
    for (key, value) in new {
        let previous = old.get(key).cloned().unwrap_or(FieldValue::Null);
        if &previous != value {
            changes.from.insert(key.clone(), previous);
            changes.to.insert(key.clone(), value.clone());
        }
    }
    changes
}

/// Drop submitted values equal to what the row already holds.
///
/// Unchanged cells are never written back, so a stored value keeps its textual
/// form (offsets, precision) unless the user actually edits it.
#[must_use]
pub fn retain_changed(details: &TableDetails, old: &Row, row: Row) -> Row {
    row.into_iter()
        .filter(|(key, value)| {
            let previous = details
                .column_by_any_name(key)
                .and_then(|column| old.get(&column.name).or_else(|| old.get(&column.db_name)));
            previous != Some(value)
        })
        .collect()
}

/// JSON object form of a row, as shown in flash messages
#[must_use]
pub fn row_to_json(row: &Row) -> Value {
    Value::Object(row.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}

impl fmt::Display for Changes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "from {} to {}",
            row_to_json(&self.from),
            row_to_json(&self.to)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::extract_column_data;
    use crate::schema::introspect::{RawColumn, RawTable};
    use chrono::NaiveDate;

    fn users() -> TableDetails {
        extract_column_data(
            "users",
            &RawTable {
                columns: vec![
                    RawColumn::new(0, "id", "INTEGER").primary_key(),
                    RawColumn::new(1, "email", "VARCHAR(10)").not_null(),
                    RawColumn::new(2, "password_hash", "TEXT"),
                    RawColumn::new(3, "age", "INTEGER"),
                ],
                ..RawTable::default()
            },
        )
    }

    fn events() -> TableDetails {
        extract_column_data(
            "events",
            &RawTable {
                columns: vec![
                    RawColumn::new(0, "day", "DATE").primary_key(),
                    RawColumn::new(1, "room", "TEXT").primary_key(),
                ],
                ..RawTable::default()
            },
        )
    }

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_extract_obj_id_accepts_json_and_single_quotes() {
        let id = extract_obj_id_from_query(r#"{"id": 3}"#).unwrap();
        assert_eq!(id.0.get("id"), Some(&FieldValue::Integer(3)));
        let id = extract_obj_id_from_query("{'room': 'A'}").unwrap();
        assert_eq!(id.0.get("room"), Some(&FieldValue::Text("A".into())));
        assert!(extract_obj_id_from_query("[1]").is_err());
        assert!(extract_obj_id_from_query("nope").is_err());
    }

    #[test]
    fn test_correct_id_types_parses_dates() {
        let id = extract_obj_id_from_query(r#"{"day": "2024-05-01", "room": "A"}"#).unwrap();
        let id = correct_id_types(&events(), id).unwrap();
        assert_eq!(
            id.0.get("day"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()))
        );
        assert_eq!(id.0.get("room"), Some(&FieldValue::Text("A".into())));
    }

    #[test]
    fn test_correct_types_drops_unknown_and_reports_bad_values() {
        let row = correct_types(&params(&[("age", "41"), ("_id", "x")]), &users()).unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("age"), Some(&FieldValue::Integer(41)));

        let err = correct_types(&params(&[("age", "old")]), &users()).unwrap_err();
        assert!(matches!(err, CoercionError::InvalidValue { .. }));
        let err = correct_types(&params(&[("email", "much-too-long")]), &users()).unwrap_err();
        assert!(matches!(err, CoercionError::TooLong { len: 10, .. }));
    }

    #[test]
    fn test_reverse_hash_names_hashes_and_skips_empty() {
        let details = users();
        let out = reverse_hash_names(&details, params(&[("password", "pw")]), HashMethod::Sha256)
            .unwrap();
        assert!(!out.contains_key("password"));
        assert_eq!(out.get("password_hash").map(String::len), Some(64));

        let out =
            reverse_hash_names(&details, params(&[("password", "")]), HashMethod::Sha256).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_not_filled_skips_rowid_alias() {
        let details = users();
        assert_eq!(not_filled(&details, &params(&[])), vec!["email"]);
        assert_eq!(not_filled(&details, &params(&[("email", " ")])), vec!["email"]);
        assert!(not_filled(&details, &params(&[("email", "a@b")])).is_empty());

        let missing = not_filled(&events(), &params(&[("room", "A")]));
        assert_eq!(missing, vec!["day"]);
    }

    #[test]
    fn test_get_obj_id_and_changes() {
        let mut old = Row::new();
        old.insert("id".into(), FieldValue::Integer(1));
        old.insert("email".into(), FieldValue::Text("a@b".into()));
        let mut new = old.clone();
        new.insert("email".into(), FieldValue::Text("c@d".into()));

        let id = get_obj_id_from_row(&users(), &new);
        assert_eq!(id.to_string(), r#"{"id":1}"#);

        let changes = get_changes(&old, &new);
        assert_eq!(changes.to_string(), r#"from {"email":"a@b"} to {"email":"c@d"}"#);
        assert!(get_changes(&old, &old).is_empty());
    }

    #[test]
    fn test_retain_changed_drops_values_already_stored() {
        let mut old = Row::new();
        old.insert("id".into(), FieldValue::Integer(1));
        old.insert("email".into(), FieldValue::Text("a@b".into()));
        old.insert("password".into(), FieldValue::Text("old-hash".into()));
        old.insert("age".into(), FieldValue::Null);

        let mut submitted = Row::new();
        submitted.insert("id".into(), FieldValue::Integer(1));
        submitted.insert("email".into(), FieldValue::Text("c@d".into()));
        submitted.insert("password_hash".into(), FieldValue::Text("old-hash".into()));
        submitted.insert("age".into(), FieldValue::Null);

        let kept = retain_changed(&users(), &old, submitted);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.get("email"), Some(&FieldValue::Text("c@d".into())));
    }
}
