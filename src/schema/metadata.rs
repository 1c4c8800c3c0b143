// ABOUTME: Turns raw table descriptions into admin metadata for each declared model
// ABOUTME: Derives display names, hashed columns, required/unique/primary sets, and identity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Column metadata extraction.

use super::introspect::RawTable;
use super::ModelRegistry;
use crate::constants::columns::HASH_SUFFIX;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crud_admin_core::models::{ColumnData, ColumnType, ForeignKeyLink, ForeignKeyRef, TableDetails};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{debug, error, warn};

fn declared_type_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([^(]*?)\s*(?:\(\s*(\d+)\s*(?:,\s*\d+\s*)?\))?\s*$")
            .unwrap_or_else(|_| unreachable!("static regex is valid"))
    })
}

/// Split a declared type into its name and optional length.
///
/// `VARCHAR(255)` gives `("VARCHAR", Some(255))`, `NUMERIC(10, 2)` gives
/// `("NUMERIC", Some(10))`, and `TEXT` gives `("TEXT", None)`.
#[must_use]
pub fn split_declared_type(declared: &str) -> (String, Option<usize>) {
    declared_type_regex().captures(declared).map_or_else(
        || (declared.trim().to_owned(), None),
        |caps| {
            let name = caps.get(1).map_or("", |m| m.as_str()).to_owned();
            let len = caps.get(2).and_then(|m| m.as_str().parse().ok());
            (name, len)
        },
    )
}

/// Build [`TableDetails`] for one model from its raw description
#[must_use]
pub fn extract_column_data(model_id: &str, raw: &RawTable) -> TableDetails {
    let mut columns_data = Vec::with_capacity(raw.columns.len());
    let mut hashed_indexes = Vec::new();
    let single_primary = raw.columns.iter().filter(|c| c.primary_key).count() == 1;

    for (num, column) in raw.columns.iter().enumerate() {
        let (type_name, len) = split_declared_type(&column.declared_type);

        let (name, column_type) = if let Some((base, _)) = column.name.split_once(HASH_SUFFIX) {
            hashed_indexes.push(num);
            (base.to_owned(), ColumnType::Hash)
        } else {
            let column_type = ColumnType::from_sql(&type_name).unwrap_or_else(|| {
                error!(
                    model = %model_id,
                    column = %column.name,
                    "{} was not found in types map, treating as text",
                    column.declared_type
                );
                ColumnType::Text
            });
            (column.name.clone(), column_type)
        };

        let foreign_keys = raw
            .foreign_keys
            .iter()
            .filter(|fk| fk.from == column.name)
            .map(|fk| ForeignKeyRef {
                column: fk.from.clone(),
                target_table: fk.table.clone(),
                target_column: fk.to.clone().unwrap_or_default(),
            })
            .collect();

        columns_data.push(ColumnData {
            name,
            db_name: column.name.clone(),
            column_type,
            db_type: column.declared_type.clone(),
            len,
            nullable: !column.not_null,
            unique: raw.unique_columns.contains(&column.name)
                || (column.primary_key && single_primary),
            primary: column.primary_key,
            foreign_keys,
        });
    }

    let required_columns = columns_data
        .iter()
        .filter(|c| !c.nullable || c.primary)
        .map(|c| c.name.clone())
        .collect();
    let unique_columns: Vec<String> = columns_data
        .iter()
        .filter(|c| c.unique)
        .map(|c| c.name.clone())
        .collect();
    let primary_keys: Vec<String> = columns_data
        .iter()
        .filter(|c| c.primary)
        .map(|c| c.name.clone())
        .collect();

    let mut foreign_keys = BTreeMap::new();
    for column in &columns_data {
        for fk in &column.foreign_keys {
            foreign_keys.insert(
                fk.target_table.clone(),
                ForeignKeyLink {
                    column: column.name.clone(),
                    target_column: fk.target_column.clone(),
                },
            );
        }
    }

    let identity = if primary_keys.is_empty() {
        unique_columns.clone()
    } else {
        primary_keys.clone()
    };

    TableDetails {
        model_id: model_id.to_owned(),
        unique_columns,
        required_columns,
        columns_names: columns_data.iter().map(|c| c.name.clone()).collect(),
        columns_data,
        primary_keys,
        hashed_indexes,
        foreign_keys,
        identity,
    }
}

/// Introspect every declared model and build the registry.
///
/// Models without any primary key or unique column cannot be addressed row by row
/// and are left out with a warning.
///
/// # Errors
///
/// Returns a config error if a declared model has no table, or a database error if
/// introspection fails
pub async fn extract_models_metadata(
    database: &Database,
    model_ids: &[String],
) -> AppResult<ModelRegistry> {
    let mut models = Vec::with_capacity(model_ids.len());

    for model_id in model_ids {
        if !database.table_exists(model_id).await? {
            return Err(AppError::config(format!(
                "Model {model_id} was declared but table '{model_id}' does not exist"
            )));
        }
        let raw = database.describe_table(model_id).await?;
        let details = extract_column_data(model_id, &raw);

        if details.identity.is_empty() {
            warn!(
                "Model {} will not be displayed in Admin Panel because does not contains any unique column",
                capitalize(model_id)
            );
            continue;
        }

        debug!(
            model = %model_id,
            columns = details.columns_names.len(),
            identity = ?details.identity,
            "Extracted model metadata"
        );
        models.push(details);
    }

    Ok(ModelRegistry::new(models))
}

/// Upper-case the first character of a model id
#[must_use]
pub fn capitalize(model_id: &str) -> String {
    let mut chars = model_id.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::introspect::{RawColumn, RawForeignKey};

    fn users_table() -> RawTable {
        RawTable {
            columns: vec![
                RawColumn::new(0, "id", "INTEGER").primary_key(),
                RawColumn::new(1, "email", "VARCHAR(120)").not_null(),
                RawColumn::new(2, "password_hash", "TEXT"),
                RawColumn::new(3, "score", "GEOMETRY"),
                RawColumn::new(4, "team_id", "INTEGER"),
            ],
            foreign_keys: vec![RawForeignKey {
                from: "team_id".into(),
                table: "teams".into(),
                to: Some("id".into()),
            }],
            unique_columns: ["email".to_owned()].into_iter().collect(),
        }
    }

    #[test]
    fn test_split_declared_type() {
        assert_eq!(split_declared_type("VARCHAR(255)"), ("VARCHAR".into(), Some(255)));
        assert_eq!(split_declared_type("NUMERIC(10, 2)"), ("NUMERIC".into(), Some(10)));
        assert_eq!(split_declared_type("TEXT"), ("TEXT".into(), None));
        assert_eq!(split_declared_type(""), (String::new(), None));
    }

    #[test]
    fn test_hashed_column_is_renamed() {
        let details = extract_column_data("users", &users_table());
        assert_eq!(details.hashed_indexes, vec![2]);
        let password = details.column("password").unwrap();
        assert_eq!(password.db_name, "password_hash");
        assert_eq!(password.column_type, ColumnType::Hash);
        assert!(details.is_hashed("password"));
    }

    #[test]
    fn test_required_unique_primary_sets() {
        let details = extract_column_data("users", &users_table());
        assert_eq!(details.required_columns, vec!["id", "email"]);
        assert_eq!(details.unique_columns, vec!["id", "email"]);
        assert_eq!(details.primary_keys, vec!["id"]);
        assert_eq!(details.identity, vec!["id"]);
        assert_eq!(details.column("email").unwrap().len, Some(120));
    }

    #[test]
    fn test_unknown_type_falls_back_to_text() {
        let details = extract_column_data("users", &users_table());
        assert_eq!(details.column("score").unwrap().column_type, ColumnType::Text);
    }

    #[test]
    fn test_foreign_keys_by_target_table() {
        let details = extract_column_data("users", &users_table());
        let link = details.foreign_keys.get("teams").unwrap();
        assert_eq!(link.column, "team_id");
        assert_eq!(link.target_column, "id");

        let column_fks = &details.column("team_id").unwrap().foreign_keys;
        assert_eq!(
            column_fks,
            &vec![ForeignKeyRef {
                column: "team_id".into(),
                target_table: "teams".into(),
                target_column: "id".into(),
            }]
        );
    }

    #[test]
    fn test_identity_falls_back_to_unique_columns() {
        let raw = RawTable {
            columns: vec![
                RawColumn::new(0, "code", "TEXT").not_null(),
                RawColumn::new(1, "label", "TEXT"),
            ],
            foreign_keys: Vec::new(),
            unique_columns: ["code".to_owned()].into_iter().collect(),
        };
        let details = extract_column_data("codes", &raw);
        assert!(details.primary_keys.is_empty());
        assert_eq!(details.identity, vec!["code"]);
    }

    #[test]
    fn test_composite_primary_key_is_not_unique_per_column() {
        let raw = RawTable {
            columns: vec![
                RawColumn::new(0, "a", "INTEGER").primary_key(),
                RawColumn::new(1, "b", "INTEGER").primary_key(),
            ],
            ..RawTable::default()
        };
        let details = extract_column_data("pairs", &raw);
        assert!(details.unique_columns.is_empty());
        assert_eq!(details.identity, vec!["a", "b"]);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("users"), "Users");
        assert_eq!(capitalize(""), "");
    }
}
