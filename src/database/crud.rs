// ABOUTME: Row-level CRUD on registered models using dynamically built, fully bound SQL
// ABOUTME: Decodes SQLite cells by storage class and column metadata into FieldValue rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Dynamic CRUD over introspected tables.
//!
//! Identifiers always come from [`TableDetails`] and are quoted with
//! [`quote_ident`]; every value is bound. Rows are keyed by column display name.

use super::{quote_ident, Database, DbResult};
use crate::schema::ModelRegistry;
use crud_admin_core::coercion::coerce;
use crud_admin_core::models::{ColumnData, ColumnType, FieldValue, ObjectId, Row, TableDetails};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow, SqliteValueRef};
use sqlx::{Decode, Row as _, TypeInfo, ValueRef};
use tracing::{debug, info};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Substring search on one column of the table view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Display or physical column name
    pub column: String,
    /// Text that must appear in the column
    pub text: String,
}

impl SearchFilter {
    /// Build a filter, ignoring empty search text
    #[must_use]
    pub fn new(column: impl Into<String>, text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self {
            column: column.into(),
            text,
        })
    }

    /// `WHERE` clause and bound pattern, or `None` when the column is not part of the model
    fn clause(&self, details: &TableDetails) -> Option<(String, String)> {
        let column = details.column_by_any_name(&self.column)?;
        Some((
            format!(
                r" WHERE CAST({} AS TEXT) LIKE ? ESCAPE '\'",
                quote_ident(&column.db_name)
            ),
            format!("%{}%", escape_like(&self.text)),
        ))
    }
}

impl Database {
    /// Number of rows in a model, optionally filtered
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_rows(
        &self,
        details: &TableDetails,
        filter: Option<&SearchFilter>,
    ) -> DbResult<i64> {
        let clause = filter.and_then(|f| f.clause(details));
        let sql = format!(
            "SELECT COUNT(*) AS total FROM {}{}",
            quote_ident(&details.model_id),
            clause.as_ref().map_or("", |(sql, _)| sql.as_str())
        );
        let mut query = sqlx::query(&sql);
        if let Some((_, pattern)) = clause.clone() {
            query = query.bind(pattern);
        }
        let row = query.fetch_one(self.pool()).await?;
        row.try_get("total")
    }

    /// One page of rows ordered by identity
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a cell cannot be decoded
    pub async fn select_rows(
        &self,
        details: &TableDetails,
        filter: Option<&SearchFilter>,
        limit: u32,
        offset: u32,
    ) -> DbResult<Vec<Row>> {
        let clause = filter.and_then(|f| f.clause(details));
        let order = details
            .identity
            .iter()
            .filter_map(|name| details.column(name))
            .map(|c| quote_ident(&c.db_name))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM {}{}{} LIMIT ? OFFSET ?",
            select_list(details),
            quote_ident(&details.model_id),
            clause.as_ref().map_or("", |(sql, _)| sql.as_str()),
            if order.is_empty() {
                String::new()
            } else {
                format!(" ORDER BY {order}")
            }
        );

        let mut query = sqlx::query(&sql);
        if let Some((_, pattern)) = clause.clone() {
            query = query.bind(pattern);
        }
        let rows = query
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(self.pool())
            .await?;

        rows.iter().map(|row| decode_row(details, row)).collect()
    }

    /// Fetch the row matching every identity value
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a cell cannot be decoded
    pub async fn get_by_params(
        &self,
        details: &TableDetails,
        object_id: &ObjectId,
    ) -> DbResult<Option<Row>> {
        let Some((where_sql, values)) = where_identity(details, object_id) else {
            return Ok(None);
        };
        let sql = format!(
            "SELECT {} FROM {} WHERE {where_sql} LIMIT 1",
            select_list(details),
            quote_ident(&details.model_id)
        );
        let query = bind_all(sqlx::query(&sql), &values);
        let row = query.fetch_optional(self.pool()).await?;
        row.map(|row| decode_row(details, &row)).transpose()
    }

    /// Insert a row and return its rowid; keys not belonging to the model are ignored
    ///
    /// # Errors
    ///
    /// Returns the driver error, including constraint violations
    pub async fn insert_row(&self, details: &TableDetails, row: &Row) -> DbResult<i64> {
        let (columns, values) = assignments(details, row);
        let table = quote_ident(&details.model_id);
        let sql = if columns.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                columns.join(", "),
                vec!["?"; columns.len()].join(", ")
            )
        };
        let result = bind_all(sqlx::query(&sql), &values)
            .execute(self.pool())
            .await?;
        debug!(model = %details.model_id, rowid = result.last_insert_rowid(), "Inserted row");
        Ok(result.last_insert_rowid())
    }

    /// Update the row identified by `object_id` with the values in `row`
    ///
    /// # Errors
    ///
    /// Returns the driver error, including constraint violations
    pub async fn update_row(
        &self,
        details: &TableDetails,
        object_id: &ObjectId,
        row: &Row,
    ) -> DbResult<u64> {
        let Some((where_sql, id_values)) = where_identity(details, object_id) else {
            return Ok(0);
        };
        let (columns, mut values) = assignments(details, row);
        if columns.is_empty() {
            return Ok(0);
        }
        let set_sql = columns
            .iter()
            .map(|c| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {set_sql} WHERE {where_sql}",
            quote_ident(&details.model_id)
        );
        values.extend(id_values);
        let result = bind_all(sqlx::query(&sql), &values)
            .execute(self.pool())
            .await?;
        debug!(model = %details.model_id, id = %object_id, "Updated row");
        Ok(result.rows_affected())
    }

    /// Delete the row identified by `object_id`
    ///
    /// # Errors
    ///
    /// Returns the driver error, including foreign key violations
    pub async fn delete_row(&self, details: &TableDetails, object_id: &ObjectId) -> DbResult<u64> {
        let Some((where_sql, values)) = where_identity(details, object_id) else {
            return Ok(0);
        };
        let sql = format!(
            "DELETE FROM {} WHERE {where_sql}",
            quote_ident(&details.model_id)
        );
        let result = bind_all(sqlx::query(&sql), &values)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete every row of a model
    ///
    /// # Errors
    ///
    /// Returns the driver error, including foreign key violations
    pub async fn delete_all_rows(&self, details: &TableDetails) -> DbResult<u64> {
        let sql = format!("DELETE FROM {}", quote_ident(&details.model_id));
        let result = sqlx::query(&sql).execute(self.pool()).await?;
        Ok(result.rows_affected())
    }

    /// Delete every row of every registered model, referencing models first
    ///
    /// Runs in one transaction, so a failure leaves all tables untouched.
    ///
    /// # Errors
    ///
    /// Returns the driver error of the first failing delete
    pub async fn clear_all(&self, registry: &ModelRegistry) -> DbResult<u64> {
        let mut tx = self.pool().begin().await?;
        let mut deleted = 0;
        for model_id in registry.deletion_order() {
            let sql = format!("DELETE FROM {}", quote_ident(model_id));
            deleted += sqlx::query(&sql).execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;
        info!(models = registry.len(), rows = deleted, "Cleared all registered models");
        Ok(deleted)
    }
}

/// Make `%`, `_` and the escape character match themselves in a LIKE pattern
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn select_list(details: &TableDetails) -> String {
    details
        .columns_data
        .iter()
        .map(|c| quote_ident(&c.db_name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Quoted column names and values for the model columns present in `row`
fn assignments(details: &TableDetails, row: &Row) -> (Vec<String>, Vec<FieldValue>) {
    row.iter()
        .filter_map(|(key, value)| {
            details
                .column_by_any_name(key)
                .map(|column| (quote_ident(&column.db_name), value.clone()))
        })
        .unzip()
}

/// `col = ? AND ...` over the identity values, `None` if no value maps to a column
fn where_identity(
    details: &TableDetails,
    object_id: &ObjectId,
) -> Option<(String, Vec<FieldValue>)> {
    let (conditions, values): (Vec<String>, Vec<FieldValue>) = object_id
        .iter()
        .filter_map(|(key, value)| {
            details.column_by_any_name(key).map(|column| {
                let name = quote_ident(&column.db_name);
                if value.is_null() {
                    (format!("{name} IS ?"), value.clone())
                } else {
                    (format!("{name} = ?"), value.clone())
                }
            })
        })
        .unzip();
    if conditions.is_empty() {
        None
    } else {
        Some((conditions.join(" AND "), values))
    }
}

fn bind_all<'q>(query: SqliteQuery<'q>, values: &[FieldValue]) -> SqliteQuery<'q> {
    values.iter().fold(query, bind_value)
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &FieldValue) -> SqliteQuery<'q> {
    match value {
        FieldValue::Null => query.bind(None::<String>),
        FieldValue::Integer(i) => query.bind(*i),
        FieldValue::Float(f) => query.bind(*f),
        FieldValue::Boolean(b) => query.bind(*b),
        FieldValue::Blob(bytes) => query.bind(bytes.clone()),
        other => query.bind(other.to_string()),
    }
}

fn decode_row(details: &TableDetails, row: &SqliteRow) -> DbResult<Row> {
    let mut decoded = Row::new();
    for column in &details.columns_data {
        let raw = row.try_get_raw(column.db_name.as_str())?;
        decoded.insert(column.name.clone(), decode_value(raw, column)?);
    }
    Ok(decoded)
}

fn decode<'r, T: Decode<'r, Sqlite>>(raw: SqliteValueRef<'r>) -> DbResult<T> {
    T::decode(raw).map_err(sqlx::Error::Decode)
}

/// Decode by storage class, then shape the value by the column's logical type
fn decode_value(raw: SqliteValueRef<'_>, column: &ColumnData) -> DbResult<FieldValue> {
    if raw.is_null() {
        return Ok(FieldValue::Null);
    }
    let storage = raw.type_info().name().to_owned();
    let value = match storage.as_str() {
        "INTEGER" => {
            let number: i64 = decode(raw)?;
            match column.column_type {
                ColumnType::Boolean => FieldValue::Boolean(number != 0),
                #[allow(clippy::cast_precision_loss)]
                ColumnType::Float | ColumnType::Decimal => FieldValue::Float(number as f64),
                _ => FieldValue::Integer(number),
            }
        }
        "REAL" => FieldValue::Float(decode(raw)?),
        "BLOB" => FieldValue::Blob(decode(raw)?),
        _ => {
            let text: String = decode(raw)?;
            match column.column_type {
                ColumnType::Text | ColumnType::Hash => FieldValue::Text(text),
                _ => match coerce(&text, column) {
                    Ok(value) => value,
                    Err(_) => FieldValue::Text(text),
                },
            }
        }
    };
    Ok(value)
}
