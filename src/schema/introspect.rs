// ABOUTME: Reads table, column, foreign key, and unique index metadata from SQLite
// ABOUTME: Uses the pragma table-valued functions so table names can be bound safely
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Raw schema introspection.
//!
//! Everything here returns the database's own view of a table. Turning that into
//! admin metadata (display names, identity, required sets) happens in
//! [`super::metadata`].

use crate::database::Database;
use sqlx::Row;
use std::collections::BTreeSet;

/// One row of `pragma_table_info`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    /// Zero-based column position
    pub position: usize,
    /// Physical column name
    pub name: String,
    /// Declared type, possibly empty
    pub declared_type: String,
    /// Declared `NOT NULL`
    pub not_null: bool,
    /// Part of the primary key
    pub primary_key: bool,
}

impl RawColumn {
    /// Convenience constructor used by tests and in-memory schemas
    #[must_use]
    pub fn new(position: usize, name: &str, declared_type: &str) -> Self {
        Self {
            position,
            name: name.to_owned(),
            declared_type: declared_type.to_owned(),
            not_null: false,
            primary_key: false,
        }
    }

    /// Mark the column `NOT NULL`
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Mark the column as primary key
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// One row of `pragma_foreign_key_list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawForeignKey {
    /// Referencing column in this table
    pub from: String,
    /// Referenced table
    pub table: String,
    /// Referenced column; `None` means the referenced table's primary key
    pub to: Option<String>,
}

/// Full raw description of one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Columns in table order
    pub columns: Vec<RawColumn>,
    /// Declared foreign keys
    pub foreign_keys: Vec<RawForeignKey>,
    /// Columns covered by a single-column unique index or constraint
    pub unique_columns: BTreeSet<String>,
}

impl Database {
    /// List user tables, excluding `SQLite` internals and the history table
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails
    pub async fn list_tables(&self) -> Result<Vec<String>, sqlx::Error> {
        let rows = sqlx::query(
            r"
            SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != ?
            ORDER BY name
            ",
        )
        .bind(self.history_table())
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(|row| row.try_get::<String, _>("name")).collect()
    }

    /// Whether a table exists
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails
    pub async fn table_exists(&self, table: &str) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(self.pool())
        .await?;
        Ok(count > 0)
    }

    /// Read columns, foreign keys, and unique columns of a table
    ///
    /// # Errors
    ///
    /// Returns an error if any pragma query fails
    pub async fn describe_table(&self, table: &str) -> Result<RawTable, sqlx::Error> {
        Ok(RawTable {
            columns: self.table_columns(table).await?,
            foreign_keys: self.table_foreign_keys(table).await?,
            unique_columns: self.table_unique_columns(table).await?,
        })
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<RawColumn>, sqlx::Error> {
        let rows = sqlx::query(
            r#"SELECT cid, name, type, "notnull", pk FROM pragma_table_info(?) ORDER BY cid"#,
        )
        .bind(table)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| -> Result<RawColumn, sqlx::Error> {
                Ok(RawColumn {
                    position: usize::try_from(row.try_get::<i64, _>("cid")?).unwrap_or_default(),
                    name: row.try_get("name")?,
                    declared_type: row.try_get::<Option<String>, _>("type")?.unwrap_or_default(),
                    not_null: row.try_get::<i64, _>("notnull")? != 0,
                    primary_key: row.try_get::<i64, _>("pk")? != 0,
                })
            })
            .collect()
    }

    async fn table_foreign_keys(&self, table: &str) -> Result<Vec<RawForeignKey>, sqlx::Error> {
        let rows = sqlx::query(r#"SELECT "from", "table", "to" FROM pragma_foreign_key_list(?)"#)
            .bind(table)
            .fetch_all(self.pool())
            .await?;

        let mut foreign_keys = Vec::with_capacity(rows.len());
        for row in &rows {
            let target: String = row.try_get("table")?;
            let to = match row.try_get::<Option<String>, _>("to")? {
                Some(column) => Some(column),
                // `REFERENCES parent` without a column targets the parent's primary key
                None => {
                    sqlx::query_scalar("SELECT name FROM pragma_table_info(?) WHERE pk = 1")
                        .bind(&target)
                        .fetch_optional(self.pool())
                        .await?
                }
            };
            foreign_keys.push(RawForeignKey {
                from: row.try_get("from")?,
                table: target,
                to,
            });
        }
        Ok(foreign_keys)
    }

    async fn table_unique_columns(&self, table: &str) -> Result<BTreeSet<String>, sqlx::Error> {
        let indexes = sqlx::query(
            r#"SELECT name FROM pragma_index_list(?) WHERE "unique" = 1 AND origin != 'pk'"#,
        )
        .bind(table)
        .fetch_all(self.pool())
        .await?;

        let mut unique = BTreeSet::new();
        for index in &indexes {
            let index_name: String = index.try_get("name")?;
            let columns: Vec<Option<String>> =
                sqlx::query_scalar("SELECT name FROM pragma_index_info(?)")
                    .bind(&index_name)
                    .fetch_all(self.pool())
                    .await?;
            // Composite unique indexes do not make any single column unique
            if let [Some(column)] = columns.as_slice() {
                unique.insert(column.clone());
            }
        }
        Ok(unique)
    }
}
