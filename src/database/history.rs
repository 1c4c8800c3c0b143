// ABOUTME: Change-history side table written after every successful mutating request
// ABOUTME: Stores who changed what, when, through which route, and the affected object id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::{quote_ident, Database};
use crate::errors::AppResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;
use tracing::warn;

/// A history row as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Row id
    pub id: i64,
    /// Admin user who made the change
    pub user: String,
    /// When the change happened, as stored (RFC 3339)
    pub datetime: String,
    /// Request path that made the change
    pub route: String,
    /// Model affected, if any
    pub model_id: Option<String>,
    /// User-facing description of the change
    pub log_message: String,
    /// Identity of the affected object, or the model id for bulk changes
    pub object_id: Option<String>,
}

impl HistoryEntry {
    /// Parsed change time, `None` if the stored text is not RFC 3339
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.datetime)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Change time for display; unparseable values are shown as stored
    #[must_use]
    pub fn display_time(&self) -> String {
        self.timestamp().map_or_else(
            || self.datetime.clone(),
            |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        )
    }
}

/// A history row about to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    /// Admin user who made the change
    pub user: String,
    /// Request path that made the change
    pub route: String,
    /// Model affected, if any
    pub model_id: Option<String>,
    /// User-facing description of the change
    pub log_message: String,
    /// Identity of the affected object
    pub object_id: Option<String>,
}

impl Database {
    /// Create the history table
    ///
    /// # Errors
    ///
    /// Returns an error if the schema migration fails
    pub(super) async fn migrate_history(&self) -> AppResult<()> {
        let table = quote_ident(self.history_table());
        sqlx::query(&format!(
            r"
            CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user TEXT NOT NULL,
                datetime TEXT NOT NULL,
                route TEXT NOT NULL,
                model_id TEXT,
                log_message TEXT NOT NULL,
                object_id TEXT
            )
            "
        ))
        .execute(self.pool())
        .await?;

        let index = quote_ident(&format!("idx_{}_model_id", self.history_table()));
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {index} ON {table}(model_id)"
        ))
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Append a history row
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn add_history(&self, entry: &NewHistoryEntry) -> AppResult<i64> {
        let table = quote_ident(self.history_table());
        let result = sqlx::query(&format!(
            r"
            INSERT INTO {table} (user, datetime, route, model_id, log_message, object_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "
        ))
        .bind(&entry.user)
        .bind(Utc::now().to_rfc3339())
        .bind(&entry.route)
        .bind(&entry.model_id)
        .bind(&entry.log_message)
        .bind(&entry.object_id)
        .execute(self.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent history rows, newest first, optionally for one model
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_history(
        &self,
        model_id: Option<&str>,
        limit: u32,
    ) -> AppResult<Vec<HistoryEntry>> {
        let table = quote_ident(self.history_table());
        let rows = sqlx::query(&format!(
            r"
            SELECT id, user, datetime, route, model_id, log_message, object_id
            FROM {table}
            WHERE (?1 IS NULL OR model_id = ?1)
            ORDER BY id DESC
            LIMIT ?2
            "
        ))
        .bind(model_id)
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| -> AppResult<HistoryEntry> {
                let entry = HistoryEntry {
                    id: row.try_get("id")?,
                    user: row.try_get("user")?,
                    datetime: row.try_get("datetime")?,
                    route: row.try_get("route")?,
                    model_id: row.try_get("model_id")?,
                    log_message: row.try_get("log_message")?,
                    object_id: row.try_get("object_id")?,
                };
                if entry.timestamp().is_none() {
                    warn!(
                        history.id = entry.id,
                        datetime = %entry.datetime,
                        "History row has an unparseable datetime"
                    );
                }
                Ok(entry)
            })
            .collect()
    }
}
