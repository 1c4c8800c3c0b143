// ABOUTME: Database handle for the admin panel: connection pool, migrations, and row access
// ABOUTME: Owns the SQLite pool and the history table the panel maintains for itself
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Database Management
//!
//! The admin panel works against tables it did not create. The only schema it owns
//! is the change-history table created by [`Database::migrate`]. Row access for
//! registered models lives in [`crud`], history access in [`history`], and the
//! translation of constraint failures into user messages in [`constraint`].

/// Constraint violation classification
pub mod constraint;
/// Dynamic row access for registered models
pub mod crud;
/// Change-history log
pub mod history;

pub use constraint::ConstraintViolation;
pub use crud::SearchFilter;
pub use history::{HistoryEntry, NewHistoryEntry};

use crate::constants::defaults;
use crate::errors::AppResult;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Result of raw database calls, kept as `sqlx::Error` so constraint kinds survive
pub type DbResult<T> = Result<T, sqlx::Error>;

/// Database handle shared by all admin handlers
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
    history_table: String,
}

impl Database {
    /// Connect to `database_url`, creating the database file and its directory if needed
    ///
    /// In-memory databases get a single long-lived connection so every handler
    /// sees the same data.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the connection fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let is_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        if !is_memory {
            if let Some(parent) = options.get_filename().parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }

        let pool_options = if is_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options.connect_with(options).await?;
        info!(memory = is_memory, "Database connection pool ready");

        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool owned by the host application
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            history_table: defaults::HISTORY_TABLE.to_owned(),
        }
    }

    /// Use a different history table name
    #[must_use]
    pub fn with_history_table(mut self, table: impl Into<String>) -> Self {
        self.history_table = table.into();
        self
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Name of the history table
    #[must_use]
    pub fn history_table(&self) -> &str {
        &self.history_table
    }

    /// Create the tables the admin panel owns
    ///
    /// # Errors
    ///
    /// Returns an error if table creation fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_history().await?;
        Ok(())
    }
}

/// Quote an SQL identifier
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
