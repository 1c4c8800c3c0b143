// ABOUTME: Classifies driver-level constraint failures into unique, foreign key, and not-null cases
// ABOUTME: Extracts the offending column from not-null messages for user-facing flash text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Constraint violation translation.
//!
//! sqlx exposes the driver's error classification through
//! [`sqlx::error::DatabaseError::kind`]. Handlers use [`ConstraintViolation`] to
//! pick the flash message shown to the admin user.

use crate::schema::capitalize;
use sqlx::error::ErrorKind;
use std::fmt;

/// What went wrong when a write hit a constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// Unique or primary key constraint
    Unique,
    /// Foreign key constraint, with the driver's message
    ForeignKey(String),
    /// Not-null constraint on a column
    NotNull {
        /// Column named in the driver message
        column: String,
    },
    /// Check constraint, with the driver's message
    Check(String),
    /// Anything else, with the driver's message
    Other(String),
}

impl ConstraintViolation {
    /// Classify a sqlx error
    #[must_use]
    pub fn classify(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(db) => match db.kind() {
                ErrorKind::UniqueViolation => Self::Unique,
                ErrorKind::ForeignKeyViolation => Self::ForeignKey(db.message().to_owned()),
                ErrorKind::NotNullViolation => Self::NotNull {
                    column: not_null_column(db.message()),
                },
                ErrorKind::CheckViolation => Self::Check(db.message().to_owned()),
                _ => Self::Other(db.message().to_owned()),
            },
            other => Self::Other(other.to_string()),
        }
    }

    /// Flash text shown when a write to `model_id` fails with this violation
    #[must_use]
    pub fn user_message(&self, model_id: &str) -> String {
        match self {
            Self::Unique => format!("{} with such id already exists", capitalize(model_id)),
            other => other.to_string(),
        }
    }

    /// Whether the write failed because of a foreign key
    #[must_use]
    pub const fn is_foreign_key(&self) -> bool {
        matches!(self, Self::ForeignKey(_))
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unique => write!(f, "UNIQUE constraint failed"),
            Self::ForeignKey(message) | Self::Check(message) | Self::Other(message) => {
                f.write_str(message)
            }
            Self::NotNull { column } => write!(f, "Field {column} cannot be null"),
        }
    }
}

/// Pull the column name out of a not-null violation message.
///
/// Understands `NOT NULL constraint failed: users.email` and
/// `null value in column "email" of relation "users" violates not-null constraint`.
/// Falls back to the whole message when neither shape matches.
#[must_use]
pub fn not_null_column(message: &str) -> String {
    if let Some((_, rest)) = message.split_once("constraint failed:") {
        let qualified = rest.trim();
        return qualified
            .rsplit_once('.')
            .map_or(qualified, |(_, column)| column)
            .to_owned();
    }
    if let Some((_, rest)) = message.split_once("column") {
        let column = rest.split("violates").next().unwrap_or(rest);
        let column = column.split(" of relation").next().unwrap_or(column);
        return column.trim().trim_matches('"').to_owned();
    }
    message.to_owned()
}
