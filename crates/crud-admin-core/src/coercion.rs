// ABOUTME: Converts raw form strings into typed cell values using column metadata
// ABOUTME: Handles nulls, numbers, booleans, dates, JSON, and declared text lengths
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Form value coercion.
//!
//! HTML forms and CSV files only carry strings. Before a value reaches the
//! database it is converted into a [`FieldValue`] according to the column's
//! [`ColumnType`]. An empty string, or the literal `None` the edit form renders
//! for NULL cells, always becomes [`FieldValue::Null`]; whether NULL is allowed is
//! left to the database so the constraint error can be reported verbatim.

use crate::constants::columns::NONE_LITERAL;
use crate::errors::{AppError, ErrorCode};
use crate::models::{ColumnData, ColumnType, FieldValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Raised when a form value cannot be converted to its column's type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// Value does not parse as the column's type
    #[error("invalid value '{value}' for column {column}: expected {expected}")]
    InvalidValue {
        /// Column display name
        column: String,
        /// Offending raw value
        value: String,
        /// Human readable type name
        expected: &'static str,
    },
    /// Text is longer than the declared column length
    #[error("value too long for type character varying({len}) in column {column}")]
    TooLong {
        /// Column display name
        column: String,
        /// Declared length
        len: usize,
    },
}

impl From<CoercionError> for AppError {
    fn from(error: CoercionError) -> Self {
        Self::new(ErrorCode::InvalidFormat, error.to_string())
    }
}

const DATETIME_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_INPUT_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

/// Coerce a raw form value into a cell value for `column`.
///
/// # Errors
///
/// Returns [`CoercionError`] if the value does not parse as the column's type or
/// exceeds the declared text length.
pub fn coerce(raw: &str, column: &ColumnData) -> Result<FieldValue, CoercionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || raw == NONE_LITERAL {
        return Ok(FieldValue::Null);
    }

    let invalid = |expected: &'static str| CoercionError::InvalidValue {
        column: column.name.clone(),
        value: raw.to_owned(),
        expected,
    };

    match column.column_type {
        ColumnType::Integer => trimmed
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| invalid("integer")),
        ColumnType::Float | ColumnType::Decimal => trimmed
            .parse::<f64>()
            .map(FieldValue::Float)
            .map_err(|_| invalid("number")),
        ColumnType::Boolean => parse_bool(trimmed)
            .map(FieldValue::Boolean)
            .ok_or_else(|| invalid("boolean")),
        ColumnType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(FieldValue::Date)
            .map_err(|_| invalid("date (YYYY-MM-DD)")),
        ColumnType::DateTime => parse_datetime(trimmed)
            .map(FieldValue::DateTime)
            .ok_or_else(|| invalid("date-time (YYYY-MM-DD HH:MM:SS)")),
        ColumnType::Time => TIME_INPUT_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
            .map(FieldValue::Time)
            .ok_or_else(|| invalid("time (HH:MM:SS)")),
        ColumnType::Json => serde_json::from_str(trimmed)
            .map(FieldValue::Json)
            .map_err(|_| invalid("JSON")),
        ColumnType::Blob => hex::decode(trimmed)
            .map(FieldValue::Blob)
            .map_err(|_| invalid("hex encoded bytes")),
        ColumnType::Text => {
            if let Some(len) = column.len {
                if raw.chars().count() > len {
                    return Err(CoercionError::TooLong {
                        column: column.name.clone(),
                        len,
                    });
                }
            }
            Ok(FieldValue::Text(raw.to_owned()))
        }
        ColumnType::Hash => Ok(FieldValue::Text(raw.to_owned())),
    }
}

/// Coerce a submitted identity value.
///
/// Identity values name an existing row, so text keeps its exact content: an
/// empty string or the literal `None` is a key like any other, not NULL.
///
/// # Errors
///
/// Returns [`CoercionError`] if a non-text value does not parse as its column's type
pub fn coerce_identity(raw: &str, column: &ColumnData) -> Result<FieldValue, CoercionError> {
    match column.column_type {
        ColumnType::Text | ColumnType::Hash => Ok(FieldValue::Text(raw.to_owned())),
        _ => coerce(raw, column),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Some(true),
        "false" | "0" | "no" | "off" | "f" | "n" => Some(false),
        _ => None,
    }
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}
