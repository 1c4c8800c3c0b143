// ABOUTME: Bulk CSV import into a registered model, used by uploads, the API, and presets
// ABOUTME: Each row goes through the same checks as the add form and failures are reported per line
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! CSV import.
//!
//! The header row names columns by display name. A hashed column may also be
//! named by its physical `<name>_hash` column, in which case the value is taken
//! as an existing hash and stored unchanged. Empty cells are left out so column
//! defaults apply.

use crate::database::{ConstraintViolation, Database};
use crate::errors::{AppError, AppResult};
use crate::hashing::HashMethod;
use crate::utils::{correct_types, get_obj_id_from_row, not_filled, reverse_hash_names, Params};
use crud_admin_core::models::TableDetails;
use serde::Serialize;
use std::io::Read;
use tracing::{debug, info};

/// Outcome of one CSV import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    /// Rows inserted
    pub inserted: usize,
    /// Existing rows updated
    pub updated: usize,
    /// `line N: message` for every rejected row
    pub errors: Vec<String>,
}

impl UploadReport {
    /// Whether every row was imported
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// One-line summary for flash messages and history
    #[must_use]
    pub fn summary(&self, model_id: &str) -> String {
        format!(
            "Upload into {model_id}: {} added, {} updated, {} failed",
            self.inserted,
            self.updated,
            self.errors.len()
        )
    }
}

/// Parse CSV text into one parameter map per data row, tagged with its line number
///
/// # Errors
///
/// Returns `InvalidFormat` if the CSV is malformed
pub fn parse_csv<R: Read>(reader: R) -> AppResult<Vec<(u64, Params)>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| AppError::invalid_input(format!("Invalid CSV header: {e}")))?
        .clone();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| AppError::invalid_input(format!("Invalid CSV: {e}")))?;
        let line = record.position().map_or(0, csv::Position::line);
        let params = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(header, value)| (header.to_owned(), value.to_owned()))
            .collect();
        rows.push((line, params));
    }
    Ok(rows)
}

/// Import CSV rows into a model.
///
/// With `update_existing`, a row whose identity already exists updates that row
/// instead of being rejected.
///
/// # Errors
///
/// Returns an error if the CSV itself cannot be parsed. Row-level failures are
/// collected in the report.
pub async fn upload_csv<R: Read>(
    database: &Database,
    details: &TableDetails,
    reader: R,
    hash_method: HashMethod,
    update_existing: bool,
) -> AppResult<UploadReport> {
    let rows = parse_csv(reader)?;
    let mut report = UploadReport::default();

    for (line, params) in rows {
        match import_row(database, details, params, hash_method, update_existing).await {
            Ok(RowOutcome::Inserted) => report.inserted += 1,
            Ok(RowOutcome::Updated) => report.updated += 1,
            Err(message) => {
                debug!(model = %details.model_id, line, "CSV row rejected: {message}");
                report.errors.push(format!("line {line}: {message}"));
            }
        }
    }

    info!(
        model = %details.model_id,
        inserted = report.inserted,
        updated = report.updated,
        failed = report.errors.len(),
        "CSV import finished"
    );
    Ok(report)
}

enum RowOutcome {
    Inserted,
    Updated,
}

async fn import_row(
    database: &Database,
    details: &TableDetails,
    params: Params,
    hash_method: HashMethod,
    update_existing: bool,
) -> Result<RowOutcome, String> {
    let missing = not_filled(details, &params);
    if !missing.is_empty() {
        return Err(format!("Fields {missing:?} required. Please fill it"));
    }

    let params = reverse_hash_names(details, params, hash_method).map_err(|e| e.message)?;
    let row = correct_types(&params, details).map_err(|e| e.to_string())?;

    match database.insert_row(details, &row).await {
        Ok(_) => Ok(RowOutcome::Inserted),
        Err(e) => {
            let violation = ConstraintViolation::classify(&e);
            if update_existing && violation == ConstraintViolation::Unique {
                let object_id = get_obj_id_from_row(details, &row);
                match database.update_row(details, &object_id, &row).await {
                    Ok(affected) if affected > 0 => return Ok(RowOutcome::Updated),
                    Ok(_) => {}
                    Err(e) => {
                        return Err(ConstraintViolation::classify(&e).user_message(&details.model_id))
                    }
                }
            }
            Err(violation.user_message(&details.model_id))
        }
    }
}
