// ABOUTME: Panel-wide pages: model index, change history, presets, and database reset
// ABOUTME: Preset loading and reset are recorded as global history entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::{page_context, with_history};
use crate::context::AdminContext;
use crate::errors::AppError;
use crate::flash::Flashes;
use crate::logging::AppLogger;
use crate::middleware::{AdminUser, HistoryAction};
use crate::presets::{apply_preset, find_preset, load_presets, PresetOptions, PresetReport};
use crate::views::{history_page, index_page, presets_page};
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use serde::Deserialize;
use tracing::warn;

/// History view filter
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Only show changes to this model; empty means all
    pub model: Option<String>,
}

/// Preset load form
#[derive(Debug, Deserialize)]
pub struct PresetForm {
    /// Preset to load
    pub preset_id: String,
    /// Clear every model before loading
    pub with_db: Option<String>,
}

/// Index, history, presets routes
pub struct PageRoutes;

impl PageRoutes {
    /// Create the panel-wide routes
    pub fn routes() -> Router<AdminContext> {
        Router::new()
            .route("/", get(Self::handle_index))
            .route("/history", get(Self::handle_history))
            .route(
                "/presets",
                get(Self::handle_presets).post(Self::handle_load_preset),
            )
            .route("/init_db", post(Self::handle_init_db))
    }

    async fn handle_index(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
    ) -> Result<Response, AppError> {
        let mut counts = Vec::with_capacity(ctx.registry.len());
        for details in ctx.registry.iter() {
            let count = ctx.database.count_rows(details, None).await?;
            counts.push((details.model_id.clone(), count));
        }
        let html = index_page(page_context(&ctx, &user), &Flashes::new(), &counts);
        Ok(Html(html).into_response())
    }

    async fn handle_history(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
        Query(query): Query<HistoryQuery>,
    ) -> Result<Response, AppError> {
        let model = query.model.as_deref().filter(|m| !m.is_empty());
        let entries = ctx
            .database
            .list_history(model, ctx.config.history_page_size)
            .await?;
        let html = history_page(page_context(&ctx, &user), &Flashes::new(), &entries, model);
        Ok(Html(html).into_response())
    }

    async fn handle_presets(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
    ) -> Result<Response, AppError> {
        presets_response(&ctx, &user, &Flashes::new()).await
    }

    async fn handle_load_preset(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
        Form(form): Form<PresetForm>,
    ) -> Result<Response, AppError> {
        let options = PresetOptions {
            with_drop: form.with_db.as_deref().is_some_and(is_checked),
            hash_method: ctx.config.hash_method,
            update_existing: ctx.config.csv_update_existing,
        };

        let mut flashes = Flashes::new();
        let mut history = None;
        let outcome = match find_preset(&ctx.config.presets_folder, &form.preset_id).await {
            Ok(preset) => apply_preset(&ctx.database, &ctx.registry, &preset, options).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(report) => {
                let message = preset_summary(&report, options.with_drop);
                AppLogger::log_admin_change(user.name(), "*", "preset", &report.preset_id);
                for (_, model_report) in &report.models {
                    for error in &model_report.errors {
                        flashes.error(error);
                    }
                }
                history = Some(HistoryAction::global(&message));
                flashes.success(message);
            }
            Err(e) => {
                warn!(preset = %form.preset_id, "Preset load failed: {}", e.message);
                flashes.error(e.message);
            }
        }

        let response = presets_response(&ctx, &user, &flashes).await?;
        Ok(with_history(response, history))
    }

    async fn handle_init_db(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
    ) -> Result<Response, AppError> {
        let mut flashes = Flashes::new();
        let mut history = None;
        match ctx.database.clear_all(&ctx.registry).await {
            Ok(deleted) => {
                let message = format!(
                    "All data was deleted: {deleted} rows from {} models",
                    ctx.registry.len()
                );
                AppLogger::log_admin_change(user.name(), "*", "init_db", "*");
                history = Some(HistoryAction::global(&message));
                flashes.success(message);
            }
            Err(e) => {
                warn!("Database reset failed: {e}");
                flashes.error(format!("Database reset failed: {e}"));
            }
        }

        let response = presets_response(&ctx, &user, &flashes).await?;
        Ok(with_history(response, history))
    }
}

async fn presets_response(
    ctx: &AdminContext,
    user: &AdminUser,
    flashes: &Flashes,
) -> Result<Response, AppError> {
    let presets = load_presets(&ctx.config.presets_folder).await?;
    let html = presets_page(page_context(ctx, user), flashes, &presets);
    Ok(Html(html).into_response())
}

fn is_checked(value: &str) -> bool {
    matches!(value, "true" | "on" | "1")
}

/// One-line description of a loaded preset
pub(crate) fn preset_summary(report: &PresetReport, with_drop: bool) -> String {
    let loaded = report
        .models
        .iter()
        .map(|(model_id, r)| format!("{model_id} ({} added, {} updated)", r.inserted, r.updated))
        .collect::<Vec<_>>()
        .join(", ");
    let failed: usize = report.models.iter().map(|(_, r)| r.errors.len()).sum();
    format!(
        "Preset {} was loaded{}: {loaded}; {failed} rows failed",
        report.preset_id,
        if with_drop { " into a cleared database" } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_import::UploadReport;

    #[test]
    fn test_preset_summary_lists_models_in_load_order() {
        let report = PresetReport {
            preset_id: "demo".into(),
            models: vec![
                (
                    "users".into(),
                    UploadReport {
                        inserted: 2,
                        updated: 0,
                        errors: vec![],
                    },
                ),
                (
                    "posts".into(),
                    UploadReport {
                        inserted: 1,
                        updated: 1,
                        errors: vec!["line 3: bad".into()],
                    },
                ),
            ],
        };
        assert_eq!(
            preset_summary(&report, true),
            "Preset demo was loaded into a cleared database: users (2 added, 0 updated), posts (1 added, 1 updated); 1 rows failed"
        );
    }

    #[test]
    fn test_checkbox_values() {
        assert!(is_checked("true"));
        assert!(is_checked("on"));
        assert!(!is_checked("false"));
    }
}
