// ABOUTME: Token-authenticated JSON API for scripts: token issue, CSV upload, reset, presets
// ABOUTME: Mirrors the HTML operations but answers with JSON reports and AppError bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Admin JSON API
//!
//! `POST /api/auth` exchanges admin credentials for a bearer token. Every other
//! endpoint requires `Authorization: Bearer <token>`.

use super::{pages::preset_summary, with_history};
use crate::auth::authenticate;
use crate::context::AdminContext;
use crate::csv_import::{upload_csv, UploadReport};
use crate::errors::AppError;
use crate::logging::AppLogger;
use crate::middleware::{AdminUser, HistoryAction};
use crate::presets::{apply_preset, find_preset, PresetOptions, PresetReport};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

/// Credentials for a token
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    /// Admin username
    pub username: String,
    /// Admin password
    pub password: String,
}

/// Issued bearer token
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed session token
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

/// Options of the upload endpoint
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    /// Update rows whose identity already exists
    pub update_existing: Option<bool>,
}

/// Options of the preset endpoint
#[derive(Debug, Default, Deserialize)]
pub struct PresetQuery {
    /// Clear every model before loading
    pub with_db: Option<bool>,
}

/// Result of a database reset
#[derive(Debug, Serialize, Deserialize)]
pub struct DropResponse {
    /// Rows deleted across all models
    pub deleted: u64,
    /// Models cleared
    pub models: usize,
}

/// JSON API routes
pub struct ApiRoutes;

impl ApiRoutes {
    /// Routes reachable without a token
    pub fn public() -> Router<AdminContext> {
        Router::new().route("/auth", post(Self::handle_auth))
    }

    /// Routes that require a bearer token
    pub fn protected() -> Router<AdminContext> {
        Router::new()
            .route("/upload_csv/:model_id", post(Self::handle_upload_csv))
            .route("/drop_db", post(Self::handle_drop_db))
            .route("/presets/:preset_id", post(Self::handle_load_preset))
    }

    async fn handle_auth(
        State(ctx): State<AdminContext>,
        Json(request): Json<TokenRequest>,
    ) -> Result<Json<TokenResponse>, AppError> {
        if !authenticate(&ctx.config, &request.username, &request.password) {
            AppLogger::log_auth_event(&request.username, "api_token", false);
            return Err(AppError::auth_invalid("Wrong username or password"));
        }
        let access_token = ctx.auth_manager.generate_token(&request.username)?;
        AppLogger::log_auth_event(&request.username, "api_token", true);

        Ok(Json(TokenResponse {
            access_token,
            token_type: "Bearer".to_owned(),
            expires_in: ctx.config.token_expiry_hours.saturating_mul(3600),
        }))
    }

    async fn handle_upload_csv(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
        Path(model_id): Path<String>,
        Query(query): Query<UploadQuery>,
        body: String,
    ) -> Result<Response, AppError> {
        let details = ctx.model(&model_id)?;
        let report: UploadReport = upload_csv(
            &ctx.database,
            details,
            body.as_bytes(),
            ctx.config.hash_method,
            query.update_existing.unwrap_or(ctx.config.csv_update_existing),
        )
        .await?;

        let history = (report.inserted + report.updated > 0).then(|| {
            AppLogger::log_admin_change(user.name(), &model_id, "upload", &model_id);
            HistoryAction::for_model(&model_id, report.summary(&model_id), &model_id)
        });
        Ok(with_history(Json(report).into_response(), history))
    }

    async fn handle_drop_db(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
    ) -> Result<Response, AppError> {
        let deleted = ctx.database.clear_all(&ctx.registry).await?;
        let models = ctx.registry.len();
        AppLogger::log_admin_change(user.name(), "*", "drop_db", "*");

        let history = HistoryAction::global(format!(
            "All data was deleted: {deleted} rows from {models} models"
        ));
        Ok(with_history(
            Json(DropResponse { deleted, models }).into_response(),
            Some(history),
        ))
    }

    async fn handle_load_preset(
        State(ctx): State<AdminContext>,
        Extension(user): Extension<AdminUser>,
        Path(preset_id): Path<String>,
        Query(query): Query<PresetQuery>,
    ) -> Result<Response, AppError> {
        let options = PresetOptions {
            with_drop: query.with_db.unwrap_or(false),
            hash_method: ctx.config.hash_method,
            update_existing: ctx.config.csv_update_existing,
        };
        let preset = find_preset(&ctx.config.presets_folder, &preset_id).await?;
        let report: PresetReport = apply_preset(&ctx.database, &ctx.registry, &preset, options).await?;
        AppLogger::log_admin_change(user.name(), "*", "preset", &preset_id);

        let history = HistoryAction::global(preset_summary(&report, options.with_drop));
        Ok(with_history(Json(report).into_response(), Some(history)))
    }
}
