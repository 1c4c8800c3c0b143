// ABOUTME: Health check route for monitoring the admin panel
// ABOUTME: Reports liveness and database reachability without authentication
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Health check routes for service monitoring

use crate::context::AdminContext;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health check route
    pub fn routes() -> Router<AdminContext> {
        Router::new().route("/health", get(Self::handle_health))
    }

    async fn handle_health(State(ctx): State<AdminContext>) -> (StatusCode, Json<serde_json::Value>) {
        let database_ok = sqlx::query("SELECT 1")
            .execute(ctx.database.pool())
            .await
            .is_ok();
        let status = if database_ok {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        (
            status,
            Json(serde_json::json!({
                "status": if database_ok { "healthy" } else { "degraded" },
                "database": database_ok,
                "models": ctx.registry.len(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
        )
    }
}
