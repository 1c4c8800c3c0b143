// ABOUTME: Route module organization for the admin panel HTTP surface
// ABOUTME: Composes public, page, and API routers and applies the auth and history gates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Admin panel routes
//!
//! Routes are relative to the panel mount point and organized by domain:
//! - `auth`: login form, logout
//! - `models`: table view, add, edit, delete, delete all, CSV upload
//! - `pages`: index, history, presets, database reset
//! - `api`: token-authenticated JSON endpoints
//! - `health`: unauthenticated liveness check

/// JSON API for scripts
pub mod api;
/// Login and logout
pub mod auth;
/// Health check
pub mod health;
/// Per-model CRUD pages
pub mod models;
/// Index, history, presets
pub mod pages;

pub use api::ApiRoutes;
pub use auth::AuthRoutes;
pub use health::HealthRoutes;
pub use models::ModelRoutes;
pub use pages::PageRoutes;

use crate::context::AdminContext;
use crate::flash::Flashes;
use crate::middleware::{record_history, require_api_token, require_token, AdminUser, HistoryAction};
use crate::views::{layout, PageContext};
use axum::{
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{Html, IntoResponse, Response},
    Router,
};

/// Every route of a mounted admin panel
pub struct AdminRoutes;

impl AdminRoutes {
    /// Build the panel router, relative to its mount point
    ///
    /// Page and API routes require a session token unless the panel runs in
    /// debug mode. Successful changes are written to the history table.
    pub fn routes(ctx: AdminContext) -> Router {
        let pages = ModelRoutes::routes()
            .merge(PageRoutes::routes())
            .route_layer(from_fn_with_state(ctx.clone(), record_history))
            .route_layer(from_fn_with_state(ctx.clone(), require_token));

        let api = ApiRoutes::protected()
            .route_layer(from_fn_with_state(ctx.clone(), record_history))
            .route_layer(from_fn_with_state(ctx.clone(), require_api_token))
            .merge(ApiRoutes::public());

        Router::new()
            .merge(AuthRoutes::routes())
            .merge(HealthRoutes::routes())
            .merge(pages)
            .nest("/api", api)
            .with_state(ctx)
    }
}

/// Layout context for the current request
pub(crate) fn page_context<'a>(ctx: &'a AdminContext, user: &'a AdminUser) -> PageContext<'a> {
    PageContext {
        config: &ctx.config,
        registry: &ctx.registry,
        user: user.name(),
    }
}

/// Wrap a body in the layout and turn it into a response
pub(crate) fn render_page(
    ctx: &AdminContext,
    user: &AdminUser,
    title: &str,
    flashes: &Flashes,
    body: &str,
) -> Response {
    Html(layout(title, page_context(ctx, user), flashes, body)).into_response()
}

/// Attach a history action so the history middleware records the change
pub(crate) fn with_history(mut response: Response, action: Option<HistoryAction>) -> Response {
    if let Some(action) = action {
        response.extensions_mut().insert(action);
    }
    response
}

/// HTML response with a non-200 status
pub(crate) fn html_with_status(status: StatusCode, body: String) -> Response {
    (status, Html(body)).into_response()
}
