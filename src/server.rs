// ABOUTME: Admin panel assembly: metadata extraction, router mounting, and the standalone server
// ABOUTME: Wraps the panel router with request ids, tracing spans, and the upload body limit
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Admin Panel Server
//!
//! [`AdminPanel::new`] validates the configuration, creates the history table,
//! and reads the schema of every model once. The resulting router can be
//! merged into a host application with [`add_admin_panel`] or served on its
//! own with [`run_server`].

use crate::config::{AdminConfig, ServerConfig};
use crate::constants::defaults::MAX_UPLOAD_BYTES;
use crate::context::AdminContext;
use crate::database::Database;
use crate::errors::AppResult;
use crate::middleware::{make_request_span, record_response, request_id_middleware};
use crate::routes::AdminRoutes;
use crate::schema::extract_models_metadata;
use anyhow::Context as _;
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    response::Redirect,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// A configured admin panel, ready to be mounted
#[derive(Debug, Clone)]
pub struct AdminPanel {
    ctx: AdminContext,
}

impl AdminPanel {
    /// Prepare a panel for `models`; an empty list exposes every table
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the history table cannot
    /// be created, or a declared model has no table
    pub async fn new(database: Database, models: &[String], config: AdminConfig) -> AppResult<Self> {
        config.validate()?;
        let database = database.with_history_table(config.history_table_name.clone());
        database.migrate().await?;

        let model_ids = if models.is_empty() {
            database.list_tables().await?
        } else {
            models.to_vec()
        };
        let registry = extract_models_metadata(&database, &model_ids).await?;
        if registry.is_empty() {
            warn!("Admin panel has no models to display");
        }
        info!(
            route = %config.route,
            models = registry.len(),
            debug = config.debug,
            "Admin panel initialised"
        );

        Ok(Self {
            ctx: AdminContext::new(database, registry, config),
        })
    }

    /// Shared state of the panel
    #[must_use]
    pub const fn context(&self) -> &AdminContext {
        &self.ctx
    }

    /// Panel router mounted under its configured route
    #[must_use]
    pub fn router(&self) -> Router {
        let routes = AdminRoutes::routes(self.ctx.clone());
        let mounted = match self.ctx.config.base() {
            "" => routes,
            base => Router::new().nest(base, routes),
        };

        mounted
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
            .layer(from_fn(request_id_middleware))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(make_request_span::<Body>)
                    .on_response(record_response::<Body>),
            )
    }
}

/// Mount an admin panel into a host application
///
/// # Errors
///
/// Returns an error if the panel cannot be prepared, see [`AdminPanel::new`]
pub async fn add_admin_panel(
    app: Router,
    database: Database,
    models: &[String],
    config: AdminConfig,
) -> AppResult<Router> {
    let panel = AdminPanel::new(database, models, config).await?;
    Ok(app.merge(panel.router()))
}

/// Router of the standalone server: the panel plus a redirect from `/`
#[must_use]
pub fn standalone_app(panel: &AdminPanel) -> Router {
    let router = panel.router();
    let route = panel.context().config.route.clone();
    if route == "/" {
        return router;
    }
    router.route(
        "/",
        get(move || {
            let route = route.clone();
            async move { Redirect::to(&route) }
        }),
    )
}

/// Serve the admin panel until Ctrl-C
///
/// # Errors
///
/// Returns an error if the database, panel, or listener cannot be set up
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    info!("{}", config.summary());

    let database = Database::new(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;
    let panel = AdminPanel::new(database, &config.models, config.admin.clone())
        .await
        .context("Failed to initialise admin panel")?;
    let app = standalone_app(&panel);

    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    info!(
        "Admin panel listening on http://{bind_addr}{}",
        config.admin.route
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Admin panel stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
