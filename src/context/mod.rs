// ABOUTME: Shared state handed to every admin handler and middleware
// ABOUTME: Bundles the database, model registry, panel config, and token manager
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Admin request context.
//!
//! Cloned into each request by axum, so every field is cheap to clone.

use crate::auth::AuthManager;
use crate::config::AdminConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::schema::{ModelRegistry, TableDetails};
use std::sync::Arc;

/// State of a mounted admin panel
#[derive(Clone, Debug)]
pub struct AdminContext {
    /// Database holding the registered models and the history table
    pub database: Database,
    /// Models shown in the panel
    pub registry: Arc<ModelRegistry>,
    /// Panel configuration
    pub config: Arc<AdminConfig>,
    /// Session token manager
    pub auth_manager: Arc<AuthManager>,
}

impl AdminContext {
    /// Build a context
    #[must_use]
    pub fn new(database: Database, registry: ModelRegistry, config: AdminConfig) -> Self {
        let auth_manager = AuthManager::from_config(&config);
        Self {
            database,
            registry: Arc::new(registry),
            config: Arc::new(config),
            auth_manager: Arc::new(auth_manager),
        }
    }

    /// Details of a registered model
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for unknown models
    pub fn model(&self, model_id: &str) -> AppResult<&TableDetails> {
        self.registry
            .get(model_id)
            .ok_or_else(|| AppError::not_found(format!("Model {model_id}")))
    }
}
