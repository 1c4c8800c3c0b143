// ABOUTME: Writes a change-history row after a mutating admin request succeeds
// ABOUTME: Handlers describe the change by attaching a HistoryAction to their response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Change history recording.
//!
//! Handlers attach a [`HistoryAction`] to the response extensions when a change
//! actually happened. A failed history write is logged and never turns a
//! successful change into an error.

use super::auth::AdminUser;
use crate::constants::defaults::DEBUG_USER;
use crate::context::AdminContext;
use crate::database::NewHistoryEntry;
use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{error, info};

/// Description of a change made by a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryAction {
    /// Model affected, if any
    pub model_id: Option<String>,
    /// Message shown to the user, stored verbatim
    pub log_message: String,
    /// Identity of the affected object, or the model id for bulk changes
    pub object_id: Option<String>,
}

impl HistoryAction {
    /// Change to one model
    #[must_use]
    pub fn for_model(
        model_id: impl Into<String>,
        log_message: impl Into<String>,
        object_id: impl Into<String>,
    ) -> Self {
        Self {
            model_id: Some(model_id.into()),
            log_message: log_message.into(),
            object_id: Some(object_id.into()),
        }
    }

    /// Change spanning the whole database
    #[must_use]
    pub fn global(log_message: impl Into<String>) -> Self {
        Self {
            model_id: None,
            log_message: log_message.into(),
            object_id: None,
        }
    }
}

/// Record the [`HistoryAction`] a handler attached to its response
pub async fn record_history(
    State(ctx): State<AdminContext>,
    req: Request,
    next: Next,
) -> Response {
    let route = req
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| req.uri().path().to_owned(), |uri| uri.path().to_owned());
    let user = req
        .extensions()
        .get::<AdminUser>()
        .map_or_else(|| DEBUG_USER.to_owned(), |u| u.name().to_owned());

    let response = next.run(req).await;

    if let Some(action) = response.extensions().get::<HistoryAction>() {
        let entry = NewHistoryEntry {
            user,
            route,
            model_id: action.model_id.clone(),
            log_message: action.log_message.clone(),
            object_id: action.object_id.clone(),
        };
        match ctx.database.add_history(&entry).await {
            Ok(id) => info!(
                history_id = id,
                user = %entry.user,
                model = ?entry.model_id,
                "Recorded admin change"
            ),
            Err(e) => error!(user = %entry.user, route = %entry.route, "Failed to record history: {e}"),
        }
    }

    response
}
