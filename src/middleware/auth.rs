// ABOUTME: Token gate for admin pages and the admin JSON API
// ABOUTME: Accepts the session cookie or a Bearer header and injects the authenticated admin user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::constants::{auth::SESSION_COOKIE, defaults::DEBUG_USER};
use crate::context::AdminContext;
use crate::errors::{AppError, AppResult};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use tracing::{debug, warn};

/// Authenticated admin, available to handlers as an extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser(pub String);

impl AdminUser {
    /// Username
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Gate for HTML pages: unauthenticated requests are redirected to the login page
pub async fn require_token(
    State(ctx): State<AdminContext>,
    mut req: Request,
    next: Next,
) -> Response {
    match authorize(&ctx, req.headers()) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(e) => {
            debug!(path = %req.uri().path(), "Redirecting to login: {}", e.message);
            Redirect::to(&ctx.config.login_path()).into_response()
        }
    }
}

/// Gate for the JSON API: unauthenticated requests get a 401 error body
pub async fn require_api_token(
    State(ctx): State<AdminContext>,
    mut req: Request,
    next: Next,
) -> Response {
    match authorize(&ctx, req.headers()) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(e) => {
            warn!(path = %req.uri().path(), "Rejected admin API request: {}", e.message);
            e.into_response()
        }
    }
}

fn authorize(ctx: &AdminContext, headers: &HeaderMap) -> AppResult<AdminUser> {
    if ctx.config.debug {
        return Ok(AdminUser(DEBUG_USER.to_owned()));
    }

    let token = headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_owned())
        .or_else(|| {
            CookieJar::from_headers(headers)
                .get(SESSION_COOKIE)
                .map(|cookie| cookie.value().to_owned())
        })
        .ok_or_else(AppError::auth_required)?;

    let claims = ctx.auth_manager.validate_token(&token)?;
    tracing::Span::current().record("user", claims.sub.as_str());
    Ok(AdminUser(claims.sub))
}
