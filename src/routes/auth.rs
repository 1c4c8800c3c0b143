// ABOUTME: Login and logout routes of the admin panel
// ABOUTME: Issues the session token as an HttpOnly cookie after checking configured credentials
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::html_with_status;
use crate::auth::authenticate;
use crate::constants::auth::SESSION_COOKIE;
use crate::context::AdminContext;
use crate::errors::AppError;
use crate::flash::Flashes;
use crate::logging::AppLogger;
use crate::views::login_page;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

/// Login form fields
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Admin username
    pub username: String,
    /// Admin password
    pub password: String,
}

/// Session routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create the login and logout routes
    pub fn routes() -> Router<AdminContext> {
        Router::new()
            .route("/login", get(Self::handle_login_form).post(Self::handle_login))
            .route("/logout", get(Self::handle_logout))
    }

    async fn handle_login_form(State(ctx): State<AdminContext>) -> Response {
        if ctx.config.debug {
            return Redirect::to(&ctx.config.route).into_response();
        }
        Html(login_page(&ctx.config, &Flashes::new())).into_response()
    }

    async fn handle_login(
        State(ctx): State<AdminContext>,
        jar: CookieJar,
        Form(form): Form<LoginForm>,
    ) -> Result<Response, AppError> {
        if !authenticate(&ctx.config, &form.username, &form.password) {
            AppLogger::log_auth_event(&form.username, "login", false);
            let mut flashes = Flashes::new();
            flashes.error("Wrong username or password");
            return Ok(html_with_status(
                StatusCode::UNAUTHORIZED,
                login_page(&ctx.config, &flashes),
            ));
        }

        let token = ctx.auth_manager.generate_token(&form.username)?;
        AppLogger::log_auth_event(&form.username, "login", true);

        let cookie = Cookie::build((SESSION_COOKIE, token))
            .path(ctx.config.route.clone())
            .http_only(true)
            .same_site(SameSite::Lax);

        Ok((jar.add(cookie), Redirect::to(&ctx.config.route)).into_response())
    }

    async fn handle_logout(State(ctx): State<AdminContext>, jar: CookieJar) -> Response {
        let cookie = Cookie::build(SESSION_COOKIE).path(ctx.config.route.clone());
        (jar.remove(cookie), Redirect::to(&ctx.config.login_path())).into_response()
    }
}
