// ABOUTME: Session token issuing and validation for admin panel users
// ABOUTME: HS256 JWTs carrying the admin username, plus constant-time credential checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Admin Authentication
//!
//! Administrators log in with credentials from [`AdminConfig::admin_users`] and
//! receive a signed token. HTML pages carry it in an `HttpOnly` cookie, the JSON
//! API as a `Bearer` header. Both are checked by
//! [`crate::middleware::auth::require_token`].

use crate::config::{AdminConfig, AdminCredentials};
use crate::constants::auth::{GENERATED_SECRET_LEN, TOKEN_AUDIENCE};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Claims of an admin session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Admin username
    pub sub: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
    /// Always the crud-admin audience
    pub aud: String,
}

/// Issues and validates admin session tokens
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthManager")
            .field("expiry_hours", &self.expiry_hours)
            .finish_non_exhaustive()
    }
}

impl AuthManager {
    /// Create a manager signing with `secret`
    #[must_use]
    pub fn new(secret: &str, expiry_hours: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours: i64::try_from(expiry_hours).unwrap_or(i64::MAX / 3600),
        }
    }

    /// Create a manager from the panel configuration
    #[must_use]
    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_expiry_hours)
    }

    /// Issue a token for `username`
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails
    pub fn generate_token(&self, username: &str) -> AppResult<String> {
        self.issue(username, Utc::now())
    }

    fn issue(&self, username: &str, issued_at: DateTime<Utc>) -> AppResult<String> {
        let claims = Claims {
            sub: username.to_owned(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::hours(self.expiry_hours)).timestamp(),
            aud: TOKEN_AUDIENCE.to_owned(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate admin JWT: {e}")))
    }

    /// Validate a token and return its claims
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` for expired tokens and `AuthInvalid` for anything else
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::auth_expired(),
                _ => AppError::auth_invalid(format!("Admin token validation failed: {e}")),
            })
    }
}

/// Check a login against the configured admin users.
///
/// Every configured user is compared so the time taken does not reveal which
/// usernames exist.
#[must_use]
pub fn authenticate(config: &AdminConfig, username: &str, password: &str) -> bool {
    config
        .admin_users
        .iter()
        .fold(false, |found, user| credentials_match(user, username, password) || found)
}

fn credentials_match(user: &AdminCredentials, username: &str, password: &str) -> bool {
    let name_ok: bool = user.username.as_bytes().ct_eq(username.as_bytes()).into();
    let password_ok = if user.password.starts_with("$2") {
        bcrypt::verify(password, &user.password).unwrap_or(false)
    } else {
        user.password.as_bytes().ct_eq(password.as_bytes()).into()
    };
    name_ok && password_ok
}

/// Generate a random signing secret
#[must_use]
pub fn generate_jwt_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}
