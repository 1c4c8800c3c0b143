// ABOUTME: Admin panel settings: route prefix, admin users, hashing, paging, presets
// ABOUTME: Loaded from ADMIN_* environment variables and validated before the panel starts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Admin panel configuration.

use crate::auth::generate_jwt_secret;
use crate::constants::defaults;
use crate::errors::{AppError, AppResult};
use crate::hashing::HashMethod;
use std::env;
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

use super::environment::{env_flag, env_parse, Environment};

/// Login credentials of a panel administrator
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    /// Login name
    pub username: String,
    /// Plain password, or a bcrypt hash (`$2...`)
    pub password: String,
}

impl AdminCredentials {
    /// Create credentials
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Admin panel configuration
#[derive(Clone)]
pub struct AdminConfig {
    /// Title shown in the panel header
    pub name: String,
    /// URL prefix, starts with `/` and has no trailing slash
    pub route: String,
    /// Folder scanned for preset YAML files
    pub presets_folder: PathBuf,
    /// Hash function for `_hash` columns
    pub hash_method: HashMethod,
    /// Skip authentication entirely
    pub debug: bool,
    /// Accounts allowed to log in
    pub admin_users: Vec<AdminCredentials>,
    /// HS256 signing secret for session tokens
    pub jwt_secret: String,
    /// Session token lifetime
    pub token_expiry_hours: u64,
    /// Rows per page in table views
    pub page_size: u32,
    /// Rows per page in the history view
    pub history_page_size: u32,
    /// CSV rows whose identity already exists update the row instead of failing
    pub csv_update_existing: bool,
    /// Table storing the change history
    pub history_table_name: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            name: defaults::PANEL_NAME.to_owned(),
            route: defaults::ROUTE.to_owned(),
            presets_folder: PathBuf::from(defaults::PRESETS_FOLDER),
            hash_method: HashMethod::default(),
            debug: false,
            admin_users: Vec::new(),
            jwt_secret: generate_jwt_secret(),
            token_expiry_hours: defaults::TOKEN_EXPIRY_HOURS,
            page_size: defaults::PAGE_SIZE,
            history_page_size: defaults::HISTORY_PAGE_SIZE,
            csv_update_existing: false,
            history_table_name: defaults::HISTORY_TABLE.to_owned(),
        }
    }
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("name", &self.name)
            .field("route", &self.route)
            .field("presets_folder", &self.presets_folder)
            .field("hash_method", &self.hash_method)
            .field("debug", &self.debug)
            .field("admin_users", &self.admin_users)
            .field("jwt_secret", &"[REDACTED]")
            .field("token_expiry_hours", &self.token_expiry_hours)
            .field("page_size", &self.page_size)
            .field("history_page_size", &self.history_page_size)
            .field("csv_update_existing", &self.csv_update_existing)
            .field("history_table_name", &self.history_table_name)
            .finish()
    }
}

impl AdminConfig {
    /// Load panel configuration from `ADMIN_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed
    pub fn from_env(environment: &Environment) -> AppResult<Self> {
        let defaults = Self::default();

        let hash_method = match env::var("ADMIN_HASH_METHOD") {
            Ok(value) => value.parse()?,
            Err(_) => match env::var("ADMIN_CUSTOM_HASH_METHOD") {
                Ok(value) => {
                    warn!(
                        "ADMIN_CUSTOM_HASH_METHOD is deprecated and will be removed, use ADMIN_HASH_METHOD instead"
                    );
                    value.parse()?
                }
                Err(_) => defaults.hash_method,
            },
        };

        let debug = env_flag("ADMIN_DEBUG", false);

        let admin_users = match (env::var("ADMIN_USER"), env::var("ADMIN_PASSWORD")) {
            (Ok(user), Ok(password)) => vec![AdminCredentials::new(user, password)],
            (Ok(_), Err(_)) | (Err(_), Ok(_)) => {
                return Err(AppError::config(
                    "ADMIN_USER and ADMIN_PASSWORD must be set together",
                ))
            }
            (Err(_), Err(_)) if debug || environment.is_development() => {
                warn!(
                    "No ADMIN_USER configured, using the development account '{}'",
                    defaults::DEV_ADMIN_USER
                );
                vec![AdminCredentials::new(
                    defaults::DEV_ADMIN_USER,
                    defaults::DEV_ADMIN_PASSWORD,
                )]
            }
            (Err(_), Err(_)) => Vec::new(),
        };

        let jwt_secret = env::var("ADMIN_JWT_SECRET").unwrap_or_else(|_| {
            warn!("ADMIN_JWT_SECRET not set, sessions will not survive a restart");
            defaults.jwt_secret.clone()
        });

        Ok(Self {
            name: env::var("ADMIN_PANEL_NAME").unwrap_or(defaults.name),
            route: env::var("ADMIN_ROUTE").unwrap_or(defaults.route),
            presets_folder: env::var("ADMIN_PRESETS_FOLDER")
                .map_or(defaults.presets_folder, PathBuf::from),
            hash_method,
            debug,
            admin_users,
            jwt_secret,
            token_expiry_hours: env_parse("ADMIN_TOKEN_EXPIRY_HOURS", defaults.token_expiry_hours)?,
            page_size: env_parse("ADMIN_PAGE_SIZE", defaults.page_size)?,
            history_page_size: env_parse("ADMIN_HISTORY_PAGE_SIZE", defaults.history_page_size)?,
            csv_update_existing: env_flag("ADMIN_CSV_UPDATE_EXISTING", false),
            history_table_name: env::var("ADMIN_HISTORY_TABLE")
                .unwrap_or(defaults.history_table_name),
        })
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns a `ConfigInvalid` error describing the first problem found
    pub fn validate(&self) -> AppResult<()> {
        let problem = if !self.route.starts_with('/') {
            Some(format!("route '{}' must start with '/'", self.route))
        } else if self.route.len() > 1 && self.route.ends_with('/') {
            Some(format!("route '{}' must not end with '/'", self.route))
        } else if self.page_size == 0 || self.history_page_size == 0 {
            Some("page sizes must be greater than zero".to_owned())
        } else if self.token_expiry_hours == 0 {
            Some("token expiry must be greater than zero".to_owned())
        } else if self.jwt_secret.is_empty() {
            Some("JWT secret must not be empty".to_owned())
        } else if self.admin_users.is_empty() && !self.debug {
            Some("at least one admin user is required unless debug is enabled".to_owned())
        } else if !is_identifier(&self.history_table_name) {
            Some(format!(
                "history table name '{}' is not a valid identifier",
                self.history_table_name
            ))
        } else {
            None
        };

        problem.map_or(Ok(()), |problem| {
            Err(AppError::config(format!(
                "Error during admin panel initialisation. Wrong config parameters: {problem}"
            )))
        })
    }

    /// Route prefix usable for joining, empty when mounted at `/`
    #[must_use]
    pub fn base(&self) -> &str {
        if self.route == "/" {
            ""
        } else {
            &self.route
        }
    }

    /// Absolute path of a page inside the panel
    #[must_use]
    pub fn path(&self, suffix: &str) -> String {
        format!("{}/{}", self.base(), suffix.trim_start_matches('/'))
    }

    /// Path of the login page
    #[must_use]
    pub fn login_path(&self) -> String {
        self.path("login")
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}
