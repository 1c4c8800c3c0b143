// ABOUTME: Environment configuration management for the standalone admin server
// ABOUTME: Handles environment variables, deployment modes, and runtime configuration parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Environment-based configuration management

use crate::constants::defaults;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::info;

use super::panel::AdminConfig;

/// Deployment environment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is a development environment
    #[must_use]
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Configuration of the standalone admin server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
    /// sqlx connection URL
    pub database_url: String,
    /// Tables exposed in the panel; empty means every table
    pub models: Vec<String>,
    /// Deployment environment
    pub environment: Environment,
    /// Panel settings
    pub admin: AdminConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but malformed
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");

        let environment = Environment::from_str_or_default(
            &env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        );

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| defaults::HOST.into()),
            port: env_parse("HTTP_PORT", defaults::HTTP_PORT)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| defaults::DATABASE_URL.into()),
            models: env::var("ADMIN_MODELS")
                .map(|value| parse_model_list(&value))
                .unwrap_or_default(),
            admin: AdminConfig::from_env(&environment)?,
            environment,
        })
    }

    /// One-line summary for startup logs, without secrets
    #[must_use]
    pub fn summary(&self) -> String {
        let models = if self.models.is_empty() {
            "all tables".to_owned()
        } else {
            self.models.join(", ")
        };
        format!(
            "crud-admin config: environment={}, listen={}:{}, route={}, models=[{models}], debug={}, hash={}",
            self.environment,
            self.host,
            self.port,
            self.admin.route,
            self.admin.debug,
            self.admin.hash_method,
        )
    }
}

/// Split a comma separated model list, dropping blanks
#[must_use]
pub fn parse_model_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Read an environment variable and parse it, falling back to `default` when absent
///
/// # Errors
///
/// Returns a config error if the variable is set but does not parse
pub(crate) fn env_parse<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {key} value '{value}': {e}"))),
        Err(_) => Ok(default),
    }
}

/// Read a boolean flag (`1`, `true`, `yes`, `on`)
pub(crate) fn env_flag(key: &str, default: bool) -> bool {
    env::var(key).map_or(default, |v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::from_str_or_default("prod"), Environment::Production);
        assert_eq!(Environment::from_str_or_default("TEST"), Environment::Testing);
        assert_eq!(Environment::from_str_or_default("bogus"), Environment::Development);
    }

    #[test]
    fn test_parse_model_list() {
        assert_eq!(
            parse_model_list(" users, posts,,tags "),
            vec!["users".to_owned(), "posts".to_owned(), "tags".to_owned()]
        );
        assert!(parse_model_list("").is_empty());
    }
}
