// ABOUTME: Logging configuration and structured logging setup for the admin panel
// ABOUTME: Configures log levels, output formats, noise reduction, and admin event helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Structured logging configuration
//!
//! The binary installs a global subscriber through [`init_from_env`]. Handlers
//! report admin activity through [`AppLogger`] so auth events and data changes
//! share one field vocabulary (`user.name`, `admin.model`, `admin.action`).

use crate::constants::service_names;
use anyhow::Result;
use std::env;
use std::io;
use tracing::{info, warn};
use tracing_subscriber::{
    fmt, layer::Layered, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

type FilteredRegistry = Layered<EnvFilter, Registry>;

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// `JSON` lines for log shipping
    Json,
    /// Multi-field human output
    #[default]
    Pretty,
    /// One short line per event
    Compact,
}

impl LogFormat {
    /// Parse `LOG_FORMAT`, falling back to pretty output
    #[must_use]
    pub fn from_str_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level for the panel's own events (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Log every generated SQL statement
    pub log_sql: bool,
    /// Log one line per HTTP request
    pub log_requests: bool,
    /// Service name attached to the startup event
    pub service_name: String,
    /// Deployment environment name
    pub environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            log_sql: false,
            log_requests: true,
            service_name: service_names::CRUD_ADMIN.into(),
            environment: "development".into(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    ///
    /// Reads `RUST_LOG`, `LOG_FORMAT`, `LOG_INCLUDE_LOCATION`, `LOG_SQL`,
    /// `LOG_HTTP_REQUESTS`, `SERVICE_NAME`, and `ENVIRONMENT`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let is_production = environment == "production";

        Self {
            level: env::var("RUST_LOG").unwrap_or(defaults.level),
            format: env::var("LOG_FORMAT")
                .map_or(defaults.format, |v| LogFormat::from_str_or_default(&v)),
            include_location: is_production || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            log_sql: env::var("LOG_SQL").is_ok(),
            log_requests: env::var("LOG_HTTP_REQUESTS").map_or(defaults.log_requests, |v| {
                !matches!(v.trim(), "0" | "false" | "off")
            }),
            service_name: env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
            environment,
        }
    }

    /// Noise reduction directives layered on top of the base level
    fn directives(&self) -> Vec<String> {
        vec![
            "hyper=warn".to_owned(),
            "hyper::proto=warn".to_owned(),
            format!("sqlx={}", if self.log_sql { "info" } else { "warn" }),
            format!("sqlx::query={}", if self.log_sql { "info" } else { "warn" }),
            format!("tower_http={}", if self.log_requests { "info" } else { "warn" }),
            format!("crud_admin={}", self.level),
        ]
    }

    /// Filter built from the configured level plus noise reduction
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        self.directives()
            .iter()
            .fold(EnvFilter::new(&self.level), |filter, directive| {
                match directive.parse() {
                    Ok(directive) => filter.add_directive(directive),
                    Err(_) => filter,
                }
            })
    }

    fn output_layer(&self) -> Box<dyn Layer<FilteredRegistry> + Send + Sync> {
        let layer = fmt::layer()
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_target(true)
            .with_writer(io::stdout);

        match self.format {
            LogFormat::Json => layer.json().flatten_event(true).boxed(),
            LogFormat::Pretty => layer.boxed(),
            LogFormat::Compact => layer.compact().with_target(false).boxed(),
        }
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        tracing_subscriber::registry()
            .with(self.env_filter())
            .with(self.output_layer())
            .try_init()?;

        info!(
            service.name = %self.service_name,
            service.version = env!("CARGO_PKG_VERSION"),
            environment = %self.environment,
            log.level = %self.level,
            log.format = ?self.format,
            log.sql = self.log_sql,
            "Logging initialised"
        );
        Ok(())
    }
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Admin panel logging helpers
pub struct AppLogger;

impl AppLogger {
    /// Log a login or token request
    pub fn log_auth_event(username: &str, event: &str, success: bool) {
        if success {
            info!(user.name = %username, auth.event = %event, auth.success = true, "Authentication event");
        } else {
            warn!(user.name = %username, auth.event = %event, auth.success = false, "Authentication event");
        }
    }

    /// Log a change made through the panel
    pub fn log_admin_change(username: &str, model_id: &str, action: &str, object_id: &str) {
        info!(
            user.name = %username,
            admin.model = %model_id,
            admin.action = %action,
            admin.object_id = %object_id,
            "Admin change"
        );
    }

    /// Log a write the database or the form checks refused
    pub fn log_rejected_write(model_id: &str, action: &str, reason: &str) {
        warn!(
            admin.model = %model_id,
            admin.action = %action,
            admin.reason = %reason,
            "Admin write rejected"
        );
    }
}
