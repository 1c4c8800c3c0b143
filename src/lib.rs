// ABOUTME: Main library entry point for the crud_admin panel
// ABOUTME: Auto-generated CRUD pages, CSV import, presets, and change history for SQL tables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # crud_admin
//!
//! An admin panel that reads the schema of existing database tables and serves
//! server-rendered pages to browse, search, add, edit, and delete their rows.
//!
//! ## Features
//!
//! - **Schema driven**: forms and tables are generated from column metadata
//! - **Hashed columns**: `*_hash` columns are written through a configurable hash
//! - **CSV upload and presets**: bulk-load rows per model or from YAML presets
//! - **Change history**: every successful change is recorded with user and route
//! - **Token auth**: HS256 session cookie for pages, bearer tokens for the JSON API
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use crud_admin::config::AdminConfig;
//! use crud_admin::database::Database;
//! use crud_admin::server::add_admin_panel;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let database = Database::new("sqlite:./app.db").await?;
//!     let config = AdminConfig {
//!         debug: true,
//!         ..AdminConfig::default()
//!     };
//!     let app = add_admin_panel(axum::Router::new(), database, &["users".to_owned()], config).await?;
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

/// Session tokens and admin credential checks
pub mod auth;

/// Configuration management
pub mod config;

/// Shared request state
pub mod context;

/// CSV parsing and bulk import
pub mod csv_import;

/// Database pool, row access, and change history
pub mod database;

/// Error types re-exported from the core crate
pub mod errors;

/// Flash messages shown above page bodies
pub mod flash;

/// Hash functions for hashed columns
pub mod hashing;

/// Structured logging setup
pub mod logging;

/// HTTP middleware
pub mod middleware;

/// YAML presets of CSV files
pub mod presets;

/// HTTP routes
pub mod routes;

/// Schema introspection and model metadata
pub mod schema;

/// Panel assembly and the standalone server
pub mod server;

/// Form and identity helpers
pub mod utils;

/// Server-rendered HTML
pub mod views;

/// Constants shared with the core crate
pub use crud_admin_core::constants;
