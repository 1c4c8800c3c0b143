// ABOUTME: Configuration management module for the admin panel and its standalone server
// ABOUTME: Environment-only configuration split into server settings and panel settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Configuration module
//!
//! - **environment**: Server configuration (host, port, database, models) from environment variables
//! - **panel**: Admin panel behavior (route prefix, users, hashing, paging, presets)

/// Environment and server configuration
pub mod environment;
/// Admin panel configuration
pub mod panel;

pub use environment::{Environment, ServerConfig};
pub use panel::{AdminConfig, AdminCredentials};
