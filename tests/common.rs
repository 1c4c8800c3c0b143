// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides an in-memory schema, a ready admin panel, and session tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `crud_admin`

use anyhow::Result;
use crud_admin::{
    config::{AdminConfig, AdminCredentials},
    database::Database,
    hashing::HashMethod,
    server::AdminPanel,
};
use std::path::PathBuf;
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Tables used across the integration tests.
///
/// `posts` references `users`, `tags` has no primary key but a unique column,
/// and `audit` has neither so it is never registered.
pub const SCHEMA: &str = r"
CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    email VARCHAR(100) NOT NULL UNIQUE,
    name TEXT,
    password_hash TEXT NOT NULL,
    is_active BOOLEAN,
    created_at DATETIME
);
CREATE TABLE posts (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id),
    published DATE
);
CREATE TABLE tags (
    name TEXT NOT NULL UNIQUE,
    color TEXT
);
CREATE TABLE audit (
    message TEXT
);
";

/// Models registered by [`create_test_panel`]
pub fn test_models() -> Vec<String> {
    vec!["users".to_owned(), "posts".to_owned(), "tags".to_owned()]
}

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Panel configuration with one admin account and fast hashing
pub fn test_config() -> AdminConfig {
    AdminConfig {
        admin_users: vec![AdminCredentials::new("admin", "secret")],
        jwt_secret: "test-secret-for-integration-tests".to_owned(),
        hash_method: HashMethod::Sha256,
        presets_folder: PathBuf::from("does-not-exist"),
        ..AdminConfig::default()
    }
}

/// In-memory database with [`SCHEMA`] applied
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    let database = Database::new("sqlite::memory:").await?;
    sqlx::raw_sql(SCHEMA).execute(database.pool()).await?;
    Ok(database)
}

/// Admin panel over a fresh test database
pub async fn create_test_panel(config: AdminConfig) -> Result<AdminPanel> {
    let database = create_test_database().await?;
    Ok(AdminPanel::new(database, &test_models(), config).await?)
}

/// Session token for the test admin
pub fn admin_token(panel: &AdminPanel) -> Result<String> {
    Ok(panel.context().auth_manager.generate_token("admin")?)
}

/// Seed two users and a post owned by the first one
pub async fn seed(database: &Database) -> Result<()> {
    sqlx::raw_sql(
        r"
        INSERT INTO users (id, email, name, password_hash, is_active)
        VALUES (1, 'alice@example.com', 'Alice', 'x', 1),
               (2, 'bob@example.com', 'Bob', 'y', 0);
        INSERT INTO posts (id, title, user_id, published) VALUES (1, 'Hello', 1, '2024-05-01');
        INSERT INTO tags (name, color) VALUES ('rust', 'orange');
        ",
    )
    .execute(database.pool())
    .await?;
    Ok(())
}
