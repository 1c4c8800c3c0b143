// ABOUTME: Unit tests for environment-driven configuration of the standalone server and panel
// ABOUTME: Validates defaults, overrides, deprecated variables, and config validation errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use crud_admin::config::environment::parse_model_list;
use crud_admin::config::{AdminConfig, AdminCredentials, Environment, ServerConfig};
use crud_admin::constants::defaults;
use crud_admin::hashing::HashMethod;
use serial_test::serial;
use std::env;

const VARS: &[&str] = &[
    "ENVIRONMENT",
    "HOST",
    "HTTP_PORT",
    "DATABASE_URL",
    "ADMIN_MODELS",
    "ADMIN_PANEL_NAME",
    "ADMIN_ROUTE",
    "ADMIN_PRESETS_FOLDER",
    "ADMIN_HASH_METHOD",
    "ADMIN_CUSTOM_HASH_METHOD",
    "ADMIN_DEBUG",
    "ADMIN_USER",
    "ADMIN_PASSWORD",
    "ADMIN_JWT_SECRET",
    "ADMIN_TOKEN_EXPIRY_HOURS",
    "ADMIN_PAGE_SIZE",
    "ADMIN_HISTORY_PAGE_SIZE",
    "ADMIN_CSV_UPDATE_EXISTING",
    "ADMIN_HISTORY_TABLE",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_environment_parsing() {
    assert_eq!(
        Environment::from_str_or_default("production"),
        Environment::Production
    );
    assert_eq!(
        Environment::from_str_or_default("testing"),
        Environment::Testing
    );
    assert_eq!(
        Environment::from_str_or_default("anything"),
        Environment::Development
    );
    assert_eq!(Environment::Production.to_string(), "production");
}

#[test]
fn test_model_list_parsing() {
    assert_eq!(parse_model_list("users,posts"), vec!["users", "posts"]);
    assert!(parse_model_list(" , ").is_empty());
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_env();

    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.host, defaults::HOST);
    assert_eq!(config.port, defaults::HTTP_PORT);
    assert_eq!(config.database_url, defaults::DATABASE_URL);
    assert!(config.models.is_empty());
    assert_eq!(config.environment, Environment::Development);
    assert_eq!(config.admin.route, "/admin");
    assert_eq!(config.admin.page_size, defaults::PAGE_SIZE);
    assert_eq!(config.admin.admin_users.len(), 1);
    assert_eq!(config.admin.admin_users[0].username, defaults::DEV_ADMIN_USER);
    assert!(config.admin.validate().is_ok());
}

#[test]
#[serial]
fn test_overrides_from_environment() {
    clear_env();
    env::set_var("HTTP_PORT", "8088");
    env::set_var("ADMIN_MODELS", "users, posts");
    env::set_var("ADMIN_ROUTE", "/backoffice");
    env::set_var("ADMIN_USER", "root");
    env::set_var("ADMIN_PASSWORD", "toor");
    env::set_var("ADMIN_HASH_METHOD", "bcrypt");
    env::set_var("ADMIN_PAGE_SIZE", "25");
    env::set_var("ADMIN_CSV_UPDATE_EXISTING", "yes");

    let config = ServerConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.port, 8088);
    assert_eq!(config.models, vec!["users", "posts"]);
    assert_eq!(config.admin.route, "/backoffice");
    assert_eq!(config.admin.hash_method, HashMethod::Bcrypt);
    assert_eq!(config.admin.page_size, 25);
    assert!(config.admin.csv_update_existing);
    assert_eq!(
        config.admin.admin_users,
        vec![AdminCredentials::new("root", "toor")]
    );
    assert!(config.summary().contains("route=/backoffice"));
    assert!(!config.summary().contains("toor"));
}

#[test]
#[serial]
fn test_deprecated_hash_variable_is_still_read() {
    clear_env();
    env::set_var("ADMIN_CUSTOM_HASH_METHOD", "sha256");

    let config = AdminConfig::from_env(&Environment::Development).unwrap();
    clear_env();

    assert_eq!(config.hash_method, HashMethod::Sha256);
}

#[test]
#[serial]
fn test_malformed_values_are_rejected() {
    clear_env();
    env::set_var("HTTP_PORT", "not-a-port");
    let port_error = ServerConfig::from_env().unwrap_err();
    clear_env();
    assert!(port_error.message.contains("HTTP_PORT"));

    env::set_var("ADMIN_HASH_METHOD", "md5");
    assert!(AdminConfig::from_env(&Environment::Development).is_err());
    clear_env();

    env::set_var("ADMIN_USER", "lonely");
    assert!(AdminConfig::from_env(&Environment::Development).is_err());
    clear_env();
}

#[test]
#[serial]
fn test_production_requires_admin_user() {
    clear_env();

    let config = AdminConfig::from_env(&Environment::Production).unwrap();

    assert!(config.admin_users.is_empty());
    let err = config.validate().unwrap_err();
    assert!(err.message.contains("at least one admin user"));
}

#[test]
fn test_validation_rejects_bad_routes_and_tables() {
    let base = AdminConfig {
        admin_users: vec![AdminCredentials::new("admin", "secret")],
        ..AdminConfig::default()
    };

    let no_slash = AdminConfig {
        route: "admin".to_owned(),
        ..base.clone()
    };
    assert!(no_slash.validate().is_err());

    let bad_table = AdminConfig {
        history_table_name: "drop table;".to_owned(),
        ..base.clone()
    };
    assert!(bad_table.validate().is_err());

    let debug_without_users = AdminConfig {
        admin_users: Vec::new(),
        debug: true,
        ..base
    };
    assert!(debug_without_users.validate().is_ok());
}
