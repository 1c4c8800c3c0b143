// ABOUTME: Integration tests for schema introspection and row access against in-memory SQLite
// ABOUTME: Covers metadata extraction, paging, search, typed decoding, and constraint classification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::NaiveDate;
use crud_admin::database::{ConstraintViolation, Database, SearchFilter};
use crud_admin::schema::{extract_models_metadata, ColumnType, ModelRegistry};
use crud_admin_core::models::{FieldValue, ObjectId, Row};
use std::collections::BTreeMap;

#[tokio::test]
async fn test_file_database_creates_missing_directory() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("data").join("admin.db");

    let database = Database::new(&format!("sqlite:{}", path.display()))
        .await
        .unwrap();
    database.migrate().await.unwrap();

    assert!(path.exists());
}

async fn setup() -> (Database, ModelRegistry) {
    let database = common::create_test_database().await.unwrap();
    database.migrate().await.unwrap();
    common::seed(&database).await.unwrap();
    let models = vec![
        "users".to_owned(),
        "posts".to_owned(),
        "tags".to_owned(),
        "audit".to_owned(),
    ];
    let registry = extract_models_metadata(&database, &models).await.unwrap();
    (database, registry)
}

fn id(value: i64) -> ObjectId {
    ObjectId(BTreeMap::from([("id".to_owned(), FieldValue::Integer(value))]))
}

// ============================================================================
// Introspection
// ============================================================================

#[tokio::test]
async fn test_list_tables_excludes_history() {
    let (database, _) = setup().await;

    let tables = database.list_tables().await.unwrap();

    assert_eq!(tables, vec!["audit", "posts", "tags", "users"]);
}

#[tokio::test]
async fn test_models_without_identity_are_skipped() {
    let (_, registry) = setup().await;

    let ids: Vec<&str> = registry.ids().collect();
    assert_eq!(ids, vec!["users", "posts", "tags"]);
}

#[tokio::test]
async fn test_missing_table_is_a_config_error() {
    let database = common::create_test_database().await.unwrap();

    let err = extract_models_metadata(&database, &["ghosts".to_owned()])
        .await
        .unwrap_err();

    assert!(err.message.contains("ghosts"));
}

#[tokio::test]
async fn test_users_metadata() {
    let (_, registry) = setup().await;
    let users = registry.get("users").unwrap();

    assert_eq!(users.primary_keys, vec!["id"]);
    assert_eq!(users.identity, vec!["id"]);
    assert_eq!(users.required_columns, vec!["id", "email", "password"]);
    assert_eq!(users.unique_columns, vec!["id", "email"]);
    let email = users.column("email").unwrap();
    assert_eq!(email.len, Some(100));
    assert_eq!(email.column_type, ColumnType::Text);
    let password = users.column("password").unwrap();
    assert_eq!(password.db_name, "password_hash");
    assert_eq!(password.column_type, ColumnType::Hash);
}

#[tokio::test]
async fn test_foreign_keys_and_deletion_order() {
    let (_, registry) = setup().await;
    let posts = registry.get("posts").unwrap();

    let link = posts.foreign_keys.get("users").unwrap();
    assert_eq!(link.column, "user_id");
    assert_eq!(link.target_column, "id");

    let order = registry.deletion_order();
    let posts_at = order.iter().position(|m| *m == "posts").unwrap();
    let users_at = order.iter().position(|m| *m == "users").unwrap();
    assert!(posts_at < users_at);
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_select_rows_pages_in_identity_order() {
    let (database, registry) = setup().await;
    let users = registry.get("users").unwrap();

    let first = database.select_rows(users, None, 1, 0).await.unwrap();
    let second = database.select_rows(users, None, 1, 1).await.unwrap();

    assert_eq!(first[0].get("id"), Some(&FieldValue::Integer(1)));
    assert_eq!(second[0].get("id"), Some(&FieldValue::Integer(2)));
    assert_eq!(database.count_rows(users, None).await.unwrap(), 2);
}

#[tokio::test]
async fn test_search_matches_substrings() {
    let (database, registry) = setup().await;
    let users = registry.get("users").unwrap();
    let filter = SearchFilter::new("email", "bob").unwrap();

    let rows = database.select_rows(users, Some(&filter), 10, 0).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(database.count_rows(users, Some(&filter)).await.unwrap(), 1);
    assert_eq!(
        rows[0].get("email"),
        Some(&FieldValue::Text("bob@example.com".to_owned()))
    );
}

#[tokio::test]
async fn test_search_wildcards_match_literally() {
    let (database, registry) = setup().await;
    let users = registry.get("users").unwrap();
    sqlx::query(
        "INSERT INTO users (id, email, name, password_hash) VALUES (3, 'dan_100%@example.com', 'Dan', 'z')",
    )
    .execute(database.pool())
    .await
    .unwrap();

    let percent = SearchFilter::new("email", "%").unwrap();
    assert_eq!(database.count_rows(users, Some(&percent)).await.unwrap(), 1);

    let underscore = SearchFilter::new("email", "_").unwrap();
    let rows = database
        .select_rows(users, Some(&underscore), 10, 0)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&FieldValue::Text("Dan".to_owned())));
}

#[tokio::test]
async fn test_cells_decode_by_column_type() {
    let (database, registry) = setup().await;
    let users = registry.get("users").unwrap();
    let posts = registry.get("posts").unwrap();

    let alice = database.get_by_params(users, &id(1)).await.unwrap().unwrap();
    assert_eq!(alice.get("is_active"), Some(&FieldValue::Boolean(true)));
    assert_eq!(alice.get("created_at"), Some(&FieldValue::Null));
    assert_eq!(alice.get("password"), Some(&FieldValue::Text("x".to_owned())));

    let post = database.get_by_params(posts, &id(1)).await.unwrap().unwrap();
    assert_eq!(
        post.get("published"),
        Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()))
    );
}

#[tokio::test]
async fn test_get_by_params_missing_row() {
    let (database, registry) = setup().await;

    let row = database
        .get_by_params(registry.get("users").unwrap(), &id(42))
        .await
        .unwrap();

    assert!(row.is_none());
}

// ============================================================================
// Writes and constraints
// ============================================================================

#[tokio::test]
async fn test_insert_returns_rowid() {
    let (database, registry) = setup().await;
    let users = registry.get("users").unwrap();
    let row: Row = BTreeMap::from([
        ("email".to_owned(), FieldValue::Text("new@example.com".to_owned())),
        ("password_hash".to_owned(), FieldValue::Text("h".to_owned())),
    ]);

    let rowid = database.insert_row(users, &row).await.unwrap();

    assert_eq!(rowid, 3);
}

#[tokio::test]
async fn test_unique_violation_is_classified() {
    let (database, registry) = setup().await;
    let users = registry.get("users").unwrap();
    let row: Row = BTreeMap::from([
        ("email".to_owned(), FieldValue::Text("alice@example.com".to_owned())),
        ("password".to_owned(), FieldValue::Text("h".to_owned())),
    ]);

    let err = database.insert_row(users, &row).await.unwrap_err();

    assert_eq!(ConstraintViolation::classify(&err), ConstraintViolation::Unique);
}

#[tokio::test]
async fn test_not_null_violation_names_column() {
    let (database, registry) = setup().await;
    let users = registry.get("users").unwrap();
    let row: Row = BTreeMap::from([(
        "email".to_owned(),
        FieldValue::Text("nopass@example.com".to_owned()),
    )]);

    let err = database.insert_row(users, &row).await.unwrap_err();

    assert_eq!(
        ConstraintViolation::classify(&err),
        ConstraintViolation::NotNull {
            column: "password_hash".to_owned()
        }
    );
}

#[tokio::test]
async fn test_foreign_key_violation_is_classified() {
    let (database, registry) = setup().await;
    let users = registry.get("users").unwrap();

    let err = database.delete_row(users, &id(1)).await.unwrap_err();

    assert!(ConstraintViolation::classify(&err).is_foreign_key());
}

#[tokio::test]
async fn test_update_and_delete_report_affected_rows() {
    let (database, registry) = setup().await;
    let users = registry.get("users").unwrap();
    let row: Row = BTreeMap::from([("name".to_owned(), FieldValue::Text("Robert".to_owned()))]);

    assert_eq!(database.update_row(users, &id(2), &row).await.unwrap(), 1);
    assert_eq!(database.update_row(users, &id(99), &row).await.unwrap(), 0);
    assert_eq!(database.delete_row(users, &id(2)).await.unwrap(), 1);
    assert_eq!(database.delete_row(users, &id(2)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_clear_all_respects_foreign_keys() {
    let (database, registry) = setup().await;

    let deleted = database.clear_all(&registry).await.unwrap();

    assert_eq!(deleted, 4);
    for model in registry.iter() {
        assert_eq!(database.count_rows(model, None).await.unwrap(), 0);
    }
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn test_history_is_listed_newest_first_and_filtered() {
    let (database, _) = setup().await;
    for (model, message) in [(Some("users"), "first"), (None, "reset"), (Some("posts"), "third")] {
        database
            .add_history(&crud_admin::database::NewHistoryEntry {
                user: "admin".to_owned(),
                route: "/admin/x".to_owned(),
                model_id: model.map(ToOwned::to_owned),
                log_message: message.to_owned(),
                object_id: None,
            })
            .await
            .unwrap();
    }

    let all = database.list_history(None, 10).await.unwrap();
    let messages: Vec<&str> = all.iter().map(|e| e.log_message.as_str()).collect();
    assert_eq!(messages, vec!["third", "reset", "first"]);

    let users = database.list_history(Some("users"), 10).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].log_message, "first");

    assert_eq!(database.list_history(None, 2).await.unwrap().len(), 2);
    assert!(all[0].timestamp().is_some());
}

#[tokio::test]
async fn test_history_keeps_unparseable_datetime_text() {
    let (database, _) = setup().await;
    sqlx::query(&format!(
        "INSERT INTO \"{}\" (user, datetime, route, log_message) VALUES ('admin', 'last tuesday', '/admin/x', 'imported')",
        database.history_table()
    ))
    .execute(database.pool())
    .await
    .unwrap();

    let entries = database.list_history(None, 10).await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].datetime, "last tuesday");
    assert!(entries[0].timestamp().is_none());
    assert_eq!(entries[0].display_time(), "last tuesday");
}
