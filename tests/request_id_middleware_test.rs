// ABOUTME: Integration tests for request ID middleware
// ABOUTME: Checks id generation, propagation of client ids, and handler access through extensions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::{
    body::{to_bytes, Body},
    http::{Request as HttpRequest, StatusCode},
    middleware,
    routing::get,
    Extension, Router,
};
use crud_admin::middleware::request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
use helpers::axum_test::AxumTestRequest;
use std::error::Error;
use tower::ServiceExt;
use uuid::Uuid;

async fn echo_handler(Extension(request_id): Extension<RequestId>) -> String {
    format!("Request ID: {}", request_id.as_str())
}

fn echo_app() -> Router {
    Router::new()
        .route("/", get(echo_handler))
        .layer(middleware::from_fn(request_id_middleware))
}

#[tokio::test]
async fn test_request_id_middleware_generates_uuid() -> Result<(), Box<dyn Error>> {
    let request = HttpRequest::builder().uri("/").body(Body::empty())?;

    let response = echo_app().oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let header = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .ok_or("missing request id header")?
        .to_str()?
        .to_owned();
    assert!(Uuid::parse_str(&header).is_ok());

    let body = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(String::from_utf8(body.to_vec())?, format!("Request ID: {header}"));
    Ok(())
}

#[tokio::test]
async fn test_request_id_middleware_keeps_client_id() -> Result<(), Box<dyn Error>> {
    let request = HttpRequest::builder()
        .uri("/")
        .header(REQUEST_ID_HEADER, "client-chosen-id")
        .body(Body::empty())?;

    let response = echo_app().oneshot(request).await?;

    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).unwrap(),
        "client-chosen-id"
    );
    Ok(())
}

#[tokio::test]
async fn test_request_id_middleware_replaces_oversized_id() -> Result<(), Box<dyn Error>> {
    let oversized = "x".repeat(200);
    let request = HttpRequest::builder()
        .uri("/")
        .header(REQUEST_ID_HEADER, oversized.as_str())
        .body(Body::empty())?;

    let response = echo_app().oneshot(request).await?;

    let header = response.headers().get(REQUEST_ID_HEADER).unwrap().to_str()?;
    assert_ne!(header, oversized);
    assert!(Uuid::parse_str(header).is_ok());
    Ok(())
}

#[tokio::test]
async fn test_each_request_gets_its_own_id() {
    let panel = common::create_test_panel(common::test_config())
        .await
        .unwrap();

    let first = AxumTestRequest::get("/admin/health").send(panel.router()).await;
    let second = AxumTestRequest::get("/admin/health").send(panel.router()).await;

    let first_id = first.header(REQUEST_ID_HEADER).unwrap();
    let second_id = second.header(REQUEST_ID_HEADER).unwrap();
    assert_ne!(first_id, second_id);
}

#[tokio::test]
async fn test_panel_echoes_request_id_on_redirects() {
    let panel = common::create_test_panel(common::test_config())
        .await
        .unwrap();

    let response = AxumTestRequest::get("/admin/users")
        .header(REQUEST_ID_HEADER, "trace-me")
        .send(panel.router())
        .await;

    assert_eq!(response.status(), 303);
    assert_eq!(response.header(REQUEST_ID_HEADER).as_deref(), Some("trace-me"));
}
