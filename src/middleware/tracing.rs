// ABOUTME: Tracing span for HTTP requests with fields filled in by later middleware
// ABOUTME: Plugged into the tower-http TraceLayer wrapping the admin router

use axum::http::{Request, Response};
use std::time::Duration;
use tracing::{info, Span};

/// Create a tracing span for HTTP requests
pub fn create_request_span(method: &str, path: &str) -> Span {
    tracing::info_span!(
        "http_request",
        method = %method,
        path = %path,
        request_id = tracing::field::Empty,
        user = tracing::field::Empty,
        status_code = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    )
}

/// Span factory for `tower_http::trace::TraceLayer::make_span_with`
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    create_request_span(request.method().as_str(), request.uri().path())
}

/// Response hook for `tower_http::trace::TraceLayer::on_response`
pub fn record_response<B>(response: &Response<B>, latency: Duration, span: &Span) {
    let status = response.status().as_u16();
    let duration_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
    span.record("status_code", status);
    span.record("duration_ms", duration_ms);
    info!(status_code = status, duration_ms, "Request completed");
}
