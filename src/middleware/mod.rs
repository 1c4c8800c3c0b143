// ABOUTME: HTTP middleware for request tracing, admin authentication, and change history
// ABOUTME: Provides request ID propagation, token gating, and history recording for mutating routes

pub mod auth;
pub mod history;
pub mod request_id;
pub mod tracing;

// Authentication gate
pub use auth::{require_api_token, require_token, AdminUser};

// Change history
pub use history::{record_history, HistoryAction};

// Request identification and spans
pub use request_id::{request_id_middleware, RequestId};
pub use self::tracing::{create_request_span, make_request_span, record_response};
