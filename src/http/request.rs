//! Request identification.
//!
//! Every request carries an `x-request-id`, generated as a UUID v4 when the
//! client did not send one, and echoed back on the response.

use axum::body::Body;
use axum::http::{HeaderName, Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::Span;

pub const X_REQUEST_ID: &str = "x-request-id";

fn header_name() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(header_name(), MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(header_name())
}

/// Request id as sent or generated, `"unknown"` if absent.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span wrapping each HTTP request; shop spans and logs nest under it.
pub fn request_span(request: &Request<Body>, service: &str) -> Span {
    tracing::info_span!(
        "http_request",
        service,
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id(request),
    )
}
