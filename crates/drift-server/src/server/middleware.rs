//! Axum middleware layers applied to the router.
//!
//! Includes request tracing, timeout enforcement, and response compression.
//! Credential-bearing headers are marked sensitive before the trace layer
//! sees them, so they are never written to logs.

use std::time::Duration;

use axum::{
    http::header::{AUTHORIZATION, COOKIE, SET_COOKIE},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    sensitive_headers::{SetSensitiveRequestHeadersLayer, SetSensitiveResponseHeadersLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Default per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Wrap `router` in the shared middleware stack.
///
/// Layers listed later run first on the request path.
pub fn apply<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(SetSensitiveResponseHeadersLayer::new([SET_COOKIE]))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION, COOKIE]))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
}
