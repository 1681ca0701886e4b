//! Log output and per-request tracing

use axum::{body::Body, http::Request, Router};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;
use tracing_subscriber::EnvFilter;

const REQUEST_ID: &str = "x-request-id";

/// Installs the global subscriber
///
/// Filtering follows `RUST_LOG`, falling back to `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Wraps a router so every request gets an `x-request-id` and a span carrying it
///
/// An incoming `x-request-id` is kept; otherwise a UUID is generated. The id
/// is echoed back on the response. Only the request path is recorded, since
/// query strings may carry access tokens.
pub fn trace_requests<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|id| id.to_str().ok())
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        request_id,
        http.method = %request.method(),
        http.target = request.uri().path(),
    )
}
