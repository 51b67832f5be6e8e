//! Router assembly for the automation service.
//!
//! [`build_app_router`] is shared by `main.rs` and `tests/common/mod.rs`, so
//! the scheduler-facing endpoints are exercised under the same middleware
//! they run behind in production.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Build the service [`Router`].
///
/// Layers run outermost first on the way in:
///
/// 1. CORS (dashboard origins only)
/// 2. Request ID assignment (`x-request-id`)
/// 3. Request/response tracing, one span per request
/// 4. Request ID echoed on the response
/// 5. Request timeout (`REQUEST_TIMEOUT_SECS`)
/// 6. Panic recovery
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = build_cors_layer(config);
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        // Liveness and readiness checks; no bearer token.
        .merge(routes::health::router())
        // Sweep, event, point-load and execution-log endpoints. Unversioned,
        // since the external scheduler calls these paths directly.
        .merge(routes::api_routes())
        // -- Middleware stack (applied bottom-up) --
        // A panicking handler becomes a 500 instead of a dropped connection.
        .layer(CatchPanicLayer::new())
        // Bounds a synchronous sweep; the scheduler sees 408 and retries on
        // its next tick.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Echo the request ID so scheduler logs can be joined with ours.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Keep an incoming ID; otherwise mint a UUID.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // Outermost, so preflight requests never reach auth.
        .layer(cors)
        .with_state(state)
}

/// CORS for the dashboard origins in `CORS_ORIGINS`.
///
/// The dashboard only reads execution logs and triggers sweeps, so GET and
/// POST are the only methods allowed. Panics at startup on an unparseable
/// origin.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
