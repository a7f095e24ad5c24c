//! Application router and middleware stack.
//!
//! Centralized here so the binary entrypoint and the integration tests
//! exercise the same stack: panic recovery, request timeout, request-ID
//! propagation, structured tracing, and CORS.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::handlers::{batches, clearing, health, payout_preview, webhooks};
use crate::state::AppState;

/// All /api/v1 routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Gateway callbacks.
        .route(
            "/webhooks/disbursements",
            post(webhooks::receive_disbursement_webhook),
        )
        // Admin: eligibility preview (read-only).
        .route("/admin/payouts/preview", get(payout_preview::monthly_preview))
        .route(
            "/admin/payouts/rollover-balances",
            get(payout_preview::rollover_balances),
        )
        // Admin: batch orchestration.
        .route("/admin/payouts/batches", post(batches::create_batch))
        .route(
            "/admin/payouts/batches/{batch_id}/dispatch",
            post(batches::dispatch_batch),
        )
        .route(
            "/admin/payouts/{payout_id}/retry",
            post(batches::retry_failed_payout),
        )
        // Admin: clearing sweep.
        .route("/admin/clearing/run", post(clearing::run_clearing))
        .route("/admin/clearing/stats", get(clearing::clearing_stats))
}

/// Build the full application with all middleware layers.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state);
    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        // Health check at root level (not under /api/v1).
        .merge(health::router())
        // API v1 routes.
        .nest("/api/v1", api_routes())
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500 JSON.
        .layer(CatchPanicLayer::new())
        // Request timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // CORS.
        .layer(cors)
        // Shared state.
        .with_state(state)
}

/// Build the CORS middleware layer from server configuration.
///
/// Panics at startup if any configured origin is invalid, which is the
/// desired behaviour -- we want misconfiguration to fail fast.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<_> = state
        .config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
