// /////////////////////////////////////////////////////////////////////////////
// Load Test Orchestration Platform
// /////////////////////////////////////////////////////////////////////////////

//! # HTTP control surface (§4.H, §6)
//!
//! Thin axum layer translating external requests into supervisor /
//! schedule-engine / query-service operations. Owns exactly three things
//! this core is responsible for: the response envelope, ownership
//! enforcement (standard users see only their own rows; admins bypass),
//! and mapping [`LoadTestError`](loadtest_domain::LoadTestError) onto HTTP
//! status codes. Everything else (HTTP transport itself, JWT issuance,
//! multipart upload, the web UI, the reverse proxy) is out of scope per
//! §1 - this layer consumes an already-authenticated caller identity off
//! two headers an upstream gateway is expected to set, rather than
//! verifying credentials itself.

mod auth;
mod envelope;
mod executions;
mod health;
mod metrics_api;
mod schedules;
mod state;

pub use state::AppState;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the full router: executions, schedules, metrics queries, and the
/// two health endpoints, wrapped in request tracing and a permissive CORS
/// layer (the UI and Grafana dashboard this core serves are external
/// collaborators per §1, not something this crate authenticates by
/// origin).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(executions::router())
        .merge(schedules::router())
        .merge(metrics_api::router())
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
