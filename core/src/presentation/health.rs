//! `/health`, `/ready` (§6). Liveness never touches the store; readiness
//! does, and reports 503 when a dependency is unreachable - the cache is
//! advisory (§5) so its check never fails readiness on its own.

use crate::presentation::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use loadtest_domain::ExecutionFilter;
use serde_json::json;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health)).route("/ready", get(ready))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let store_ok = state
        .store
        .count_executions(&ExecutionFilter { page: 1, page_size: 1, ..Default::default() })
        .await
        .is_ok();

    let status = if store_ok { "ok" } else { "degraded" };
    let code = if store_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        code,
        Json(json!({
            "status": status,
            "checks": {"store": store_ok, "cache": true},
        })),
    )
}
