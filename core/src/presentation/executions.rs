//! `/executions*` (§6). Ownership: a standard caller only ever sees or
//! acts on rows where `user_id = caller`; an admin bypasses that filter.
//! `dashboard=true` on the list endpoint implies the all-users filter
//! regardless of role (§4.H).

use crate::presentation::auth::Caller;
use crate::presentation::envelope::{ApiError, ApiResult, Meta, SuccessResponse};
use crate::presentation::state::AppState;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Router;
use loadtest_domain::entities::ExecutionStatus;
use loadtest_domain::{Execution, ExecutionFilter, ExecutionId, RunDuration, TestId, Vus};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/executions", get(list_executions).post(create_execution))
        .route("/executions/:id", get(get_execution).delete(delete_execution))
        .route("/executions/:id/cancel", post(cancel_execution))
        .route("/executions/:id/recalculate-metrics", post(recalculate_metrics))
        .route("/executions/:id/logs", get(execution_logs))
}

#[derive(Deserialize)]
struct CreateExecutionRequest {
    test_id: String,
    vus: u32,
    duration: String,
}

#[derive(Serialize)]
struct ExecutionView {
    id: String,
    test_id: String,
    user_id: String,
    schedule_id: Option<String>,
    vus: u32,
    duration: String,
    status: ExecutionStatus,
    started_at: Option<chrono::DateTime<chrono::Utc>>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
    exit_code: Option<i32>,
    metrics_summary: std::collections::HashMap<String, serde_json::Value>,
    error_message: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Execution> for ExecutionView {
    fn from(e: Execution) -> Self {
        Self {
            id: e.id.to_string(),
            test_id: e.test_id.to_string(),
            user_id: e.user_id.to_string(),
            schedule_id: e.schedule_id.map(|s| s.to_string()),
            vus: e.vus.get(),
            duration: e.duration.to_arg_string(),
            status: e.status,
            started_at: e.started_at,
            completed_at: e.completed_at,
            exit_code: e.exit_code,
            metrics_summary: e.metrics_summary,
            error_message: e.error_message,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

async fn create_execution(State(state): State<AppState>, caller: Caller, axum::Json(req): axum::Json<CreateExecutionRequest>) -> ApiResult<ExecutionView> {
    let test_id = TestId::from_str(&req.test_id).map_err(|_| ApiError::validation("test_id is not a valid identifier"))?;
    if req.vus == 0 {
        return Err(ApiError::validation("vus must be positive"));
    }

    let script_path = state.script_path(test_id);
    let execution = state
        .supervisor
        .submit(test_id, caller.user_id, None, Vus::new(req.vus), RunDuration::parse_lenient(&req.duration), script_path)
        .await?;
    Ok(SuccessResponse::created(execution.into()))
}

async fn get_execution(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<ExecutionView> {
    let execution = load_owned(&state, &caller, &id).await?;
    Ok(SuccessResponse::ok(execution.into()))
}

#[derive(Deserialize)]
struct ListExecutionsQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_page_size")]
    page_size: u32,
    test_id: Option<String>,
    status: Option<String>,
    #[serde(default)]
    dashboard: bool,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

async fn list_executions(State(state): State<AppState>, caller: Caller, Query(query): Query<ListExecutionsQuery>) -> ApiResult<Vec<ExecutionView>> {
    let test_id = query
        .test_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(TestId::from_str)
        .transpose()
        .map_err(|_| ApiError::validation("test_id is not a valid identifier"))?;
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_status)
        .transpose()?;

    let user_id = if query.dashboard { None } else { caller.ownership_filter() };
    let filter = ExecutionFilter {
        user_id,
        test_id,
        status,
        page: query.page,
        page_size: query.page_size,
    };

    let executions = state.store.list_executions(&filter).await?;
    let total = state.store.count_executions(&filter).await?;
    let meta = Meta::paged(total, query.page, query.page_size);
    Ok(SuccessResponse::paged(executions.into_iter().map(ExecutionView::from).collect(), meta))
}

fn parse_status(raw: &str) -> Result<ExecutionStatus, ApiError> {
    match raw {
        "queued" => Ok(ExecutionStatus::Queued),
        "running" => Ok(ExecutionStatus::Running),
        "completed" => Ok(ExecutionStatus::Completed),
        "failed" => Ok(ExecutionStatus::Failed),
        "cancelled" => Ok(ExecutionStatus::Cancelled),
        "timeout" => Ok(ExecutionStatus::Timeout),
        other => Err(ApiError::validation(format!("unknown status filter: {other}"))),
    }
}

async fn cancel_execution(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<()> {
    let execution = load_owned(&state, &caller, &id).await?;
    if !execution.status.is_in_flight() {
        return Err(loadtest_domain::LoadTestError::invalid_state("execution is not queued or running").into());
    }
    state.supervisor.cancel(execution.user_id, execution.id).await;
    Ok(SuccessResponse::ok(()))
}

async fn recalculate_metrics(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<ExecutionView> {
    let execution = load_owned(&state, &caller, &id).await?;
    let recalculated = state.supervisor.recalculate(execution.id).await?;
    Ok(SuccessResponse::ok(recalculated.into()))
}

async fn delete_execution(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<()> {
    let execution = load_owned(&state, &caller, &id).await?;
    if execution.status.is_in_flight() {
        return Err(loadtest_domain::LoadTestError::invalid_state("cannot delete a queued or running execution").into());
    }
    state.store.delete_execution(execution.id).await?;
    Ok(SuccessResponse::no_content())
}

#[derive(Serialize)]
struct LogsView {
    stdout: String,
    stderr: String,
}

async fn execution_logs(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<LogsView> {
    let execution = load_owned(&state, &caller, &id).await?;
    Ok(SuccessResponse::ok(LogsView {
        stdout: execution.stdout,
        stderr: execution.stderr,
    }))
}

async fn load_owned(state: &AppState, caller: &Caller, id: &str) -> Result<Execution, ApiError> {
    let execution_id = ExecutionId::from_str(id).map_err(|_| ApiError::validation("execution id is not a valid identifier"))?;
    let execution = state
        .store
        .get_execution(execution_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("execution {execution_id} not found")))?;
    if !caller.may_act_on(execution.user_id) {
        return Err(loadtest_domain::LoadTestError::forbidden("not the owner of this execution").into());
    }
    Ok(execution)
}
