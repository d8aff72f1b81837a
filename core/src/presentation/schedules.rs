//! `/schedules*` (§6): analogous CRUD to executions, plus the
//! `kind`-dependent field requirements enforced by the domain entity
//! (§3) and the cron validation the schedule engine performs at creation.

use crate::presentation::auth::Caller;
use crate::presentation::envelope::{ApiError, ApiResult, SuccessResponse};
use crate::presentation::state::AppState;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use loadtest_domain::entities::{ScheduleId, ScheduleKind, ScheduleStatus};
use loadtest_domain::{Schedule, TestId, Vus};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/schedules", get(list_schedules).post(create_schedule))
        .route("/schedules/:id", get(get_schedule).delete(delete_schedule))
        .route("/schedules/:id/cancel", post(cancel_schedule))
}

#[derive(Deserialize)]
struct CreateScheduleRequest {
    test_id: String,
    vus: u32,
    duration: String,
    kind: String,
    /// Required iff `kind = "recurring"`.
    cron_expression: Option<String>,
    /// Required iff `kind = "once"`.
    next_run_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Serialize)]
struct ScheduleView {
    id: String,
    test_id: String,
    user_id: String,
    kind: ScheduleKind,
    cron_expression: Option<String>,
    next_run_at: Option<chrono::DateTime<chrono::Utc>>,
    vus: u32,
    duration: String,
    status: ScheduleStatus,
    last_run_at: Option<chrono::DateTime<chrono::Utc>>,
    run_count: u64,
}

impl From<Schedule> for ScheduleView {
    fn from(s: Schedule) -> Self {
        Self {
            id: s.id.to_string(),
            test_id: s.test_id.to_string(),
            user_id: s.user_id.to_string(),
            kind: s.kind,
            cron_expression: s.cron_expression,
            next_run_at: s.next_run_at,
            vus: s.vus.get(),
            duration: s.duration.to_arg_string(),
            status: s.status,
            last_run_at: s.last_run_at,
            run_count: s.run_count,
        }
    }
}

async fn create_schedule(State(state): State<AppState>, caller: Caller, axum::Json(req): axum::Json<CreateScheduleRequest>) -> ApiResult<ScheduleView> {
    let test_id = TestId::from_str(&req.test_id).map_err(|_| ApiError::validation("test_id is not a valid identifier"))?;
    if req.vus == 0 {
        return Err(ApiError::validation("vus must be positive"));
    }
    let vus = Vus::new(req.vus);
    let duration = loadtest_domain::RunDuration::parse_lenient(&req.duration);

    let schedule = match req.kind.as_str() {
        "once" => {
            let next_run_at = req.next_run_at.ok_or_else(|| ApiError::validation("once schedules require next_run_at"))?;
            state.schedule_engine.create_once(test_id, caller.user_id, vus, duration, next_run_at).await?
        }
        "recurring" => {
            let cron_expression = req
                .cron_expression
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| ApiError::validation("recurring schedules require cron_expression"))?;
            state
                .schedule_engine
                .create_recurring(test_id, caller.user_id, vus, duration, cron_expression)
                .await?
        }
        other => return Err(ApiError::validation(format!("unknown schedule kind: {other}"))),
    };
    Ok(SuccessResponse::created(schedule.into()))
}

async fn get_schedule(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<ScheduleView> {
    let schedule = load_owned(&state, &caller, &id).await?;
    Ok(SuccessResponse::ok(schedule.into()))
}

async fn list_schedules(State(state): State<AppState>, caller: Caller) -> ApiResult<Vec<ScheduleView>> {
    let schedules = state.store.list_schedules(caller.ownership_filter()).await?;
    Ok(SuccessResponse::ok(schedules.into_iter().map(ScheduleView::from).collect()))
}

async fn cancel_schedule(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<()> {
    let schedule = load_owned(&state, &caller, &id).await?;
    state.schedule_engine.cancel(schedule.id).await?;
    Ok(SuccessResponse::ok(()))
}

async fn delete_schedule(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<()> {
    let schedule = load_owned(&state, &caller, &id).await?;
    state.store.delete_schedule(schedule.id).await?;
    Ok(SuccessResponse::no_content())
}

async fn load_owned(state: &AppState, caller: &Caller, id: &str) -> Result<Schedule, ApiError> {
    let schedule_id = ScheduleId::from_str(id).map_err(|_| ApiError::validation("schedule id is not a valid identifier"))?;
    let schedule = state
        .store
        .get_schedule(schedule_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("schedule {schedule_id} not found")))?;
    if !caller.may_act_on(schedule.user_id) {
        return Err(loadtest_domain::LoadTestError::forbidden("not the owner of this schedule").into());
    }
    Ok(schedule)
}
