//! `/metrics-api/*` (§4.G, §6): nine time-series shapes, two table
//! shapes, two dashboard-summary shapes, two variable-list endpoints, and
//! one consolidated-stats endpoint. All read-only; all delegate straight
//! to [`MetricsQueryService`](crate::application::MetricsQueryService),
//! whose auto-routing and caching this layer doesn't second-guess.

use crate::presentation::auth::Caller;
use crate::presentation::envelope::{ApiError, ApiResult, SuccessResponse};
use crate::presentation::state::AppState;
use crate::application::query_service::QueryFilter;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use loadtest_domain::{ExecutionId, TestId};
use serde::Deserialize;
use std::str::FromStr;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/metrics-api/ts/all", get(ts_all))
        .route("/metrics-api/ts/errors", get(ts_errors))
        .route("/metrics-api/ts/response-histogram", get(ts_response_histogram))
        .route("/metrics-api/ts/requests", get(ts_requests))
        .route("/metrics-api/ts/vus", get(ts_vus))
        .route("/metrics-api/ts/percentiles", get(ts_percentiles))
        .route("/metrics-api/ts/rps", get(ts_rps))
        .route("/metrics-api/ts/iterations", get(ts_iterations))
        .route("/metrics-api/ts/req-per-vu", get(ts_req_per_vu))
        .route("/metrics-api/tables/http", get(table_http))
        .route("/metrics-api/tables/errors", get(table_errors))
        .route("/metrics-api/dashboard/overview", get(dashboard_overview))
        .route("/metrics-api/dashboard/by-test", get(dashboard_by_test))
        .route("/metrics-api/stats", get(consolidated_stats))
        .route("/metrics-api/variables/tests", get(variable_tests))
        .route("/metrics-api/variables/domains", get(variable_domains))
}

#[derive(Deserialize)]
struct RangeQuery {
    /// Empty string or absent = no filter (§4.G).
    domain: Option<String>,
    test: Option<String>,
    from: Option<String>,
    to: Option<String>,
    interval: Option<i64>,
    /// Distinguishes `/metrics-api/stats` from the dashboard overview.
    execution_id: Option<String>,
}

fn filter_from_query(q: &RangeQuery) -> Result<QueryFilter, ApiError> {
    let _ = q.domain.as_deref(); // no domain entity in this core (§1); accepted and ignored.
    let test_id = q
        .test
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(TestId::from_str)
        .transpose()
        .map_err(|_| ApiError::validation("test is not a valid identifier"))?;

    let now = Utc::now();
    let to = match q.to.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => parse_flexible_time(raw)?,
        None => now,
    };
    let from = match q.from.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => parse_flexible_time(raw)?,
        None => to - chrono::Duration::hours(24),
    };
    let interval_secs = q.interval.unwrap_or(5).max(1);

    Ok(QueryFilter { test_id, from, to, interval_secs })
}

/// RFC 3339 (with or without subseconds), `YYYY-MM-DD`, or epoch
/// milliseconds (§4.G).
fn parse_flexible_time(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is always valid")));
    }
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis).ok_or_else(|| ApiError::validation("epoch milliseconds out of range"));
    }
    Err(ApiError::validation(format!("unparseable time value: {raw}")))
}

macro_rules! ts_handler {
    ($name:ident, $method:ident) => {
        async fn $name(State(state): State<AppState>, _caller: Caller, Query(query): Query<RangeQuery>) -> ApiResult<serde_json::Value> {
            let filter = filter_from_query(&query)?;
            Ok(SuccessResponse::ok(state.query_service.$method(&filter).await?))
        }
    };
}

ts_handler!(ts_all, timeseries_all);
ts_handler!(ts_errors, timeseries_errors);
ts_handler!(ts_response_histogram, timeseries_response_histogram);
ts_handler!(ts_requests, timeseries_requests);
ts_handler!(ts_vus, timeseries_vus);
ts_handler!(ts_percentiles, timeseries_percentiles);
ts_handler!(ts_rps, timeseries_rps);
ts_handler!(ts_iterations, timeseries_iterations);
ts_handler!(ts_req_per_vu, timeseries_req_per_vu);

async fn table_http(State(state): State<AppState>, _caller: Caller, Query(query): Query<RangeQuery>) -> ApiResult<serde_json::Value> {
    let filter = filter_from_query(&query)?;
    Ok(SuccessResponse::ok(state.query_service.http_table(&filter).await?))
}

async fn table_errors(State(state): State<AppState>, _caller: Caller, Query(query): Query<RangeQuery>) -> ApiResult<serde_json::Value> {
    let filter = filter_from_query(&query)?;
    Ok(SuccessResponse::ok(state.query_service.errors_table(&filter).await?))
}

async fn dashboard_overview(State(state): State<AppState>, _caller: Caller, Query(query): Query<RangeQuery>) -> ApiResult<serde_json::Value> {
    let filter = filter_from_query(&query)?;
    Ok(SuccessResponse::ok(state.query_service.dashboard_overview(&filter).await?))
}

/// Same shape as `dashboard_overview`, but `test` is mandatory - the
/// per-test dashboard summary view (§4.G's second dashboard-summary
/// shape).
async fn dashboard_by_test(State(state): State<AppState>, _caller: Caller, Query(query): Query<RangeQuery>) -> ApiResult<serde_json::Value> {
    if query.test.as_deref().unwrap_or_default().is_empty() {
        return Err(ApiError::validation("test is a mandatory filter for the per-test dashboard"));
    }
    let filter = filter_from_query(&query)?;
    Ok(SuccessResponse::ok(state.query_service.dashboard_overview(&filter).await?))
}

async fn consolidated_stats(State(state): State<AppState>, _caller: Caller, Query(query): Query<RangeQuery>) -> ApiResult<serde_json::Value> {
    let id = query
        .execution_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("execution_id is a mandatory filter for consolidated stats"))?;
    let execution_id = ExecutionId::from_str(id).map_err(|_| ApiError::validation("execution_id is not a valid identifier"))?;
    Ok(SuccessResponse::ok(state.query_service.stats_for_execution(execution_id).await?))
}

async fn variable_tests(State(state): State<AppState>, caller: Caller) -> ApiResult<serde_json::Value> {
    Ok(SuccessResponse::ok(state.query_service.variable_tests(caller.ownership_filter()).await?))
}

async fn variable_domains(State(state): State<AppState>, _caller: Caller) -> ApiResult<serde_json::Value> {
    Ok(SuccessResponse::ok(state.query_service.variable_domains()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_subseconds() {
        let dt = parse_flexible_time("2026-01-01T00:00:00.123Z").unwrap();
        assert_eq!(dt.timestamp(), 1767225600);
    }

    #[test]
    fn parses_date_only() {
        let dt = parse_flexible_time("2026-01-01").unwrap();
        assert_eq!(dt.timestamp(), 1767225600);
    }

    #[test]
    fn parses_epoch_millis() {
        let dt = parse_flexible_time("1767225600000").unwrap();
        assert_eq!(dt.timestamp(), 1767225600);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_flexible_time("not-a-time").is_err());
    }
}
