//! # Metrics Query Service
//!
//! Nine time-series shapes, two table shapes, two dashboard summaries, two
//! variable-list endpoints, and one consolidated-stats endpoint (§4.G).
//! Short ranges (`to - from <= long_range_threshold`) are served by
//! re-aggregating bucket rows into the requested interval; long ranges are
//! served from one summary point per matching execution, ordered by
//! completion time, to keep the response bounded regardless of range.

use crate::application::query_cache::{CacheKey, QueryCache};
use crate::config::AppConfig;
use loadtest_domain::{AggregatedMetricRow, AggregatedRowQuery, ExecutionFilter, LoadTestError, MetricStore, TestId, UserId};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct QueryFilter {
    pub test_id: Option<TestId>,
    pub from: chrono::DateTime<chrono::Utc>,
    pub to: chrono::DateTime<chrono::Utc>,
    pub interval_secs: i64,
}

impl QueryFilter {
    fn cache_key(&self, endpoint: &str) -> CacheKey {
        CacheKey {
            endpoint: endpoint.to_string(),
            test_id: self.test_id.map(|t| t.to_string()),
            execution_id: None,
            from_micros: self.from.timestamp_micros(),
            to_micros: self.to.timestamp_micros(),
            interval_secs: self.interval_secs,
        }
    }
}

pub struct MetricsQueryService {
    store: Arc<dyn MetricStore>,
    config: AppConfig,
    cache: QueryCache,
}

/// One re-bucketed slice of aggregated bucket rows sharing a time window.
#[derive(Default, Clone, Copy)]
struct Slice {
    count: i64,
    sum: f64,
    avg_weighted: f64,
    min: f64,
    max: f64,
}

impl MetricsQueryService {
    pub fn new(store: Arc<dyn MetricStore>, config: AppConfig) -> Self {
        let cache = QueryCache::new(config.cache_ttl());
        Self { store, config, cache }
    }

    async fn metric_slices(&self, filter: &QueryFilter, metric_name: &str) -> Result<BTreeMap<i64, Slice>, LoadTestError> {
        if self.is_long_range(filter) {
            return self.metric_slices_from_summaries(filter, metric_name).await;
        }

        let rows = self
            .store
            .query_aggregated_rows(&AggregatedRowQuery {
                test_id: filter.test_id,
                execution_id: None,
                metric_name: Some(metric_name.to_string()),
                from: filter.from,
                to: filter.to,
                summary_only: false,
            })
            .await?;

        let mut buckets: BTreeMap<i64, Slice> = BTreeMap::new();
        for row in rows {
            let Some(bucket_time) = row.bucket_time else { continue };
            let interval_start = (bucket_time.timestamp() / filter.interval_secs.max(1)) * filter.interval_secs.max(1);
            let slot = buckets.entry(interval_start).or_default();
            combine_into(slot, &row);
        }
        Ok(buckets)
    }

    /// One data point per matching execution's completed time, per §4.G's
    /// long-range routing rule.
    async fn metric_slices_from_summaries(&self, filter: &QueryFilter, metric_name: &str) -> Result<BTreeMap<i64, Slice>, LoadTestError> {
        let executions = self.executions_with_rows(filter).await?;
        let mut points: BTreeMap<i64, Slice> = BTreeMap::new();
        for (completed_at, rows) in &executions {
            for row in rows.iter().filter(|r| r.is_summary && r.tags.url.is_none() && r.metric_name == metric_name) {
                let slot = points.entry(completed_at.timestamp()).or_default();
                combine_into(slot, row);
            }
        }
        Ok(points)
    }

    /// Every execution completing within `filter`'s window, paired with its
    /// full set of aggregated rows - the shared long-range data source for
    /// every endpoint that auto-routes to one point per execution.
    async fn executions_with_rows(
        &self,
        filter: &QueryFilter,
    ) -> Result<Vec<(chrono::DateTime<chrono::Utc>, Vec<AggregatedMetricRow>)>, LoadTestError> {
        let executions = self
            .store
            .list_executions(&ExecutionFilter {
                user_id: None,
                test_id: filter.test_id,
                status: None,
                page: 1,
                page_size: 10_000,
            })
            .await?;

        let mut result = Vec::new();
        for execution in executions {
            let Some(completed_at) = execution.completed_at else { continue };
            if completed_at < filter.from || completed_at > filter.to {
                continue;
            }
            let rows = self.store.aggregated_rows_for_execution(execution.id).await?;
            result.push((completed_at, rows));
        }
        Ok(result)
    }

    fn is_long_range(&self, filter: &QueryFilter) -> bool {
        (filter.to - filter.from) > self.config.long_range_threshold()
    }

    fn cached_or<F>(&self, filter: &QueryFilter, endpoint: &str, compute: F) -> Option<Value>
    where
        F: FnOnce() -> Value,
    {
        let key = filter.cache_key(endpoint);
        if let Some(hit) = self.cache.get(&key) {
            return Some(hit);
        }
        let value = compute();
        self.cache.insert(key, value.clone());
        Some(value)
    }

    // ---- Nine time-series shapes ----

    pub async fn timeseries_requests(&self, filter: &QueryFilter) -> Result<Value, LoadTestError> {
        let slices = self.metric_slices(filter, "http_reqs").await?;
        Ok(self
            .cached_or(filter, "requests", || {
                json!(slices.iter().map(|(t, s)| json!({"time": t, "requests": s.count})).collect::<Vec<_>>())
            })
            .unwrap())
    }

    pub async fn timeseries_rps(&self, filter: &QueryFilter) -> Result<Value, LoadTestError> {
        let slices = self.metric_slices(filter, "http_reqs").await?;
        let interval = filter.interval_secs.max(1) as f64;
        Ok(self
            .cached_or(filter, "rps", || {
                json!(slices
                    .iter()
                    .map(|(t, s)| json!({"time": t, "rps": round2(s.count as f64 / interval)}))
                    .collect::<Vec<_>>())
            })
            .unwrap())
    }

    pub async fn timeseries_iterations(&self, filter: &QueryFilter) -> Result<Value, LoadTestError> {
        let slices = self.metric_slices(filter, "iterations").await?;
        Ok(self
            .cached_or(filter, "iterations", || {
                json!(slices.iter().map(|(t, s)| json!({"time": t, "iterations": s.count})).collect::<Vec<_>>())
            })
            .unwrap())
    }

    pub async fn timeseries_vus(&self, filter: &QueryFilter) -> Result<Value, LoadTestError> {
        let slices = self.metric_slices(filter, "vus").await?;
        Ok(self
            .cached_or(filter, "vus", || {
                json!(slices.iter().map(|(t, s)| json!({"time": t, "vus": round2(s.avg_weighted)})).collect::<Vec<_>>())
            })
            .unwrap())
    }

    pub async fn timeseries_response_histogram(&self, filter: &QueryFilter) -> Result<Value, LoadTestError> {
        let slices = self.metric_slices(filter, "http_req_duration").await?;
        Ok(self
            .cached_or(filter, "response-histogram", || {
                json!(slices
                    .iter()
                    .map(|(t, s)| json!({"time": t, "avg_response": round2(s.avg_weighted)}))
                    .collect::<Vec<_>>())
            })
            .unwrap())
    }

    pub async fn timeseries_percentiles(&self, filter: &QueryFilter) -> Result<Value, LoadTestError> {
        let buckets = if self.is_long_range(filter) {
            self.percentile_points_from_summaries(filter).await?
        } else {
            self.percentile_buckets_from_rows(filter).await?
        };

        Ok(self
            .cached_or(filter, "percentiles", || {
                json!(buckets
                    .iter()
                    .map(|(t, (count, p50_sum, p90_sum, p95_sum))| {
                        let count = (*count).max(1) as f64;
                        json!({
                            "time": t,
                            "median": round2(p50_sum / count),
                            "p90": round2(p90_sum / count),
                            "p95": round2(p95_sum / count),
                        })
                    })
                    .collect::<Vec<_>>())
            })
            .unwrap())
    }

    async fn percentile_buckets_from_rows(&self, filter: &QueryFilter) -> Result<BTreeMap<i64, (i64, f64, f64, f64)>, LoadTestError> {
        let rows = self
            .store
            .query_aggregated_rows(&AggregatedRowQuery {
                test_id: filter.test_id,
                execution_id: None,
                metric_name: Some("http_req_duration".to_string()),
                from: filter.from,
                to: filter.to,
                summary_only: false,
            })
            .await?;

        let mut buckets: BTreeMap<i64, (i64, f64, f64, f64)> = BTreeMap::new();
        for row in rows {
            let Some(bucket_time) = row.bucket_time else { continue };
            let interval_start = (bucket_time.timestamp() / filter.interval_secs.max(1)) * filter.interval_secs.max(1);
            accumulate_percentile(&mut buckets, interval_start, &row);
        }
        Ok(buckets)
    }

    /// One data point per matching execution's completed time, keyed off
    /// each execution's global `http_req_duration` summary row - the
    /// long-range counterpart to [`Self::percentile_buckets_from_rows`].
    async fn percentile_points_from_summaries(&self, filter: &QueryFilter) -> Result<BTreeMap<i64, (i64, f64, f64, f64)>, LoadTestError> {
        let executions = self.executions_with_rows(filter).await?;
        let mut buckets: BTreeMap<i64, (i64, f64, f64, f64)> = BTreeMap::new();
        for (completed_at, rows) in &executions {
            for row in rows.iter().filter(|r| r.is_summary && r.tags.url.is_none() && r.metric_name == "http_req_duration") {
                accumulate_percentile(&mut buckets, completed_at.timestamp(), row);
            }
        }
        Ok(buckets)
    }

    pub async fn timeseries_errors(&self, filter: &QueryFilter) -> Result<Value, LoadTestError> {
        let buckets = self.error_counts(filter).await?;
        Ok(self
            .cached_or(filter, "errors", || {
                json!(buckets.iter().map(|(t, count)| json!({"time": t, "errors": count})).collect::<Vec<_>>())
            })
            .unwrap())
    }

    /// Per-time-bucket failure counts, auto-routed the same way every other
    /// time-series shape is: re-aggregated `http_reqs` bucket rows for short
    /// ranges, one point per execution's failing-endpoint summary rows for
    /// long ranges.
    async fn error_counts(&self, filter: &QueryFilter) -> Result<BTreeMap<i64, i64>, LoadTestError> {
        if self.is_long_range(filter) {
            let executions = self.executions_with_rows(filter).await?;
            let mut buckets: BTreeMap<i64, i64> = BTreeMap::new();
            for (completed_at, rows) in &executions {
                let failures: i64 = rows
                    .iter()
                    .filter(|r| r.is_summary && r.tags.url.is_some() && r.metric_name == "http_reqs" && r.tags.is_failure())
                    .map(|r| r.count)
                    .sum();
                if failures > 0 {
                    *buckets.entry(completed_at.timestamp()).or_default() += failures;
                }
            }
            return Ok(buckets);
        }

        let rows = self
            .store
            .query_aggregated_rows(&AggregatedRowQuery {
                test_id: filter.test_id,
                execution_id: None,
                metric_name: Some("http_reqs".to_string()),
                from: filter.from,
                to: filter.to,
                summary_only: false,
            })
            .await?;

        let mut buckets: BTreeMap<i64, i64> = BTreeMap::new();
        for row in rows.iter().filter(|r| r.tags.is_failure()) {
            let Some(bucket_time) = row.bucket_time else { continue };
            let interval_start = (bucket_time.timestamp() / filter.interval_secs.max(1)) * filter.interval_secs.max(1);
            *buckets.entry(interval_start).or_default() += row.count;
        }
        Ok(buckets)
    }

    pub async fn timeseries_req_per_vu(&self, filter: &QueryFilter) -> Result<Value, LoadTestError> {
        let requests = self.metric_slices(filter, "http_reqs").await?;
        let vus = self.metric_slices(filter, "vus").await?;
        Ok(self
            .cached_or(filter, "req-per-vu", || {
                json!(requests
                    .iter()
                    .map(|(t, s)| {
                        let vus_at_t = vus.get(t).map(|v| v.avg_weighted).unwrap_or(0.0).max(1.0);
                        json!({"time": t, "req_per_vu": round2(s.count as f64 / vus_at_t)})
                    })
                    .collect::<Vec<_>>())
            })
            .unwrap())
    }

    pub async fn timeseries_all(&self, filter: &QueryFilter) -> Result<Value, LoadTestError> {
        let requests = self.metric_slices(filter, "http_reqs").await?;
        let durations = self.metric_slices(filter, "http_req_duration").await?;
        let iterations = self.metric_slices(filter, "iterations").await?;
        let failures = self.error_counts(filter).await?;
        let interval = filter.interval_secs.max(1) as f64;

        let mut times: Vec<i64> = requests
            .keys()
            .chain(durations.keys())
            .chain(iterations.keys())
            .chain(failures.keys())
            .copied()
            .collect();
        times.sort_unstable();
        times.dedup();

        Ok(self
            .cached_or(filter, "all", || {
                json!(times
                    .iter()
                    .map(|t| {
                        let req = requests.get(t).copied().unwrap_or_default();
                        let dur = durations.get(t).copied().unwrap_or_default();
                        let iter = iterations.get(t).copied().unwrap_or_default();
                        let fail = failures.get(t).copied().unwrap_or_default();
                        json!({
                            "time": t,
                            "requests": req.count,
                            "rps": round2(req.count as f64 / interval),
                            "iterations": iter.count,
                            "response_time": round2(dur.avg_weighted),
                            "failures": fail,
                        })
                    })
                    .collect::<Vec<_>>())
            })
            .unwrap())
    }

    // ---- Table endpoints ----

    pub async fn http_table(&self, filter: &QueryFilter) -> Result<Value, LoadTestError> {
        let rows = self
            .store
            .query_aggregated_rows(&AggregatedRowQuery {
                test_id: filter.test_id,
                execution_id: None,
                metric_name: Some("http_req_duration".to_string()),
                from: filter.from,
                to: filter.to,
                summary_only: true,
            })
            .await?
            .into_iter()
            .filter(|r| r.tags.url.is_some())
            .collect::<Vec<_>>();

        let mut table: Vec<Value> = rows
            .into_iter()
            .map(|r| {
                json!({
                    "url": r.tags.url,
                    "method": r.tags.method,
                    "status": r.tags.status,
                    "count": r.count,
                    "avg_ms": round2(r.avg),
                    "min_ms": round2(r.min),
                    "max_ms": round2(r.max),
                    "p90_ms": round2(r.p90),
                    "p95_ms": round2(r.p95),
                    "p99_ms": round2(r.p99),
                })
            })
            .collect();
        table.sort_by(|a, b| b["count"].as_i64().cmp(&a["count"].as_i64()));
        Ok(json!(table))
    }

    pub async fn errors_table(&self, filter: &QueryFilter) -> Result<Value, LoadTestError> {
        let rows = self
            .store
            .query_aggregated_rows(&AggregatedRowQuery {
                test_id: filter.test_id,
                execution_id: None,
                metric_name: Some("http_reqs".to_string()),
                from: filter.from,
                to: filter.to,
                summary_only: true,
            })
            .await?
            .into_iter()
            .filter(|r| r.tags.url.is_some() && r.tags.is_failure())
            .collect::<Vec<_>>();

        let mut table: Vec<Value> = rows
            .into_iter()
            .map(|r| {
                json!({
                    "url": r.tags.url,
                    "method": r.tags.method,
                    "status": r.tags.status,
                    "count": r.count,
                })
            })
            .collect();
        table.sort_by(|a, b| b["count"].as_i64().cmp(&a["count"].as_i64()));
        Ok(json!(table))
    }

    // ---- Dashboard summaries / consolidated stats ----

    pub async fn dashboard_overview(&self, filter: &QueryFilter) -> Result<Value, LoadTestError> {
        let requests = self
            .store
            .query_aggregated_rows(&AggregatedRowQuery {
                test_id: filter.test_id,
                execution_id: None,
                metric_name: Some("http_reqs".to_string()),
                from: filter.from,
                to: filter.to,
                summary_only: true,
            })
            .await?
            .into_iter()
            .filter(|r| r.tags.url.is_none())
            .collect::<Vec<_>>();

        let durations = self
            .store
            .query_aggregated_rows(&AggregatedRowQuery {
                test_id: filter.test_id,
                execution_id: None,
                metric_name: Some("http_req_duration".to_string()),
                from: filter.from,
                to: filter.to,
                summary_only: true,
            })
            .await?
            .into_iter()
            .filter(|r| r.tags.url.is_none())
            .collect::<Vec<_>>();

        Ok(json!(overview_from_rows(&requests, &durations)))
    }

    /// Consolidated stats for a single execution - same shape as the
    /// dashboard overview, scoped by `execution_id` instead of aggregated
    /// across a test's executions.
    pub async fn stats_for_execution(&self, execution_id: loadtest_domain::ExecutionId) -> Result<Value, LoadTestError> {
        let rows = self.store.aggregated_rows_for_execution(execution_id).await?;
        let requests: Vec<_> = rows
            .iter()
            .filter(|r| r.is_summary && r.tags.url.is_none() && r.metric_name == "http_reqs")
            .cloned()
            .collect();
        let durations: Vec<_> = rows
            .iter()
            .filter(|r| r.is_summary && r.tags.url.is_none() && r.metric_name == "http_req_duration")
            .cloned()
            .collect();
        Ok(json!(overview_from_rows(&requests, &durations)))
    }

    // ---- Variable-list endpoints ----

    /// Distinct test ids visible to `user_id` (or all tests, for an admin
    /// dashboard view). No domain entity is modeled in this core (§1
    /// scopes per-entity CRUD beyond execution/schedule lifecycle out), so
    /// `/variables/domains` always returns an empty list.
    pub async fn variable_tests(&self, user_id: Option<UserId>) -> Result<Value, LoadTestError> {
        let executions = self
            .store
            .list_executions(&ExecutionFilter {
                user_id,
                test_id: None,
                status: None,
                page: 1,
                page_size: 10_000,
            })
            .await?;
        let mut tests: Vec<String> = executions.iter().map(|e| e.test_id.to_string()).collect();
        tests.sort();
        tests.dedup();
        Ok(json!(tests))
    }

    pub fn variable_domains(&self) -> Value {
        json!(Vec::<String>::new())
    }
}

fn accumulate_percentile(buckets: &mut BTreeMap<i64, (i64, f64, f64, f64)>, key: i64, row: &AggregatedMetricRow) {
    let entry = buckets.entry(key).or_insert((0, 0.0, 0.0, 0.0));
    let weight = row.count as f64;
    entry.1 += row.p50 * weight;
    entry.2 += row.p90 * weight;
    entry.3 += row.p95 * weight;
    entry.0 += row.count;
}

fn combine_into(slot: &mut Slice, row: &AggregatedMetricRow) {
    let prior_count = slot.count as f64;
    let new_count = row.count as f64;
    let total_count = prior_count + new_count;
    if total_count > 0.0 {
        slot.avg_weighted = (slot.avg_weighted * prior_count + row.avg * new_count) / total_count;
    }
    slot.count += row.count;
    slot.sum += row.sum;
    slot.min = if slot.count == row.count { row.min } else { slot.min.min(row.min) };
    slot.max = slot.max.max(row.max);
}

#[derive(Serialize)]
struct Overview {
    total_requests: i64,
    total_failures: i64,
    error_rate: f64,
    success_rate: f64,
    avg_response_ms: f64,
    p95_response_ms: f64,
    total_data_points: i64,
}

fn overview_from_rows(requests: &[AggregatedMetricRow], durations: &[AggregatedMetricRow]) -> Overview {
    let total_requests: i64 = requests.iter().map(|r| r.count).sum();
    let total_failures: i64 = requests.iter().filter(|r| r.tags.is_failure()).map(|r| r.count).sum();
    let error_rate = if total_requests == 0 { 0.0 } else { (total_failures as f64 / total_requests as f64) * 100.0 };
    let success_rate = 100.0 - error_rate;

    let duration_count: i64 = durations.iter().map(|r| r.count).sum();
    let avg_response_ms = if duration_count == 0 {
        0.0
    } else {
        durations.iter().map(|r| r.avg * r.count as f64).sum::<f64>() / duration_count as f64
    };
    let p95_response_ms = if duration_count == 0 {
        0.0
    } else {
        durations.iter().map(|r| r.p95 * r.count as f64).sum::<f64>() / duration_count as f64
    };

    Overview {
        total_requests,
        total_failures,
        error_rate: round2(error_rate),
        success_rate: round2(success_rate),
        avg_response_ms: round2(avg_response_ms),
        p95_response_ms: round2(p95_response_ms),
        total_data_points: total_requests + duration_count,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::NullStore;
    use loadtest_domain::{Execution, RunDuration, Vus};

    fn service() -> MetricsQueryService {
        let store: Arc<dyn MetricStore> = Arc::new(NullStore::default());
        MetricsQueryService::new(store, AppConfig::default())
    }

    /// A service over a long-range window (past the 12h default threshold),
    /// backed by an execution that completed inside that window and carries
    /// both a global-summary and an endpoint-summary `http_reqs`/
    /// `http_req_duration` row - enough to exercise every long-range
    /// auto-routing path.
    fn service_with_long_range_execution() -> (MetricsQueryService, QueryFilter) {
        let store = Arc::new(NullStore::default());
        let now = chrono::Utc::now();
        let completed_at = now - chrono::Duration::days(2);

        let execution = Execution::new_queued(TestId::new(), UserId::new(), None, Vus::new(1), RunDuration::parse_lenient("30s"), completed_at);
        let test_id = execution.test_id;
        let execution_id = execution.id;
        store.executions.lock().insert(execution_id, execution);
        {
            let mut executions = store.executions.lock();
            let exec = executions.get_mut(&execution_id).unwrap();
            exec.completed_at = Some(completed_at);
        }

        let global_summary = AggregatedMetricRow {
            execution_id,
            test_id,
            bucket_time: None,
            metric_name: "http_reqs".to_string(),
            tags: loadtest_domain::MetricTags::default(),
            count: 10,
            sum: 10.0,
            avg: 1.0,
            min: 1.0,
            max: 1.0,
            p50: 100.0,
            p90: 150.0,
            p95: 180.0,
            p99: 200.0,
            is_summary: true,
        };
        let endpoint_summary = AggregatedMetricRow {
            execution_id,
            test_id,
            bucket_time: None,
            metric_name: "http_reqs".to_string(),
            tags: loadtest_domain::MetricTags {
                method: Some("GET".to_string()),
                status: Some("500".to_string()),
                url: Some("/widgets".to_string()),
                scenario: None,
            },
            count: 3,
            sum: 3.0,
            avg: 1.0,
            min: 1.0,
            max: 1.0,
            p50: 120.0,
            p90: 160.0,
            p95: 190.0,
            p99: 210.0,
            is_summary: true,
        };
        let duration_summary = AggregatedMetricRow {
            metric_name: "http_req_duration".to_string(),
            ..global_summary.clone()
        };
        store.aggregated_rows.lock().insert(execution_id, vec![global_summary, endpoint_summary, duration_summary]);

        let filter = QueryFilter {
            test_id: Some(test_id),
            from: now - chrono::Duration::days(3),
            to: now,
            interval_secs: 5,
        };
        let service = MetricsQueryService::new(store, AppConfig::default());
        assert!(service.is_long_range(&filter));
        (service, filter)
    }

    #[tokio::test]
    async fn long_range_percentiles_routes_off_completed_at() {
        let (service, filter) = service_with_long_range_execution();
        let result = service.timeseries_percentiles(&filter).await.unwrap();
        assert_ne!(result, json!([]), "long-range percentiles must not discard summary rows with no bucket_time");
    }

    #[tokio::test]
    async fn long_range_errors_counts_endpoint_summary_failures() {
        let (service, filter) = service_with_long_range_execution();
        let result = service.timeseries_errors(&filter).await.unwrap();
        let points = result.as_array().unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0]["errors"], json!(3));
    }

    #[tokio::test]
    async fn long_range_all_reports_real_failures() {
        let (service, filter) = service_with_long_range_execution();
        let result = service.timeseries_all(&filter).await.unwrap();
        let points = result.as_array().unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0]["failures"], json!(3));
    }

    #[tokio::test]
    async fn requests_timeseries_is_empty_with_no_data() {
        let service = service();
        let filter = QueryFilter {
            test_id: None,
            from: chrono::Utc::now() - chrono::Duration::hours(1),
            to: chrono::Utc::now(),
            interval_secs: 5,
        };
        let result = service.timeseries_requests(&filter).await.unwrap();
        assert_eq!(result, json!([]));
    }

    #[test]
    fn overview_handles_zero_requests() {
        let overview = overview_from_rows(&[], &[]);
        assert_eq!(overview.error_rate, 0.0);
        assert_eq!(overview.success_rate, 100.0);
    }

    #[tokio::test]
    async fn variable_domains_is_always_empty() {
        let service = service();
        assert_eq!(service.variable_domains(), json!(Vec::<String>::new()));
    }

    #[tokio::test]
    async fn variable_tests_lists_distinct_test_ids() {
        let service = service();
        let test_id = TestId::new();
        let user_id = UserId::new();
        let execution = Execution::new_queued(test_id, user_id, None, Vus::new(1), RunDuration::parse_lenient("1s"), chrono::Utc::now());
        service.store.create_execution(&execution).await.unwrap();

        let result = service.variable_tests(None).await.unwrap();
        assert_eq!(result, json!([test_id.to_string()]));
    }
}
