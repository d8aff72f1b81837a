//! Shared `MetricStore` test double. Not built outside `#[cfg(test)]`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loadtest_domain::entities::ScheduleId;
use loadtest_domain::{AggregatedMetricRow, AggregatedRowQuery, Execution, ExecutionFilter, ExecutionId, LoadTestError, MetricStore, RawMetricPoint, Schedule, UserId};
use parking_lot::Mutex;
use std::collections::HashMap;

/// An in-memory `MetricStore` sufficient for exercising application-layer
/// logic without a database. Not a behavioral model of aggregation.
#[derive(Default)]
pub struct NullStore {
    pub executions: Mutex<HashMap<ExecutionId, Execution>>,
    pub schedules: Mutex<HashMap<ScheduleId, Schedule>>,
    pub raw_points: Mutex<HashMap<ExecutionId, Vec<RawMetricPoint>>>,
    pub aggregated_rows: Mutex<HashMap<ExecutionId, Vec<AggregatedMetricRow>>>,
}

#[async_trait]
impl MetricStore for NullStore {
    async fn create_execution(&self, execution: &Execution) -> Result<(), LoadTestError> {
        self.executions.lock().insert(execution.id, execution.clone());
        Ok(())
    }

    async fn get_execution(&self, id: ExecutionId) -> Result<Option<Execution>, LoadTestError> {
        Ok(self.executions.lock().get(&id).cloned())
    }

    async fn update_execution(&self, execution: &Execution) -> Result<(), LoadTestError> {
        self.executions.lock().insert(execution.id, execution.clone());
        Ok(())
    }

    async fn delete_execution(&self, id: ExecutionId) -> Result<(), LoadTestError> {
        self.executions.lock().remove(&id);
        self.raw_points.lock().remove(&id);
        Ok(())
    }

    async fn list_executions(&self, filter: &ExecutionFilter) -> Result<Vec<Execution>, LoadTestError> {
        Ok(self
            .executions
            .lock()
            .values()
            .filter(|e| filter.user_id.is_none_or(|u| u == e.user_id))
            .filter(|e| filter.test_id.is_none_or(|t| t == e.test_id))
            .filter(|e| filter.status.is_none_or(|s| s == e.status))
            .cloned()
            .collect())
    }

    async fn count_executions(&self, filter: &ExecutionFilter) -> Result<i64, LoadTestError> {
        Ok(self.list_executions(filter).await?.len() as i64)
    }

    async fn create_schedule(&self, schedule: &Schedule) -> Result<(), LoadTestError> {
        self.schedules.lock().insert(schedule.id, schedule.clone());
        Ok(())
    }

    async fn get_schedule(&self, id: ScheduleId) -> Result<Option<Schedule>, LoadTestError> {
        Ok(self.schedules.lock().get(&id).cloned())
    }

    async fn update_schedule(&self, schedule: &Schedule) -> Result<(), LoadTestError> {
        self.schedules.lock().insert(schedule.id, schedule.clone());
        Ok(())
    }

    async fn delete_schedule(&self, id: ScheduleId) -> Result<(), LoadTestError> {
        self.schedules.lock().remove(&id);
        Ok(())
    }

    async fn list_schedules(&self, user_id: Option<UserId>) -> Result<Vec<Schedule>, LoadTestError> {
        Ok(self
            .schedules
            .lock()
            .values()
            .filter(|s| user_id.is_none_or(|u| u == s.user_id))
            .cloned()
            .collect())
    }

    async fn count_running_by_user(&self, user_id: UserId) -> Result<i64, LoadTestError> {
        Ok(self
            .executions
            .lock()
            .values()
            .filter(|e| e.user_id == user_id && e.status.is_in_flight())
            .count() as i64)
    }

    async fn mark_orphans_failed(&self, now: DateTime<Utc>) -> Result<u64, LoadTestError> {
        let mut count = 0;
        for execution in self.executions.lock().values_mut() {
            if execution.status.is_in_flight() {
                execution.status = loadtest_domain::ExecutionStatus::Failed;
                execution.error_message = Some("server restarted".to_string());
                execution.completed_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn get_due_schedules(&self, now: DateTime<Utc>) -> Result<Vec<Schedule>, LoadTestError> {
        Ok(self.schedules.lock().values().filter(|s| s.is_due(now)).cloned().collect())
    }

    async fn insert_raw_points(&self, points: &[RawMetricPoint]) -> Result<(), LoadTestError> {
        for point in points {
            self.raw_points.lock().entry(point.execution_id).or_default().push(point.clone());
        }
        Ok(())
    }

    async fn raw_points_for_execution(&self, execution_id: ExecutionId) -> Result<Vec<RawMetricPoint>, LoadTestError> {
        Ok(self.raw_points.lock().get(&execution_id).cloned().unwrap_or_default())
    }

    async fn aggregated_rows_for_execution(&self, execution_id: ExecutionId) -> Result<Vec<AggregatedMetricRow>, LoadTestError> {
        Ok(self.aggregated_rows.lock().get(&execution_id).cloned().unwrap_or_default())
    }

    async fn query_aggregated_rows(&self, query: &AggregatedRowQuery) -> Result<Vec<AggregatedMetricRow>, LoadTestError> {
        Ok(self
            .aggregated_rows
            .lock()
            .values()
            .flatten()
            .filter(|r| r.is_summary == query.summary_only)
            .filter(|r| query.test_id.is_none_or(|t| t == r.test_id))
            .filter(|r| query.execution_id.is_none_or(|e| e == r.execution_id))
            .filter(|r| query.metric_name.as_deref().is_none_or(|m| m == r.metric_name))
            .filter(|r| query.summary_only || r.bucket_time.is_none_or(|bt| bt >= query.from && bt <= query.to))
            .cloned()
            .collect())
    }

    async fn aggregate_execution(&self, execution_id: ExecutionId) -> Result<(), LoadTestError> {
        self.raw_points.lock().remove(&execution_id);
        Ok(())
    }
}
