//! # Metric store port
//!
//! The infrastructure-facing boundary (§4.B): a transactional store for
//! executions, schedules, raw points, and aggregated rows. Domain code and
//! application use cases depend only on this trait; `core` provides the
//! Postgres-backed implementation.

use crate::entities::{AggregatedMetricRow, Execution, RawMetricPoint, Schedule};
use crate::error::LoadTestError;
use crate::value_objects::{ExecutionId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait MetricStore: Send + Sync {
    async fn create_execution(&self, execution: &Execution) -> Result<(), LoadTestError>;
    async fn get_execution(&self, id: ExecutionId) -> Result<Option<Execution>, LoadTestError>;
    async fn update_execution(&self, execution: &Execution) -> Result<(), LoadTestError>;
    async fn delete_execution(&self, id: ExecutionId) -> Result<(), LoadTestError>;
    async fn list_executions(&self, filter: &ExecutionFilter) -> Result<Vec<Execution>, LoadTestError>;

    /// Total executions matching `filter`'s user/test/status predicates,
    /// ignoring its page/page_size - backs the control surface's
    /// `{total, page, page_size, total_pages}` pagination envelope.
    async fn count_executions(&self, filter: &ExecutionFilter) -> Result<i64, LoadTestError>;

    async fn create_schedule(&self, schedule: &Schedule) -> Result<(), LoadTestError>;
    async fn get_schedule(&self, id: crate::entities::ScheduleId) -> Result<Option<Schedule>, LoadTestError>;
    async fn update_schedule(&self, schedule: &Schedule) -> Result<(), LoadTestError>;
    async fn delete_schedule(&self, id: crate::entities::ScheduleId) -> Result<(), LoadTestError>;
    async fn list_schedules(&self, user_id: Option<UserId>) -> Result<Vec<Schedule>, LoadTestError>;

    /// Counts executions of `user` currently in {queued, running}.
    async fn count_running_by_user(&self, user_id: UserId) -> Result<i64, LoadTestError>;

    /// Moves every {queued, running} execution to `failed` ("server
    /// restarted") and returns how many were so marked. Called once at
    /// supervisor startup.
    async fn mark_orphans_failed(&self, now: DateTime<Utc>) -> Result<u64, LoadTestError>;

    /// All `active` schedules whose `next_run_at <= now`.
    async fn get_due_schedules(&self, now: DateTime<Utc>) -> Result<Vec<Schedule>, LoadTestError>;

    /// All-or-nothing bulk insert of raw points.
    async fn insert_raw_points(&self, points: &[RawMetricPoint]) -> Result<(), LoadTestError>;

    async fn raw_points_for_execution(&self, execution_id: ExecutionId) -> Result<Vec<RawMetricPoint>, LoadTestError>;

    async fn aggregated_rows_for_execution(
        &self,
        execution_id: ExecutionId,
    ) -> Result<Vec<AggregatedMetricRow>, LoadTestError>;

    async fn query_aggregated_rows(&self, query: &AggregatedRowQuery) -> Result<Vec<AggregatedMetricRow>, LoadTestError>;

    /// Idempotent aggregation routine (§4.B step ii-vi): delete prior
    /// aggregated rows for `execution_id`, insert bucket / global-summary /
    /// endpoint-summary rows from the execution's raw points, then delete
    /// the raw points. Runs inside a single transaction.
    async fn aggregate_execution(&self, execution_id: ExecutionId) -> Result<(), LoadTestError>;
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionFilter {
    pub user_id: Option<UserId>,
    pub test_id: Option<crate::value_objects::TestId>,
    pub status: Option<crate::entities::ExecutionStatus>,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone)]
pub struct AggregatedRowQuery {
    pub test_id: Option<crate::value_objects::TestId>,
    pub execution_id: Option<ExecutionId>,
    pub metric_name: Option<String>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub summary_only: bool,
}
