//! Raw metric point (§3): append-only, deleted en masse by the aggregator
//! or by execution delete.

use crate::value_objects::{ExecutionId, MetricTags, TestId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMetricPoint {
    pub execution_id: ExecutionId,
    pub test_id: TestId,
    pub metric_name: String,
    /// Microseconds since the Unix epoch.
    pub timestamp_micros: i64,
    pub value: f64,
    pub tags: MetricTags,
}
