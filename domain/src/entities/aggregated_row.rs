//! Aggregated metric row (§3). Three row families share one table shape,
//! distinguished by `is_summary` and whether `tags.url` is present:
//!
//! - bucket row: `is_summary = false`, one row per (execution, metric,
//!   tag-tuple, second).
//! - global summary: `is_summary = true`, `tags.url = None`, one row per
//!   (execution, metric).
//! - endpoint summary: `is_summary = true`, `tags.url = Some(_)`, one row
//!   per (execution, metric, url, method, status).

use crate::value_objects::{ExecutionId, MetricTags, TestId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFamily {
    Bucket,
    GlobalSummary,
    EndpointSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedMetricRow {
    pub execution_id: ExecutionId,
    pub test_id: TestId,
    pub bucket_time: Option<DateTime<Utc>>,
    pub metric_name: String,
    pub tags: MetricTags,
    pub count: i64,
    pub sum: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub is_summary: bool,
}

impl AggregatedMetricRow {
    pub fn family(&self) -> RowFamily {
        if !self.is_summary {
            RowFamily::Bucket
        } else if self.tags.url.is_some() {
            RowFamily::EndpointSummary
        } else {
            RowFamily::GlobalSummary
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(is_summary: bool, url: Option<&str>) -> AggregatedMetricRow {
        AggregatedMetricRow {
            execution_id: ExecutionId::new(),
            test_id: TestId::new(),
            bucket_time: None,
            metric_name: "http_reqs".into(),
            tags: MetricTags {
                url: url.map(|s| s.to_string()),
                ..Default::default()
            },
            count: 1,
            sum: 1.0,
            avg: 1.0,
            min: 1.0,
            max: 1.0,
            p50: 1.0,
            p90: 1.0,
            p95: 1.0,
            p99: 1.0,
            is_summary,
        }
    }

    #[test]
    fn classifies_row_families() {
        assert_eq!(row(false, None).family(), RowFamily::Bucket);
        assert_eq!(row(true, None).family(), RowFamily::GlobalSummary);
        assert_eq!(row(true, Some("/api")).family(), RowFamily::EndpointSummary);
    }
}
