//! # CSV metric ingester
//!
//! Streams a load generator's CSV output into the store in fixed-size
//! batches. Required columns: `metric_name`, `timestamp`, `metric_value`.
//! Optional tag columns: `method`, `status`, `url`, `scenario`. Tolerant of
//! lazy quoting and variable field counts (`flexible(true)`); any row that
//! can't produce a point is skipped rather than aborting the ingest.

use loadtest_domain::value_objects::timestamp::parse_timestamp_micros;
use loadtest_domain::{ExecutionId, LoadTestError, MetricStore, MetricTags, RawMetricPoint, TestId};
use std::io::Read;
use std::path::Path;

const BATCH_SIZE: usize = 1000;

/// Stream-parses `path` and bulk-inserts every valid point into `store`.
/// Returns the total number of points inserted.
pub async fn ingest_file(
    store: &dyn MetricStore,
    execution_id: ExecutionId,
    test_id: TestId,
    path: &Path,
) -> Result<u64, LoadTestError> {
    let file = std::fs::File::open(path)?;
    ingest_reader(store, execution_id, test_id, file).await
}

async fn ingest_reader<R: Read>(
    store: &dyn MetricStore,
    execution_id: ExecutionId,
    test_id: TestId,
    reader: R,
) -> Result<u64, LoadTestError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).has_headers(true).from_reader(reader);

    let headers = csv_reader.headers().map_err(|e| LoadTestError::upstream_io(format!("csv header read: {e}")))?.clone();
    let metric_name_idx = headers.iter().position(|h| h == "metric_name");
    let timestamp_idx = headers.iter().position(|h| h == "timestamp");
    let value_idx = headers.iter().position(|h| h == "metric_value");
    let method_idx = headers.iter().position(|h| h == "method");
    let status_idx = headers.iter().position(|h| h == "status");
    let url_idx = headers.iter().position(|h| h == "url");
    let scenario_idx = headers.iter().position(|h| h == "scenario");

    let (Some(metric_name_idx), Some(timestamp_idx), Some(value_idx)) = (metric_name_idx, timestamp_idx, value_idx) else {
        return Err(LoadTestError::validation("csv is missing a required column"));
    };

    let mut total: u64 = 0;
    let mut batch: Vec<RawMetricPoint> = Vec::with_capacity(BATCH_SIZE);

    for record in csv_reader.records() {
        let Ok(record) = record else { continue };

        let Some(point) = parse_row(
            &record,
            execution_id,
            test_id,
            metric_name_idx,
            timestamp_idx,
            value_idx,
            method_idx,
            status_idx,
            url_idx,
            scenario_idx,
        ) else {
            continue;
        };

        batch.push(point);
        if batch.len() >= BATCH_SIZE {
            total += batch.len() as u64;
            store.insert_raw_points(&batch).await?;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        total += batch.len() as u64;
        store.insert_raw_points(&batch).await?;
    }

    Ok(total)
}

#[allow(clippy::too_many_arguments)]
fn parse_row(
    record: &csv::StringRecord,
    execution_id: ExecutionId,
    test_id: TestId,
    metric_name_idx: usize,
    timestamp_idx: usize,
    value_idx: usize,
    method_idx: Option<usize>,
    status_idx: Option<usize>,
    url_idx: Option<usize>,
    scenario_idx: Option<usize>,
) -> Option<RawMetricPoint> {
    let metric_name = record.get(metric_name_idx)?.trim();
    if metric_name.is_empty() {
        return None;
    }

    let timestamp_micros = parse_timestamp_micros(record.get(timestamp_idx)?)?;
    let value: f64 = record.get(value_idx)?.trim().parse().ok()?;

    let tags = MetricTags {
        method: method_idx.and_then(|i| record.get(i)).filter(|s| !s.is_empty()).map(str::to_string),
        status: status_idx.and_then(|i| record.get(i)).filter(|s| !s.is_empty()).map(str::to_string),
        url: url_idx.and_then(|i| record.get(i)).filter(|s| !s.is_empty()).map(str::to_string),
        scenario: scenario_idx.and_then(|i| record.get(i)).filter(|s| !s.is_empty()).map(str::to_string),
    };

    Some(RawMetricPoint {
        execution_id,
        test_id,
        metric_name: metric_name.to_string(),
        timestamp_micros,
        value,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use loadtest_domain::{AggregatedMetricRow, AggregatedRowQuery, Execution, ExecutionFilter, Schedule, ScheduleId, UserId};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingStore {
        inserted: Arc<Mutex<Vec<RawMetricPoint>>>,
    }

    #[async_trait]
    impl MetricStore for RecordingStore {
        async fn create_execution(&self, _e: &Execution) -> Result<(), LoadTestError> {
            Ok(())
        }
        async fn get_execution(&self, _id: ExecutionId) -> Result<Option<Execution>, LoadTestError> {
            Ok(None)
        }
        async fn update_execution(&self, _e: &Execution) -> Result<(), LoadTestError> {
            Ok(())
        }
        async fn delete_execution(&self, _id: ExecutionId) -> Result<(), LoadTestError> {
            Ok(())
        }
        async fn list_executions(&self, _f: &ExecutionFilter) -> Result<Vec<Execution>, LoadTestError> {
            Ok(vec![])
        }
        async fn count_executions(&self, _f: &ExecutionFilter) -> Result<i64, LoadTestError> {
            Ok(0)
        }
        async fn create_schedule(&self, _s: &Schedule) -> Result<(), LoadTestError> {
            Ok(())
        }
        async fn get_schedule(&self, _id: ScheduleId) -> Result<Option<Schedule>, LoadTestError> {
            Ok(None)
        }
        async fn update_schedule(&self, _s: &Schedule) -> Result<(), LoadTestError> {
            Ok(())
        }
        async fn delete_schedule(&self, _id: ScheduleId) -> Result<(), LoadTestError> {
            Ok(())
        }
        async fn list_schedules(&self, _u: Option<UserId>) -> Result<Vec<Schedule>, LoadTestError> {
            Ok(vec![])
        }
        async fn count_running_by_user(&self, _u: UserId) -> Result<i64, LoadTestError> {
            Ok(0)
        }
        async fn mark_orphans_failed(&self, _now: chrono::DateTime<chrono::Utc>) -> Result<u64, LoadTestError> {
            Ok(0)
        }
        async fn get_due_schedules(&self, _now: chrono::DateTime<chrono::Utc>) -> Result<Vec<Schedule>, LoadTestError> {
            Ok(vec![])
        }
        async fn insert_raw_points(&self, points: &[RawMetricPoint]) -> Result<(), LoadTestError> {
            self.inserted.lock().extend_from_slice(points);
            Ok(())
        }
        async fn raw_points_for_execution(&self, _id: ExecutionId) -> Result<Vec<RawMetricPoint>, LoadTestError> {
            Ok(self.inserted.lock().clone())
        }
        async fn aggregated_rows_for_execution(&self, _id: ExecutionId) -> Result<Vec<AggregatedMetricRow>, LoadTestError> {
            Ok(vec![])
        }
        async fn query_aggregated_rows(&self, _q: &AggregatedRowQuery) -> Result<Vec<AggregatedMetricRow>, LoadTestError> {
            Ok(vec![])
        }
        async fn aggregate_execution(&self, _id: ExecutionId) -> Result<(), LoadTestError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn skips_empty_metric_name_and_unparseable_rows() {
        let csv_data = "metric_name,timestamp,metric_value,method,status\n\
                         http_reqs,1700000000,1,GET,200\n\
                         ,1700000001,1,GET,200\n\
                         http_reqs,not-a-timestamp,1,GET,200\n\
                         http_reqs,1700000002,not-a-number,GET,200\n\
                         http_req_duration,1700000003,150,GET,200\n";
        let store = RecordingStore::default();
        let total = ingest_reader(&store, ExecutionId::new(), TestId::new(), csv_data.as_bytes())
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(store.inserted.lock().len(), 2);
    }

    #[tokio::test]
    async fn missing_required_column_errors() {
        let csv_data = "foo,bar\n1,2\n";
        let store = RecordingStore::default();
        let result = ingest_reader(&store, ExecutionId::new(), TestId::new(), csv_data.as_bytes()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn flushes_batches_at_threshold() {
        let mut csv_data = String::from("metric_name,timestamp,metric_value\n");
        for i in 0..2500 {
            csv_data.push_str(&format!("http_reqs,{},1\n", 1_700_000_000 + i));
        }
        let store = RecordingStore::default();
        let total = ingest_reader(&store, ExecutionId::new(), TestId::new(), csv_data.as_bytes())
            .await
            .unwrap();
        assert_eq!(total, 2500);
    }
}
