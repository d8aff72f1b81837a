// /////////////////////////////////////////////////////////////////////////////
// Load Test Orchestration Platform
// /////////////////////////////////////////////////////////////////////////////

//! Postgres-backed implementation of [`loadtest_domain::MetricStore`].
//!
//! Uses dynamic `sqlx::query`/`query_scalar` (no compile-time macros, since
//! no `DATABASE_URL` is available at build time) against a connection pool.
//! The aggregation routine (§4.B steps ii-vi) runs inside a single
//! transaction to preserve the raw-xor-aggregated invariant on failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loadtest_domain::entities::{ExecutionStatus, RowFamily, ScheduleKind, ScheduleStatus};
use loadtest_domain::{
    AggregatedMetricRow, AggregatedRowQuery, Execution, ExecutionFilter, ExecutionId, LoadTestError, MetricStore,
    RawMetricPoint, RunDuration, Schedule, ScheduleId, UserId, Vus,
};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

pub struct PostgresMetricStore {
    pool: PgPool,
}

impl PostgresMetricStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_to_str(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::Queued => "queued",
        ExecutionStatus::Running => "running",
        ExecutionStatus::Completed => "completed",
        ExecutionStatus::Failed => "failed",
        ExecutionStatus::Cancelled => "cancelled",
        ExecutionStatus::Timeout => "timeout",
    }
}

fn status_from_str(s: &str) -> Result<ExecutionStatus, LoadTestError> {
    Ok(match s {
        "queued" => ExecutionStatus::Queued,
        "running" => ExecutionStatus::Running,
        "completed" => ExecutionStatus::Completed,
        "failed" => ExecutionStatus::Failed,
        "cancelled" => ExecutionStatus::Cancelled,
        "timeout" => ExecutionStatus::Timeout,
        other => return Err(LoadTestError::internal(format!("unknown execution status in store: {other}"))),
    })
}

fn schedule_kind_to_str(kind: ScheduleKind) -> &'static str {
    match kind {
        ScheduleKind::Once => "once",
        ScheduleKind::Recurring => "recurring",
    }
}

fn schedule_kind_from_str(s: &str) -> Result<ScheduleKind, LoadTestError> {
    Ok(match s {
        "once" => ScheduleKind::Once,
        "recurring" => ScheduleKind::Recurring,
        other => return Err(LoadTestError::internal(format!("unknown schedule kind in store: {other}"))),
    })
}

fn schedule_status_to_str(status: ScheduleStatus) -> &'static str {
    match status {
        ScheduleStatus::Active => "active",
        ScheduleStatus::Paused => "paused",
        ScheduleStatus::Completed => "completed",
        ScheduleStatus::Cancelled => "cancelled",
    }
}

fn schedule_status_from_str(s: &str) -> Result<ScheduleStatus, LoadTestError> {
    Ok(match s {
        "active" => ScheduleStatus::Active,
        "paused" => ScheduleStatus::Paused,
        "completed" => ScheduleStatus::Completed,
        "cancelled" => ScheduleStatus::Cancelled,
        other => return Err(LoadTestError::internal(format!("unknown schedule status in store: {other}"))),
    })
}

fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, LoadTestError> {
    T::from_str(raw).map_err(|_| LoadTestError::internal(format!("malformed {what} id in store: {raw}")))
}

fn row_to_execution(row: &sqlx::postgres::PgRow) -> Result<Execution, LoadTestError> {
    let schedule_id: Option<String> = row.try_get("schedule_id").map_err(|e| LoadTestError::upstream_io(e.to_string()))?;
    let metrics_summary: serde_json::Value =
        row.try_get("metrics_summary").map_err(|e| LoadTestError::upstream_io(e.to_string()))?;
    let metrics_summary: HashMap<String, serde_json::Value> = match metrics_summary {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        _ => HashMap::new(),
    };

    Ok(Execution {
        id: parse_id(row.try_get::<String, _>("id").map_err(db_err)?.as_str(), "execution")?,
        test_id: parse_id(row.try_get::<String, _>("test_id").map_err(db_err)?.as_str(), "test")?,
        user_id: parse_id(row.try_get::<String, _>("user_id").map_err(db_err)?.as_str(), "user")?,
        schedule_id: schedule_id.map(|s| parse_id(&s, "schedule")).transpose()?,
        vus: Vus::new(row.try_get::<i32, _>("vus").map_err(db_err)? as u32),
        duration: RunDuration::from_duration(Duration::from_secs(row.try_get::<i64, _>("duration_secs").map_err(db_err)? as u64)),
        status: status_from_str(&row.try_get::<String, _>("status").map_err(db_err)?)?,
        started_at: row.try_get("started_at").map_err(db_err)?,
        completed_at: row.try_get("completed_at").map_err(db_err)?,
        exit_code: row.try_get("exit_code").map_err(db_err)?,
        stdout: row.try_get("stdout").map_err(db_err)?,
        stderr: row.try_get("stderr").map_err(db_err)?,
        metrics_summary,
        error_message: row.try_get("error_message").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

fn db_err(e: sqlx::Error) -> LoadTestError {
    LoadTestError::upstream_io(e.to_string())
}

fn row_to_schedule(row: &sqlx::postgres::PgRow) -> Result<Schedule, LoadTestError> {
    Ok(Schedule {
        id: parse_id(row.try_get::<String, _>("id").map_err(db_err)?.as_str(), "schedule")?,
        test_id: parse_id(row.try_get::<String, _>("test_id").map_err(db_err)?.as_str(), "test")?,
        user_id: parse_id(row.try_get::<String, _>("user_id").map_err(db_err)?.as_str(), "user")?,
        kind: schedule_kind_from_str(&row.try_get::<String, _>("kind").map_err(db_err)?)?,
        cron_expression: row.try_get("cron_expression").map_err(db_err)?,
        next_run_at: row.try_get("next_run_at").map_err(db_err)?,
        vus: Vus::new(row.try_get::<i32, _>("vus").map_err(db_err)? as u32),
        duration: RunDuration::from_duration(Duration::from_secs(row.try_get::<i64, _>("duration_secs").map_err(db_err)? as u64)),
        status: schedule_status_from_str(&row.try_get::<String, _>("status").map_err(db_err)?)?,
        last_run_at: row.try_get("last_run_at").map_err(db_err)?,
        run_count: row.try_get::<i64, _>("run_count").map_err(db_err)? as u64,
    })
}

fn row_to_aggregated(row: &sqlx::postgres::PgRow) -> Result<AggregatedMetricRow, LoadTestError> {
    Ok(AggregatedMetricRow {
        execution_id: parse_id(row.try_get::<String, _>("execution_id").map_err(db_err)?.as_str(), "execution")?,
        test_id: parse_id(row.try_get::<String, _>("test_id").map_err(db_err)?.as_str(), "test")?,
        bucket_time: row.try_get("bucket_time").map_err(db_err)?,
        metric_name: row.try_get("metric_name").map_err(db_err)?,
        tags: loadtest_domain::MetricTags {
            method: row.try_get("method").map_err(db_err)?,
            status: row.try_get("status").map_err(db_err)?,
            url: row.try_get("url").map_err(db_err)?,
            scenario: row.try_get("scenario").map_err(db_err)?,
        },
        count: row.try_get("count").map_err(db_err)?,
        sum: row.try_get("sum").map_err(db_err)?,
        avg: row.try_get("avg").map_err(db_err)?,
        min: row.try_get("min").map_err(db_err)?,
        max: row.try_get("max").map_err(db_err)?,
        p50: row.try_get("p50").map_err(db_err)?,
        p90: row.try_get("p90").map_err(db_err)?,
        p95: row.try_get("p95").map_err(db_err)?,
        p99: row.try_get("p99").map_err(db_err)?,
        is_summary: row.try_get("is_summary").map_err(db_err)?,
    })
}

#[async_trait]
impl MetricStore for PostgresMetricStore {
    async fn create_execution(&self, execution: &Execution) -> Result<(), LoadTestError> {
        sqlx::query(
            "INSERT INTO executions (id, test_id, user_id, schedule_id, vus, duration_secs, status, \
             started_at, completed_at, exit_code, stdout, stderr, metrics_summary, error_message, \
             created_at, updated_at) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16)",
        )
        .bind(execution.id.to_string())
        .bind(execution.test_id.to_string())
        .bind(execution.user_id.to_string())
        .bind(execution.schedule_id.map(|id| id.to_string()))
        .bind(execution.vus.get() as i32)
        .bind(execution.duration.as_duration().as_secs() as i64)
        .bind(status_to_str(execution.status))
        .bind(execution.started_at)
        .bind(execution.completed_at)
        .bind(execution.exit_code)
        .bind(&execution.stdout)
        .bind(&execution.stderr)
        .bind(serde_json::to_value(&execution.metrics_summary)?)
        .bind(&execution.error_message)
        .bind(execution.created_at)
        .bind(execution.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_execution(&self, id: ExecutionId) -> Result<Option<Execution>, LoadTestError> {
        let row = sqlx::query("SELECT * FROM executions WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_execution).transpose()
    }

    async fn update_execution(&self, execution: &Execution) -> Result<(), LoadTestError> {
        sqlx::query(
            "UPDATE executions SET status=$2, started_at=$3, completed_at=$4, exit_code=$5, stdout=$6, \
             stderr=$7, metrics_summary=$8, error_message=$9, updated_at=$10 WHERE id=$1",
        )
        .bind(execution.id.to_string())
        .bind(status_to_str(execution.status))
        .bind(execution.started_at)
        .bind(execution.completed_at)
        .bind(execution.exit_code)
        .bind(&execution.stdout)
        .bind(&execution.stderr)
        .bind(serde_json::to_value(&execution.metrics_summary)?)
        .bind(&execution.error_message)
        .bind(execution.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn delete_execution(&self, id: ExecutionId) -> Result<(), LoadTestError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query("DELETE FROM raw_metric_points WHERE execution_id = $1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query("DELETE FROM aggregated_metric_rows WHERE execution_id = $1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query("DELETE FROM executions WHERE id = $1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn list_executions(&self, filter: &ExecutionFilter) -> Result<Vec<Execution>, LoadTestError> {
        let mut sql = String::from("SELECT * FROM executions WHERE 1=1");
        let mut binds: Vec<String> = Vec::new();

        if let Some(user_id) = filter.user_id {
            binds.push(user_id.to_string());
            sql.push_str(&format!(" AND user_id = ${}", binds.len()));
        }
        if let Some(test_id) = filter.test_id {
            binds.push(test_id.to_string());
            sql.push_str(&format!(" AND test_id = ${}", binds.len()));
        }
        if let Some(status) = filter.status {
            binds.push(status_to_str(status).to_string());
            sql.push_str(&format!(" AND status = ${}", binds.len()));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let page = filter.page.max(1);
        let page_size = filter.page_size.clamp(1, 1000);
        sql.push_str(&format!(" LIMIT {} OFFSET {}", page_size, (page - 1) * page_size));

        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(row_to_execution).collect()
    }

    async fn count_executions(&self, filter: &ExecutionFilter) -> Result<i64, LoadTestError> {
        let mut sql = String::from("SELECT COUNT(*) FROM executions WHERE 1=1");
        let mut binds: Vec<String> = Vec::new();

        if let Some(user_id) = filter.user_id {
            binds.push(user_id.to_string());
            sql.push_str(&format!(" AND user_id = ${}", binds.len()));
        }
        if let Some(test_id) = filter.test_id {
            binds.push(test_id.to_string());
            sql.push_str(&format!(" AND test_id = ${}", binds.len()));
        }
        if let Some(status) = filter.status {
            binds.push(status_to_str(status).to_string());
            sql.push_str(&format!(" AND status = ${}", binds.len()));
        }

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        query.fetch_one(&self.pool).await.map_err(db_err)
    }

    async fn create_schedule(&self, schedule: &Schedule) -> Result<(), LoadTestError> {
        sqlx::query(
            "INSERT INTO schedules (id, test_id, user_id, kind, cron_expression, next_run_at, vus, \
             duration_secs, status, last_run_at, run_count) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)",
        )
        .bind(schedule.id.to_string())
        .bind(schedule.test_id.to_string())
        .bind(schedule.user_id.to_string())
        .bind(schedule_kind_to_str(schedule.kind))
        .bind(&schedule.cron_expression)
        .bind(schedule.next_run_at)
        .bind(schedule.vus.get() as i32)
        .bind(schedule.duration.as_duration().as_secs() as i64)
        .bind(schedule_status_to_str(schedule.status))
        .bind(schedule.last_run_at)
        .bind(schedule.run_count as i64)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_schedule(&self, id: ScheduleId) -> Result<Option<Schedule>, LoadTestError> {
        let row = sqlx::query("SELECT * FROM schedules WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_schedule).transpose()
    }

    async fn update_schedule(&self, schedule: &Schedule) -> Result<(), LoadTestError> {
        sqlx::query(
            "UPDATE schedules SET status=$2, next_run_at=$3, last_run_at=$4, run_count=$5 WHERE id=$1",
        )
        .bind(schedule.id.to_string())
        .bind(schedule_status_to_str(schedule.status))
        .bind(schedule.next_run_at)
        .bind(schedule.last_run_at)
        .bind(schedule.run_count as i64)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn delete_schedule(&self, id: ScheduleId) -> Result<(), LoadTestError> {
        sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_schedules(&self, user_id: Option<UserId>) -> Result<Vec<Schedule>, LoadTestError> {
        let rows = match user_id {
            Some(user_id) => sqlx::query("SELECT * FROM schedules WHERE user_id = $1 ORDER BY id")
                .bind(user_id.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?,
            None => sqlx::query("SELECT * FROM schedules ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?,
        };
        rows.iter().map(row_to_schedule).collect()
    }

    async fn count_running_by_user(&self, user_id: UserId) -> Result<i64, LoadTestError> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM executions WHERE user_id = $1 AND status IN ('queued', 'running')",
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn mark_orphans_failed(&self, now: DateTime<Utc>) -> Result<u64, LoadTestError> {
        let result = sqlx::query(
            "UPDATE executions SET status = 'failed', error_message = 'server restarted', \
             completed_at = $1, updated_at = $1 WHERE status IN ('queued', 'running')",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn get_due_schedules(&self, now: DateTime<Utc>) -> Result<Vec<Schedule>, LoadTestError> {
        let rows = sqlx::query("SELECT * FROM schedules WHERE status = 'active' AND next_run_at <= $1")
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_schedule).collect()
    }

    async fn insert_raw_points(&self, points: &[RawMetricPoint]) -> Result<(), LoadTestError> {
        if points.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for point in points {
            sqlx::query(
                "INSERT INTO raw_metric_points (execution_id, test_id, metric_name, timestamp_micros, \
                 value, method, status, url, scenario) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)",
            )
            .bind(point.execution_id.to_string())
            .bind(point.test_id.to_string())
            .bind(&point.metric_name)
            .bind(point.timestamp_micros)
            .bind(point.value)
            .bind(&point.tags.method)
            .bind(&point.tags.status)
            .bind(&point.tags.url)
            .bind(&point.tags.scenario)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn raw_points_for_execution(&self, execution_id: ExecutionId) -> Result<Vec<RawMetricPoint>, LoadTestError> {
        let rows = sqlx::query("SELECT * FROM raw_metric_points WHERE execution_id = $1")
            .bind(execution_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter()
            .map(|row| {
                Ok(RawMetricPoint {
                    execution_id: parse_id(row.try_get::<String, _>("execution_id").map_err(db_err)?.as_str(), "execution")?,
                    test_id: parse_id(row.try_get::<String, _>("test_id").map_err(db_err)?.as_str(), "test")?,
                    metric_name: row.try_get("metric_name").map_err(db_err)?,
                    timestamp_micros: row.try_get("timestamp_micros").map_err(db_err)?,
                    value: row.try_get("value").map_err(db_err)?,
                    tags: loadtest_domain::MetricTags {
                        method: row.try_get("method").map_err(db_err)?,
                        status: row.try_get("status").map_err(db_err)?,
                        url: row.try_get("url").map_err(db_err)?,
                        scenario: row.try_get("scenario").map_err(db_err)?,
                    },
                })
            })
            .collect()
    }

    async fn aggregated_rows_for_execution(&self, execution_id: ExecutionId) -> Result<Vec<AggregatedMetricRow>, LoadTestError> {
        let rows = sqlx::query("SELECT * FROM aggregated_metric_rows WHERE execution_id = $1")
            .bind(execution_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_aggregated).collect()
    }

    async fn query_aggregated_rows(&self, query: &AggregatedRowQuery) -> Result<Vec<AggregatedMetricRow>, LoadTestError> {
        let mut sql = String::from("SELECT * FROM aggregated_metric_rows WHERE is_summary = $1");
        let mut binds: Vec<String> = Vec::new();

        if let Some(test_id) = query.test_id {
            binds.push(test_id.to_string());
            sql.push_str(&format!(" AND test_id = ${}", binds.len() + 1));
        }
        if let Some(execution_id) = query.execution_id {
            binds.push(execution_id.to_string());
            sql.push_str(&format!(" AND execution_id = ${}", binds.len() + 1));
        }
        if let Some(ref metric_name) = query.metric_name {
            binds.push(metric_name.clone());
            sql.push_str(&format!(" AND metric_name = ${}", binds.len() + 1));
        }
        if !query.summary_only {
            sql.push_str(&format!(
                " AND (bucket_time IS NULL OR (bucket_time >= ${} AND bucket_time <= ${}))",
                binds.len() + 2,
                binds.len() + 3
            ));
        }

        let mut sql_query = sqlx::query(&sql).bind(query.summary_only);
        for bind in &binds {
            sql_query = sql_query.bind(bind);
        }
        if !query.summary_only {
            sql_query = sql_query.bind(query.from).bind(query.to);
        }

        let rows = sql_query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(row_to_aggregated).collect()
    }

    async fn aggregate_execution(&self, execution_id: ExecutionId) -> Result<(), LoadTestError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let test_id: Option<String> =
            sqlx::query_scalar("SELECT test_id FROM raw_metric_points WHERE execution_id = $1 LIMIT 1")
                .bind(execution_id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;
        let Some(test_id) = test_id else {
            // Nothing to aggregate; leave prior aggregated rows untouched.
            tx.commit().await.map_err(db_err)?;
            return Ok(());
        };

        sqlx::query("DELETE FROM aggregated_metric_rows WHERE execution_id = $1")
            .bind(execution_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        // Bucket rows: group by (second, metric, method, status, url, scenario).
        sqlx::query(
            r#"
            INSERT INTO aggregated_metric_rows
                (execution_id, test_id, bucket_time, metric_name, method, status, url, scenario,
                 count, sum, avg, min, max, p50, p90, p95, p99, is_summary)
            SELECT
                $1, $2,
                to_timestamp(floor(timestamp_micros / 1000000.0)) AS bucket_time,
                metric_name, method, status, url, scenario,
                COUNT(*), SUM(value), AVG(value), MIN(value), MAX(value),
                PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY value),
                PERCENTILE_CONT(0.9) WITHIN GROUP (ORDER BY value),
                PERCENTILE_CONT(0.95) WITHIN GROUP (ORDER BY value),
                PERCENTILE_CONT(0.99) WITHIN GROUP (ORDER BY value),
                false
            FROM raw_metric_points
            WHERE execution_id = $1
            GROUP BY bucket_time, metric_name, method, status, url, scenario
            "#,
        )
        .bind(execution_id.to_string())
        .bind(&test_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        // Global summary rows: group by metric only.
        sqlx::query(
            r#"
            INSERT INTO aggregated_metric_rows
                (execution_id, test_id, bucket_time, metric_name, method, status, url, scenario,
                 count, sum, avg, min, max, p50, p90, p95, p99, is_summary)
            SELECT
                $1, $2, NULL, metric_name, NULL, NULL, NULL, NULL,
                COUNT(*), SUM(value), AVG(value), MIN(value), MAX(value),
                PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY value),
                PERCENTILE_CONT(0.9) WITHIN GROUP (ORDER BY value),
                PERCENTILE_CONT(0.95) WITHIN GROUP (ORDER BY value),
                PERCENTILE_CONT(0.99) WITHIN GROUP (ORDER BY value),
                true
            FROM raw_metric_points
            WHERE execution_id = $1
            GROUP BY metric_name
            "#,
        )
        .bind(execution_id.to_string())
        .bind(&test_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        // Endpoint summary rows: group by (metric, url, method, status) where url present.
        sqlx::query(
            r#"
            INSERT INTO aggregated_metric_rows
                (execution_id, test_id, bucket_time, metric_name, method, status, url, scenario,
                 count, sum, avg, min, max, p50, p90, p95, p99, is_summary)
            SELECT
                $1, $2, NULL, metric_name, method, status, url, NULL,
                COUNT(*), SUM(value), AVG(value), MIN(value), MAX(value),
                PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY value),
                PERCENTILE_CONT(0.9) WITHIN GROUP (ORDER BY value),
                PERCENTILE_CONT(0.95) WITHIN GROUP (ORDER BY value),
                PERCENTILE_CONT(0.99) WITHIN GROUP (ORDER BY value),
                true
            FROM raw_metric_points
            WHERE execution_id = $1 AND url IS NOT NULL
            GROUP BY metric_name, url, method, status
            "#,
        )
        .bind(execution_id.to_string())
        .bind(&test_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        sqlx::query("DELETE FROM raw_metric_points WHERE execution_id = $1")
            .bind(execution_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }
}

/// Used by the query service to classify an already-fetched row without a
/// round trip - thin re-export so callers don't need the entities path.
pub fn family_of(row: &AggregatedMetricRow) -> RowFamily {
    row.family()
}
