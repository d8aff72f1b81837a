// /////////////////////////////////////////////////////////////////////////////
// Load Test Orchestration Platform
// /////////////////////////////////////////////////////////////////////////////

//! Postgres schema helpers shared by the repository implementation.
//!
//! Applies `CREATE TABLE IF NOT EXISTS` and the four partial indices from
//! the control-surface specification at startup, mirroring the teacher's
//! embedded-schema approach rather than a migrations framework.

use sqlx::PgPool;
use tracing::{debug, info};

/// Creates every table and index this crate needs, if not already present.
/// Idempotent - safe to call on every process start.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    debug!("ensuring database schema is up to date");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS executions (
            id TEXT PRIMARY KEY,
            test_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            schedule_id TEXT,
            vus INTEGER NOT NULL,
            duration_secs BIGINT NOT NULL,
            status TEXT NOT NULL,
            started_at TIMESTAMPTZ,
            completed_at TIMESTAMPTZ,
            exit_code INTEGER,
            stdout TEXT NOT NULL DEFAULT '',
            stderr TEXT NOT NULL DEFAULT '',
            metrics_summary JSONB NOT NULL DEFAULT '{}',
            error_message TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_executions_user_status ON executions (user_id, status)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_executions_test ON executions (test_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schedules (
            id TEXT PRIMARY KEY,
            test_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            cron_expression TEXT,
            next_run_at TIMESTAMPTZ,
            vus INTEGER NOT NULL,
            duration_secs BIGINT NOT NULL,
            status TEXT NOT NULL,
            last_run_at TIMESTAMPTZ,
            run_count BIGINT NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_schedules_due ON schedules (status, next_run_at) WHERE status = 'active'",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS raw_metric_points (
            execution_id TEXT NOT NULL,
            test_id TEXT NOT NULL,
            metric_name TEXT NOT NULL,
            timestamp_micros BIGINT NOT NULL,
            value DOUBLE PRECISION NOT NULL,
            method TEXT,
            status TEXT,
            url TEXT,
            scenario TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_raw_points_execution ON raw_metric_points (execution_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS aggregated_metric_rows (
            execution_id TEXT NOT NULL,
            test_id TEXT NOT NULL,
            bucket_time TIMESTAMPTZ,
            metric_name TEXT NOT NULL,
            method TEXT,
            status TEXT,
            url TEXT,
            scenario TEXT,
            count BIGINT NOT NULL,
            sum DOUBLE PRECISION NOT NULL,
            avg DOUBLE PRECISION NOT NULL,
            min DOUBLE PRECISION NOT NULL,
            max DOUBLE PRECISION NOT NULL,
            p50 DOUBLE PRECISION NOT NULL,
            p90 DOUBLE PRECISION NOT NULL,
            p95 DOUBLE PRECISION NOT NULL,
            p99 DOUBLE PRECISION NOT NULL,
            is_summary BOOLEAN NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // The four partial indices named in the control-surface specification.
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_agg_bucket ON aggregated_metric_rows \
         (test_id, metric_name, bucket_time) WHERE NOT is_summary",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_agg_global_summary ON aggregated_metric_rows \
         (execution_id, metric_name) WHERE is_summary",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_agg_endpoint_summary ON aggregated_metric_rows \
         (test_id, metric_name, url, method, status) WHERE is_summary AND url IS NOT NULL",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_agg_metric_global ON aggregated_metric_rows \
         (metric_name) WHERE is_summary AND url IS NULL",
    )
    .execute(pool)
    .await?;

    info!("database schema is up to date");
    Ok(())
}
