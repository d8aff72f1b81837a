//! Infrastructure adapters: the Postgres-backed `MetricStore`, the CSV
//! ingestion boundary, and cron fire-time computation.

pub mod csv_ingest;
pub mod cron_schedule;
pub mod repositories;
