//! Application layer: the execution supervisor, the schedule engine, and
//! the metrics query service with its TTL cache. No transport concerns
//! live here - see [`crate::presentation`].

pub mod query_cache;
pub mod query_service;
pub mod schedule_engine;
pub mod supervisor;

pub use query_service::MetricsQueryService;
pub use schedule_engine::ScheduleEngine;
pub use supervisor::ExecutionSupervisor;
