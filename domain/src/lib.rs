//! # Load Test Domain
//!
//! Pure business logic for the execution control plane and metrics
//! pipeline: entities, value objects, the error type, and the ports that
//! `core`'s infrastructure adapters implement. No I/O, no async runtime
//! dependency beyond the `async-trait`-decorated port definitions
//! themselves (the traits are async because their implementations are
//! I/O-bound, not because the domain layer schedules anything).

pub mod clock;
pub mod entities;
pub mod error;
pub mod repositories;
pub mod value_objects;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entities::{AggregatedMetricRow, Execution, ExecutionStatus, RawMetricPoint, RowFamily, Schedule, ScheduleId, ScheduleKind, ScheduleStatus};
pub use error::LoadTestError;
pub use repositories::{AggregatedRowQuery, ExecutionFilter, MetricStore};
pub use value_objects::{DomainId, ExecutionId, MetricTags, RunDuration, TestId, UserId, Vus};
