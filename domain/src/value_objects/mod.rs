pub mod ids;
pub mod metric_tags;
pub mod run_duration;
pub mod timestamp;
pub mod vus;

pub use ids::{DomainId, ExecutionId, TestId, UserId};
pub use metric_tags::MetricTags;
pub use run_duration::RunDuration;
pub use vus::Vus;
