pub mod aggregated_row;
pub mod execution;
pub mod metric_point;
pub mod schedule;

pub use aggregated_row::{AggregatedMetricRow, RowFamily};
pub use execution::{Execution, ExecutionStatus};
pub use metric_point::RawMetricPoint;
pub use schedule::{Schedule, ScheduleId, ScheduleKind, ScheduleStatus};
