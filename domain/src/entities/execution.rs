//! # Execution entity
//!
//! One supervised run of a test. `ExecutionStatus` transitions are enforced
//! here rather than downstream: the only way to reach `Running`,
//! `Completed`, `Failed`, `Timeout`, or `Cancelled` is through a method that
//! checks the current status first, per §3's transition graph
//! `queued -> running -> {completed | failed | timeout}` and
//! `{queued, running} -> cancelled`.

use crate::entities::schedule::ScheduleId;
use crate::error::LoadTestError;
use crate::value_objects::{ExecutionId, RunDuration, TestId, UserId, Vus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
    Timeout,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled | Self::Timeout)
    }

    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub test_id: TestId,
    pub user_id: UserId,
    pub schedule_id: Option<ScheduleId>,
    pub vus: Vus,
    pub duration: RunDuration,
    pub status: ExecutionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub metrics_summary: HashMap<String, serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Execution {
    pub fn new_queued(
        test_id: TestId,
        user_id: UserId,
        schedule_id: Option<ScheduleId>,
        vus: Vus,
        duration: RunDuration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ExecutionId::new(),
            test_id,
            user_id,
            schedule_id,
            vus,
            duration,
            status: ExecutionStatus::Queued,
            started_at: None,
            completed_at: None,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            metrics_summary: HashMap::new(),
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `queued -> running`. Only edge allowed into `Running`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), LoadTestError> {
        if self.status != ExecutionStatus::Queued {
            return Err(LoadTestError::invalid_state(format!(
                "cannot start execution from status {:?}",
                self.status
            )));
        }
        self.status = ExecutionStatus::Running;
        self.started_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// `running -> {completed | failed | timeout}`.
    pub fn finish(
        &mut self,
        status: ExecutionStatus,
        exit_code: Option<i32>,
        error_message: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), LoadTestError> {
        if !status.is_terminal() {
            return Err(LoadTestError::invalid_state(format!("{status:?} is not a terminal status")));
        }
        if self.status != ExecutionStatus::Running {
            return Err(LoadTestError::invalid_state(format!(
                "cannot finish execution from status {:?}",
                self.status
            )));
        }
        self.status = status;
        self.exit_code = exit_code;
        self.error_message = error_message;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// `queued -> failed`. Used when admission rejects the execution before
    /// it ever starts, e.g. a scheduled firing hitting the concurrency cap.
    pub fn reject(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> Result<(), LoadTestError> {
        if self.status != ExecutionStatus::Queued {
            return Err(LoadTestError::invalid_state(format!(
                "cannot reject execution from status {:?}",
                self.status
            )));
        }
        self.status = ExecutionStatus::Failed;
        self.error_message = Some(message.into());
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// `{queued, running} -> cancelled`. `exit_code` stays `None` when
    /// cancelled before the subprocess ever reported an exit.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), LoadTestError> {
        if !self.status.is_in_flight() {
            return Err(LoadTestError::invalid_state(format!(
                "cannot cancel execution from status {:?}",
                self.status
            )));
        }
        self.status = ExecutionStatus::Cancelled;
        self.error_message = Some("was cancelled".to_string());
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn attach_summary(&mut self, summary: HashMap<String, serde_json::Value>, now: DateTime<Utc>) {
        self.metrics_summary = summary;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{RunDuration, Vus};

    fn new_execution() -> Execution {
        Execution::new_queued(TestId::new(), UserId::new(), None, Vus::new(5), RunDuration::parse_lenient("10s"), Utc::now())
    }

    #[test]
    fn happy_path_transitions() {
        let mut exec = new_execution();
        exec.start(Utc::now()).unwrap();
        assert_eq!(exec.status, ExecutionStatus::Running);
        assert!(exec.started_at.is_some());

        exec.finish(ExecutionStatus::Completed, Some(0), None, Utc::now()).unwrap();
        assert_eq!(exec.status, ExecutionStatus::Completed);
        assert_eq!(exec.exit_code, Some(0));
        assert!(exec.completed_at.unwrap() >= exec.started_at.unwrap());
    }

    #[test]
    fn cancel_while_queued_leaves_exit_code_unset() {
        let mut exec = new_execution();
        exec.cancel(Utc::now()).unwrap();
        assert_eq!(exec.status, ExecutionStatus::Cancelled);
        assert_eq!(exec.exit_code, None);
    }

    #[test]
    fn cannot_cancel_terminal_execution() {
        let mut exec = new_execution();
        exec.start(Utc::now()).unwrap();
        exec.finish(ExecutionStatus::Completed, Some(0), None, Utc::now()).unwrap();
        assert!(exec.cancel(Utc::now()).is_err());
    }

    #[test]
    fn cannot_finish_a_queued_execution() {
        let mut exec = new_execution();
        assert!(exec.finish(ExecutionStatus::Completed, Some(0), None, Utc::now()).is_err());
    }

    #[test]
    fn cannot_finish_into_non_terminal_status() {
        let mut exec = new_execution();
        exec.start(Utc::now()).unwrap();
        assert!(exec.finish(ExecutionStatus::Running, None, None, Utc::now()).is_err());
    }

    #[test]
    fn reject_marks_queued_execution_failed() {
        let mut exec = new_execution();
        exec.reject("too many concurrent executions", Utc::now()).unwrap();
        assert_eq!(exec.status, ExecutionStatus::Failed);
        assert_eq!(exec.error_message.as_deref(), Some("too many concurrent executions"));
        assert!(exec.completed_at.is_some());
    }

    #[test]
    fn cannot_reject_a_running_execution() {
        let mut exec = new_execution();
        exec.start(Utc::now()).unwrap();
        assert!(exec.reject("too late", Utc::now()).is_err());
    }
}
