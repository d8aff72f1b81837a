//! # Schedule entity
//!
//! A recurring or one-off trigger. `kind = once` requires `next_run_at` and
//! forbids a cron expression; `kind = recurring` requires one. These
//! invariants are enforced at construction, not by downstream validation.

use crate::error::LoadTestError;
use crate::value_objects::{RunDuration, TestId, UserId, Vus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleId(Ulid);

impl ScheduleId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ScheduleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ScheduleId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    Once,
    Recurring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Active,
    Paused,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub test_id: TestId,
    pub user_id: UserId,
    pub kind: ScheduleKind,
    pub cron_expression: Option<String>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub vus: Vus,
    pub duration: RunDuration,
    pub status: ScheduleStatus,
    pub last_run_at: Option<DateTime<Utc>>,
    pub run_count: u64,
}

impl Schedule {
    /// `kind = once`: `next_run_at` required, no cron expression allowed.
    pub fn new_once(
        test_id: TestId,
        user_id: UserId,
        vus: Vus,
        duration: RunDuration,
        next_run_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ScheduleId::new(),
            test_id,
            user_id,
            kind: ScheduleKind::Once,
            cron_expression: None,
            next_run_at: Some(next_run_at),
            vus,
            duration,
            status: ScheduleStatus::Active,
            last_run_at: None,
            run_count: 0,
        }
    }

    /// `kind = recurring`: a cron expression is required; `next_run_at` is
    /// computed by the caller from that expression (the domain layer does
    /// not parse cron grammar - that is the schedule engine's job).
    pub fn new_recurring(
        test_id: TestId,
        user_id: UserId,
        vus: Vus,
        duration: RunDuration,
        cron_expression: String,
        next_run_at: DateTime<Utc>,
    ) -> Result<Self, LoadTestError> {
        if cron_expression.trim().is_empty() {
            return Err(LoadTestError::validation("recurring schedule requires a cron expression"));
        }
        Ok(Self {
            id: ScheduleId::new(),
            test_id,
            user_id,
            kind: ScheduleKind::Recurring,
            cron_expression: Some(cron_expression),
            next_run_at: Some(next_run_at),
            vus,
            duration,
            status: ScheduleStatus::Active,
            last_run_at: None,
            run_count: 0,
        })
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ScheduleStatus::Active && self.next_run_at.is_some_and(|t| t <= now)
    }

    /// Records a firing. `once` schedules complete and clear `next_run_at`;
    /// `recurring` schedules get the caller-computed next fire time, or are
    /// paused if the caller couldn't compute one (invalid cron at fire
    /// time - logged by the caller, not surfaced here).
    pub fn record_firing(&mut self, now: DateTime<Utc>, next_recurring_run_at: Option<DateTime<Utc>>) {
        self.last_run_at = Some(now);
        self.run_count += 1;
        match self.kind {
            ScheduleKind::Once => {
                self.status = ScheduleStatus::Completed;
                self.next_run_at = None;
            }
            ScheduleKind::Recurring => match next_recurring_run_at {
                Some(next) => self.next_run_at = Some(next),
                None => self.status = ScheduleStatus::Paused,
            },
        }
    }

    pub fn cancel(&mut self) {
        self.status = ScheduleStatus::Cancelled;
        self.next_run_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recurring_requires_cron_expression() {
        let err = Schedule::new_recurring(TestId::new(), UserId::new(), Vus::new(1), RunDuration::parse_lenient("10s"), String::new(), Utc::now());
        assert!(err.is_err());
    }

    #[test]
    fn once_schedule_completes_after_firing() {
        let mut sched = Schedule::new_once(TestId::new(), UserId::new(), Vus::new(1), RunDuration::parse_lenient("10s"), Utc::now());
        sched.record_firing(Utc::now(), None);
        assert_eq!(sched.status, ScheduleStatus::Completed);
        assert!(sched.next_run_at.is_none());
        assert_eq!(sched.run_count, 1);
    }

    #[test]
    fn recurring_schedule_pauses_when_no_next_fire_time() {
        let mut sched = Schedule::new_recurring(
            TestId::new(),
            UserId::new(),
            Vus::new(1),
            RunDuration::parse_lenient("10s"),
            "* * * * *".into(),
            Utc::now(),
        )
        .unwrap();
        sched.record_firing(Utc::now(), None);
        assert_eq!(sched.status, ScheduleStatus::Paused);
    }

    #[test]
    fn due_only_when_active_and_past_next_run() {
        let mut sched = Schedule::new_once(TestId::new(), UserId::new(), Vus::new(1), RunDuration::parse_lenient("10s"), Utc::now() - chrono::Duration::seconds(1));
        assert!(sched.is_due(Utc::now()));
        sched.cancel();
        assert!(!sched.is_due(Utc::now()));
    }
}
