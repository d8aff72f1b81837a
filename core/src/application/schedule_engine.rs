//! # Schedule Engine
//!
//! A periodic polling loop (§4.F) driven by `tokio::time::interval` at
//! `scheduler_tick`. Stoppable via the shared `ShutdownCoordinator`; a tick
//! already in flight is allowed to finish (checked between schedules, never
//! mid-iteration), and a second stop call never deadlocks because
//! `initiate_shutdown` is idempotent.

use crate::application::supervisor::ExecutionSupervisor;
use crate::config::AppConfig;
use crate::infrastructure::cron_schedule;
use crate::metrics::ObservabilityMetrics;
use loadtest_bootstrap::shutdown::CancellationToken;
use loadtest_domain::entities::{ScheduleKind, ScheduleStatus};
use loadtest_domain::{Clock, Execution, LoadTestError, MetricStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub struct ScheduleEngine {
    store: Arc<dyn MetricStore>,
    supervisor: Arc<ExecutionSupervisor>,
    config: AppConfig,
    clock: Arc<dyn Clock>,
    metrics: Arc<ObservabilityMetrics>,
    scripts_dir: PathBuf,
}

impl ScheduleEngine {
    pub fn new(
        store: Arc<dyn MetricStore>,
        supervisor: Arc<ExecutionSupervisor>,
        config: AppConfig,
        clock: Arc<dyn Clock>,
        metrics: Arc<ObservabilityMetrics>,
        scripts_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            supervisor,
            config,
            clock,
            metrics,
            scripts_dir,
        }
    }

    /// Runs the polling loop until `token` is cancelled. Intended to be
    /// spawned as its own task.
    pub async fn run(&self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.scheduler_tick());
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("schedule engine stopping");
                    return;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    async fn tick(&self) {
        let now = self.clock.now_utc();
        let due = match self.store.get_due_schedules(now).await {
            Ok(due) => due,
            Err(e) => {
                error!(error = %e, "failed to fetch due schedules");
                return;
            }
        };

        for mut schedule in due {
            let submission = self
                .supervisor
                .submit(
                    schedule.test_id,
                    schedule.user_id,
                    Some(schedule.id),
                    schedule.vus,
                    schedule.duration,
                    self.scripts_dir.join(format!("{}.js", schedule.test_id)),
                )
                .await;

            match submission {
                Ok(_) => {
                    self.metrics.schedule_fires_total.inc();
                }
                Err(e) => {
                    warn!(schedule_id = %schedule.id, error = %e, "scheduled submission rejected");
                    let mut rejected = Execution::new_queued(schedule.test_id, schedule.user_id, Some(schedule.id), schedule.vus, schedule.duration, now);
                    if let Err(reject_err) = rejected.reject(e.to_string(), now) {
                        error!(schedule_id = %schedule.id, error = %reject_err, "failed to mark rejected execution as failed");
                    } else if let Err(store_err) = self.store.create_execution(&rejected).await {
                        error!(schedule_id = %schedule.id, error = %store_err, "failed to persist rejected execution record");
                    }
                }
            }

            let next_recurring_run_at = match schedule.kind {
                ScheduleKind::Once => None,
                ScheduleKind::Recurring => {
                    let cron_expression = schedule.cron_expression.clone().unwrap_or_default();
                    match cron_schedule::next_fire_after(&cron_expression, now) {
                        Some(next) => Some(next),
                        None => {
                            warn!(schedule_id = %schedule.id, "invalid cron expression at fire time; pausing");
                            None
                        }
                    }
                }
            };
            schedule.record_firing(now, next_recurring_run_at);

            if let Err(e) = self.store.update_schedule(&schedule).await {
                error!(schedule_id = %schedule.id, error = %e, "failed to persist schedule after firing");
            }
        }
    }

    pub async fn create_once(
        &self,
        test_id: loadtest_domain::TestId,
        user_id: loadtest_domain::UserId,
        vus: loadtest_domain::Vus,
        duration: loadtest_domain::RunDuration,
        next_run_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<loadtest_domain::Schedule, LoadTestError> {
        let schedule = loadtest_domain::Schedule::new_once(test_id, user_id, vus, duration, next_run_at);
        self.store.create_schedule(&schedule).await?;
        Ok(schedule)
    }

    pub async fn create_recurring(
        &self,
        test_id: loadtest_domain::TestId,
        user_id: loadtest_domain::UserId,
        vus: loadtest_domain::Vus,
        duration: loadtest_domain::RunDuration,
        cron_expression: String,
    ) -> Result<loadtest_domain::Schedule, LoadTestError> {
        let now = self.clock.now_utc();
        let next_run_at = cron_schedule::next_fire_after(&cron_expression, now)
            .ok_or_else(|| LoadTestError::validation("invalid cron expression"))?;
        let schedule = loadtest_domain::Schedule::new_recurring(test_id, user_id, vus, duration, cron_expression, next_run_at)?;
        self.store.create_schedule(&schedule).await?;
        Ok(schedule)
    }

    pub async fn cancel(&self, id: loadtest_domain::entities::ScheduleId) -> Result<(), LoadTestError> {
        let mut schedule = self
            .store
            .get_schedule(id)
            .await?
            .ok_or_else(|| LoadTestError::not_found(format!("schedule {id} not found")))?;
        if schedule.status == ScheduleStatus::Cancelled {
            return Ok(());
        }
        schedule.cancel();
        self.store.update_schedule(&schedule).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ObservabilityMetrics;
    use crate::test_support::NullStore;
    use loadtest_domain::{SystemClock, TestId, UserId, Vus};

    fn engine() -> ScheduleEngine {
        engine_with_config(AppConfig::default())
    }

    fn engine_with_config(config: AppConfig) -> ScheduleEngine {
        let store: Arc<dyn MetricStore> = Arc::new(NullStore::default());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let metrics = Arc::new(ObservabilityMetrics::new().unwrap());
        let supervisor = Arc::new(ExecutionSupervisor::new(Arc::clone(&store), config.clone(), Arc::clone(&clock), Arc::clone(&metrics)));
        ScheduleEngine::new(store, supervisor, config, clock, metrics, PathBuf::from("/dev/null"))
    }

    #[tokio::test]
    async fn once_schedule_completes_after_tick() {
        let engine = engine();
        let now = engine.clock.now_utc();
        let schedule = engine
            .create_once(TestId::new(), UserId::new(), Vus::new(1), loadtest_domain::RunDuration::parse_lenient("1s"), now - chrono::Duration::seconds(1))
            .await
            .unwrap();

        engine.tick().await;

        let refreshed = engine.store.get_schedule(schedule.id).await.unwrap().unwrap();
        assert_eq!(refreshed.status, ScheduleStatus::Completed);
        assert_eq!(refreshed.run_count, 1);
    }

    #[tokio::test]
    async fn recurring_schedule_advances_next_run_at() {
        let engine = engine();
        let schedule = engine
            .create_recurring(TestId::new(), UserId::new(), Vus::new(1), loadtest_domain::RunDuration::parse_lenient("1s"), "* * * * *".to_string())
            .await
            .unwrap();

        // Force it due by rewriting next_run_at into the past.
        let mut due = schedule.clone();
        due.next_run_at = Some(engine.clock.now_utc() - chrono::Duration::seconds(1));
        engine.store.update_schedule(&due).await.unwrap();

        engine.tick().await;

        let refreshed = engine.store.get_schedule(schedule.id).await.unwrap().unwrap();
        assert_eq!(refreshed.status, ScheduleStatus::Active);
        assert!(refreshed.next_run_at.unwrap() > engine.clock.now_utc());
    }

    #[tokio::test]
    async fn rejected_firing_persists_a_failed_execution() {
        let config = AppConfig {
            max_concurrent: 0,
            ..AppConfig::default()
        };
        let engine = engine_with_config(config);
        let test_id = TestId::new();
        let now = engine.clock.now_utc();
        engine
            .create_once(test_id, UserId::new(), Vus::new(1), loadtest_domain::RunDuration::parse_lenient("1s"), now - chrono::Duration::seconds(1))
            .await
            .unwrap();

        engine.tick().await;

        let executions = engine
            .store
            .list_executions(&loadtest_domain::ExecutionFilter {
                user_id: None,
                test_id: Some(test_id),
                status: None,
                page: 1,
                page_size: 10,
            })
            .await
            .unwrap();
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].status, loadtest_domain::ExecutionStatus::Failed);
        assert!(executions[0].error_message.is_some());
    }
}
