//! # Execution Supervisor
//!
//! Owns each execution's lifecycle from spawn to terminal persistence
//! (§4.E). Admission is linearizable: the per-user tracked count is
//! checked, then double-checked under the same mutex used to register the
//! new entry, closing the race between "count passes" and "slot taken"
//! (§5). Subprocess wait, cancellation, and the deadline race reuse the
//! bootstrap crate's `ShutdownCoordinator`/`CancellationToken` pair rather
//! than a bespoke mechanism.

use crate::config::AppConfig;
use crate::infrastructure::csv_ingest;
use crate::metrics::ObservabilityMetrics;
use loadtest_bootstrap::shutdown::{CancellationToken, ShutdownCoordinator};
use loadtest_domain::entities::ScheduleId;
use loadtest_domain::{Clock, Execution, ExecutionId, ExecutionStatus, LoadTestError, MetricStore, RunDuration, TestId, UserId, Vus};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

struct Tracked {
    shutdown: ShutdownCoordinator,
}

pub struct ExecutionSupervisor {
    store: Arc<dyn MetricStore>,
    config: AppConfig,
    clock: Arc<dyn Clock>,
    metrics: Arc<ObservabilityMetrics>,
    tracking: Mutex<HashMap<UserId, HashMap<ExecutionId, Tracked>>>,
}

impl ExecutionSupervisor {
    pub fn new(store: Arc<dyn MetricStore>, config: AppConfig, clock: Arc<dyn Clock>, metrics: Arc<ObservabilityMetrics>) -> Self {
        Self {
            store,
            config,
            clock,
            metrics,
            tracking: Mutex::new(HashMap::new()),
        }
    }

    /// Flips every abandoned `{queued, running}` execution to `failed`.
    /// Called exactly once at construction time by the caller (`main`).
    pub async fn recover_orphans(&self) -> Result<u64, LoadTestError> {
        let now = self.clock.now_utc();
        match self.store.mark_orphans_failed(now).await {
            Ok(count) => {
                if count > 0 {
                    warn!(count, "recovered orphaned executions at startup");
                }
                Ok(count)
            }
            Err(e) => {
                error!(error = %e, "orphan recovery failed; continuing degraded");
                Err(e)
            }
        }
    }

    pub async fn running_count(&self, user_id: UserId) -> usize {
        let tracking = self.tracking.lock().await;
        tracking.get(&user_id).map(|m| m.len()).unwrap_or(0)
    }

    /// Admits and spawns a new execution. Caps `vus` at `max_vus` and
    /// `duration` at `max_duration` before persisting.
    #[allow(clippy::too_many_arguments)]
    pub async fn submit(
        self: &Arc<Self>,
        test_id: TestId,
        user_id: UserId,
        schedule_id: Option<ScheduleId>,
        vus: Vus,
        duration: RunDuration,
        script_path: PathBuf,
    ) -> Result<Execution, LoadTestError> {
        let vus = vus.capped_at(self.config.max_vus);
        let duration = duration.capped_at(self.config.max_duration());

        let mut tracking = self.tracking.lock().await;
        let user_tracked = tracking.entry(user_id).or_default();
        if user_tracked.len() as u32 >= self.config.max_concurrent {
            self.metrics.executions_rejected_total.inc();
            return Err(LoadTestError::TooManyConcurrent);
        }

        let now = self.clock.now_utc();
        let execution = Execution::new_queued(test_id, user_id, schedule_id, vus, duration, now);
        self.store.create_execution(&execution).await?;

        let shutdown = ShutdownCoordinator::new(self.config.subprocess_grace());
        user_tracked.insert(execution.id, Tracked { shutdown: shutdown.clone() });
        drop(tracking);

        self.metrics.executions_submitted_total.inc();
        self.metrics.active_executions.inc();

        let supervisor = Arc::clone(self);
        let exec_id = execution.id;
        let token = shutdown.token();
        tokio::spawn(async move {
            supervisor.run(exec_id, script_path, token).await;
            supervisor.untrack(user_id, exec_id).await;
        });

        Ok(execution)
    }

    /// Triggers cancellation for a tracked execution. Returns whether it
    /// was tracked; tracking cleanup happens on subprocess exit, not here.
    pub async fn cancel(&self, user_id: UserId, execution_id: ExecutionId) -> bool {
        let tracking = self.tracking.lock().await;
        match tracking.get(&user_id).and_then(|m| m.get(&execution_id)) {
            Some(tracked) => {
                tracked.shutdown.initiate_shutdown();
                true
            }
            None => false,
        }
    }

    /// Re-runs the store's aggregation routine for a terminal execution.
    pub async fn recalculate(&self, execution_id: ExecutionId) -> Result<Execution, LoadTestError> {
        let execution = self
            .store
            .get_execution(execution_id)
            .await?
            .ok_or_else(|| LoadTestError::not_found(format!("execution {execution_id} not found")))?;
        if !execution.status.is_terminal() {
            return Err(LoadTestError::invalid_state("cannot recalculate a non-terminal execution"));
        }
        self.store.aggregate_execution(execution_id).await?;
        Ok(execution)
    }

    async fn untrack(&self, user_id: UserId, execution_id: ExecutionId) {
        let mut tracking = self.tracking.lock().await;
        if let Some(user_tracked) = tracking.get_mut(&user_id) {
            user_tracked.remove(&execution_id);
            if user_tracked.is_empty() {
                tracking.remove(&user_id);
            }
        }
        self.metrics.active_executions.dec();
    }

    /// Subprocess protocol steps 1-6 (§4.E).
    async fn run(&self, execution_id: ExecutionId, script_path: PathBuf, token: CancellationToken) {
        let Ok(Some(mut execution)) = self.store.get_execution(execution_id).await else {
            error!(%execution_id, "execution vanished before it could be started");
            return;
        };

        let now = self.clock.now_utc();
        if let Err(e) = execution.start(now) {
            error!(%execution_id, error = %e, "failed to transition execution to running");
            return;
        }
        if let Err(e) = self.store.update_execution(&execution).await {
            error!(%execution_id, error = %e, "failed to persist running transition");
            return;
        }
        debug!(%execution_id, "execution running");

        let csv_path = PathBuf::from(&self.config.csv_output_dir).join(format!("{execution_id}.csv"));
        if let Some(parent) = csv_path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }

        let deadline = execution.duration.as_duration() + self.config.subprocess_grace();

        let spawn_result = tokio::process::Command::new(&self.config.load_generator_bin)
            .arg("run")
            .arg("--vus")
            .arg(execution.vus.get().to_string())
            .arg("--duration")
            .arg(execution.duration.to_arg_string())
            .arg("--out")
            .arg(format!("csv={}", csv_path.display()))
            .arg("--summary-trend-stats")
            .arg("avg,min,max,p(90),p(95),p(99)")
            .arg(&script_path)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn();

        let (status, exit_code, stdout, stderr, error_message) = match spawn_result {
            Ok(mut child) => {
                let mut stdout_pipe = child.stdout.take();
                let mut stderr_pipe = child.stderr.take();

                let outcome = tokio::select! {
                    result = child.wait() => Outcome::Exited(result),
                    _ = tokio::time::sleep(deadline) => Outcome::TimedOut,
                    _ = token.cancelled() => Outcome::Cancelled,
                };

                if !matches!(outcome, Outcome::Exited(_)) {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                }

                let mut stdout_buf = String::new();
                let mut stderr_buf = String::new();
                if let Some(mut pipe) = stdout_pipe.take() {
                    let _ = pipe.read_to_string(&mut stdout_buf).await;
                }
                if let Some(mut pipe) = stderr_pipe.take() {
                    let _ = pipe.read_to_string(&mut stderr_buf).await;
                }

                match outcome {
                    Outcome::TimedOut => (
                        ExecutionStatus::Timeout,
                        None,
                        stdout_buf,
                        stderr_buf,
                        Some("exceeded maximum duration".to_string()),
                    ),
                    Outcome::Cancelled => (
                        ExecutionStatus::Cancelled,
                        None,
                        stdout_buf,
                        stderr_buf,
                        Some("was cancelled".to_string()),
                    ),
                    Outcome::Exited(Ok(exit_status)) if exit_status.success() => {
                        (ExecutionStatus::Completed, Some(0), stdout_buf, stderr_buf, None)
                    }
                    Outcome::Exited(Ok(exit_status)) => (
                        ExecutionStatus::Failed,
                        exit_status.code(),
                        stdout_buf,
                        stderr_buf,
                        Some(format!("load generator exited with {exit_status}")),
                    ),
                    Outcome::Exited(Err(e)) => (
                        ExecutionStatus::Failed,
                        None,
                        stdout_buf,
                        stderr_buf,
                        Some(format!("failed to wait on subprocess: {e}")),
                    ),
                }
            }
            Err(e) => (
                ExecutionStatus::Failed,
                None,
                String::new(),
                String::new(),
                Some(format!("failed to spawn load generator: {e}")),
            ),
        };

        let now = self.clock.now_utc();
        if let Err(e) = execution.finish(status, exit_code, error_message, now) {
            error!(%execution_id, error = %e, "failed to record terminal status");
            return;
        }
        execution.stdout = stdout;
        execution.stderr = stderr;
        self.metrics
            .executions_terminal_total
            .with_label_values(&[status_label(status)])
            .inc();
        if let (Some(started_at), Some(completed_at)) = (execution.started_at, execution.completed_at) {
            self.metrics
                .execution_duration_seconds
                .observe((completed_at - started_at).num_milliseconds() as f64 / 1000.0);
        }

        if tokio::fs::metadata(&csv_path).await.is_ok() {
            if let Err(e) = self.ingest_and_aggregate(&mut execution, &csv_path).await {
                warn!(%execution_id, error = %e, "metrics ingest/aggregation failed; terminal status preserved");
            }
        }

        if let Err(e) = self.store.update_execution(&execution).await {
            error!(%execution_id, error = %e, "failed to persist terminal execution state");
        }
        let _ = tokio::fs::remove_file(&csv_path).await;
    }

    async fn ingest_and_aggregate(&self, execution: &mut Execution, csv_path: &std::path::Path) -> Result<(), LoadTestError> {
        let inserted = csv_ingest::ingest_file(self.store.as_ref(), execution.id, execution.test_id, csv_path).await?;
        self.metrics.ingest_points_total.inc_by(inserted);

        let raw_points = self.store.raw_points_for_execution(execution.id).await?;
        let total_requests = raw_points.iter().filter(|p| p.metric_name == "http_reqs").count();
        let durations: Vec<f64> = raw_points
            .iter()
            .filter(|p| p.metric_name == "http_req_duration")
            .map(|p| p.value)
            .collect();
        let avg_response_ms = if durations.is_empty() {
            0.0
        } else {
            durations.iter().sum::<f64>() / durations.len() as f64
        };
        let failures = raw_points
            .iter()
            .filter(|p| p.metric_name == "http_reqs" && p.tags.is_failure())
            .count();
        let error_rate = if total_requests == 0 {
            0.0
        } else {
            (failures as f64 / total_requests as f64) * 100.0
        };

        let summary = HashMap::from([
            ("total_requests".to_string(), json!(total_requests)),
            ("avg_response_ms".to_string(), json!(round2(avg_response_ms))),
            ("error_rate".to_string(), json!(round2(error_rate))),
        ]);
        execution.attach_summary(summary, self.clock.now_utc());

        self.store.aggregate_execution(execution.id).await
    }
}

enum Outcome {
    Exited(std::io::Result<std::process::ExitStatus>),
    TimedOut,
    Cancelled,
}

fn status_label(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::Completed => "completed",
        ExecutionStatus::Failed => "failed",
        ExecutionStatus::Cancelled => "cancelled",
        ExecutionStatus::Timeout => "timeout",
        ExecutionStatus::Queued | ExecutionStatus::Running => "non_terminal",
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::NullStore;
    use loadtest_domain::SystemClock;

    #[test]
    fn round2_rounds_to_two_decimals() {
        assert_eq!(round2(150.0), 150.0);
        assert_eq!(round2(33.333333), 33.33);
    }

    #[tokio::test]
    async fn running_count_starts_at_zero() {
        let store: Arc<dyn MetricStore> = Arc::new(NullStore::default());
        let supervisor = ExecutionSupervisor::new(store, AppConfig::default(), Arc::new(SystemClock), Arc::new(ObservabilityMetrics::new().unwrap()));
        assert_eq!(supervisor.running_count(UserId::new()).await, 0);
    }

    #[tokio::test]
    async fn submit_rejects_beyond_max_concurrent() {
        let store: Arc<dyn MetricStore> = Arc::new(NullStore::default());
        let config = AppConfig {
            max_concurrent: 1,
            load_generator_bin: "true".to_string(),
            ..Default::default()
        };
        let supervisor = Arc::new(ExecutionSupervisor::new(store, config, Arc::new(SystemClock), Arc::new(ObservabilityMetrics::new().unwrap())));
        let user_id = UserId::new();

        let first = supervisor
            .submit(TestId::new(), user_id, None, Vus::new(1), RunDuration::parse_lenient("1s"), PathBuf::from("/dev/null"))
            .await;
        assert!(first.is_ok());

        let second = supervisor
            .submit(TestId::new(), user_id, None, Vus::new(1), RunDuration::parse_lenient("1s"), PathBuf::from("/dev/null"))
            .await;
        assert!(matches!(second, Err(LoadTestError::TooManyConcurrent)));
    }
}
