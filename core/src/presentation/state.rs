//! Shared axum application state: every component the control surface
//! dispatches to, plus enough config to cap/validate requests before they
//! reach a component.

use crate::application::{ExecutionSupervisor, MetricsQueryService, ScheduleEngine};
use crate::config::AppConfig;
use loadtest_domain::MetricStore;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MetricStore>,
    pub supervisor: Arc<ExecutionSupervisor>,
    pub schedule_engine: Arc<ScheduleEngine>,
    pub query_service: Arc<MetricsQueryService>,
    pub config: AppConfig,
    /// Where a test's script artifact lives on local disk. Per-entity test
    /// CRUD is out of scope (§1); this core resolves `test_id -> path`
    /// with a single configured root rather than a test repository.
    pub scripts_dir: PathBuf,
}

impl AppState {
    pub fn script_path(&self, test_id: loadtest_domain::TestId) -> PathBuf {
        self.scripts_dir.join(format!("{test_id}.js"))
    }
}
