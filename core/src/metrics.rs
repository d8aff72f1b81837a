// /////////////////////////////////////////////////////////////////////////////
// Load Test Orchestration Platform
// /////////////////////////////////////////////////////////////////////////////

//! # Process observability metrics
//!
//! Ambient Prometheus metrics for the orchestrator itself (executions
//! accepted/rejected, ingest throughput, schedule fires) - distinct from the
//! domain's own time-series metric store, which records the load test's
//! metrics, not the orchestrator's.

use loadtest_domain::LoadTestError;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;

#[derive(Clone)]
pub struct ObservabilityMetrics {
    registry: Arc<Registry>,
    pub executions_submitted_total: IntCounter,
    pub executions_rejected_total: IntCounter,
    pub executions_terminal_total: IntCounterVec,
    pub execution_duration_seconds: Histogram,
    pub active_executions: IntGauge,
    pub schedule_fires_total: IntCounter,
    pub ingest_points_total: IntCounter,
}

impl ObservabilityMetrics {
    pub fn new() -> Result<Self, LoadTestError> {
        let registry = Registry::new();
        let ns = "loadtest_orchestrator";

        let executions_submitted_total = IntCounter::with_opts(
            Opts::new("executions_submitted_total", "Total executions accepted by the supervisor").namespace(ns),
        )
        .map_err(|e| LoadTestError::internal(format!("failed to create executions_submitted_total: {e}")))?;

        let executions_rejected_total = IntCounter::with_opts(
            Opts::new("executions_rejected_total", "Total executions rejected by admission control").namespace(ns),
        )
        .map_err(|e| LoadTestError::internal(format!("failed to create executions_rejected_total: {e}")))?;

        let executions_terminal_total = IntCounterVec::new(
            Opts::new("executions_terminal_total", "Executions reaching a terminal status, by status").namespace(ns),
            &["status"],
        )
        .map_err(|e| LoadTestError::internal(format!("failed to create executions_terminal_total: {e}")))?;

        let execution_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("execution_duration_seconds", "Wall-clock time from running to terminal")
                .namespace(ns)
                .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        )
        .map_err(|e| LoadTestError::internal(format!("failed to create execution_duration_seconds: {e}")))?;

        let active_executions = IntGauge::with_opts(
            Opts::new("active_executions", "Executions currently tracked as queued or running").namespace(ns),
        )
        .map_err(|e| LoadTestError::internal(format!("failed to create active_executions: {e}")))?;

        let schedule_fires_total = IntCounter::with_opts(
            Opts::new("schedule_fires_total", "Total schedule firings materialized into executions").namespace(ns),
        )
        .map_err(|e| LoadTestError::internal(format!("failed to create schedule_fires_total: {e}")))?;

        let ingest_points_total = IntCounter::with_opts(
            Opts::new("ingest_points_total", "Total raw metric points ingested").namespace(ns),
        )
        .map_err(|e| LoadTestError::internal(format!("failed to create ingest_points_total: {e}")))?;

        registry
            .register(Box::new(executions_submitted_total.clone()))
            .and_then(|_| registry.register(Box::new(executions_rejected_total.clone())))
            .and_then(|_| registry.register(Box::new(executions_terminal_total.clone())))
            .and_then(|_| registry.register(Box::new(execution_duration_seconds.clone())))
            .and_then(|_| registry.register(Box::new(active_executions.clone())))
            .and_then(|_| registry.register(Box::new(schedule_fires_total.clone())))
            .and_then(|_| registry.register(Box::new(ingest_points_total.clone())))
            .map_err(|e| LoadTestError::internal(format!("failed to register metrics: {e}")))?;

        Ok(Self {
            registry: Arc::new(registry),
            executions_submitted_total,
            executions_rejected_total,
            executions_terminal_total,
            execution_duration_seconds,
            active_executions,
            schedule_fires_total,
            ingest_points_total,
        })
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf).expect("prometheus encoding never fails on valid metrics");
        String::from_utf8(buf).expect("prometheus text encoder always emits valid utf-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_registered_metrics() {
        let metrics = ObservabilityMetrics::new().unwrap();
        metrics.executions_submitted_total.inc();
        let rendered = metrics.render();
        assert!(rendered.contains("loadtest_orchestrator_executions_submitted_total"));
    }
}
