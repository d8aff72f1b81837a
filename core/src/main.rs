// /////////////////////////////////////////////////////////////////////////////
// Load Test Orchestration Platform
// /////////////////////////////////////////////////////////////////////////////

//! # Orchestrator entry point
//!
//! Wires configuration, the Postgres-backed metric store, the execution
//! supervisor, the schedule engine, and the HTTP control surface together,
//! then dispatches on the bootstrap layer's validated CLI command. `serve`
//! is the only long-running command; the rest are one-shot operator
//! utilities that share the same startup sequence.

use loadtest_bootstrap::shutdown::ShutdownCoordinator;
use loadtest_bootstrap::{result_to_exit_code, ValidatedCommand};
use loadtest_core::config::AppConfig;
use loadtest_core::infrastructure::repositories::{schema, PostgresMetricStore};
use loadtest_core::{application, logging, metrics::ObservabilityMetrics, presentation};
use loadtest_domain::{Clock, ExecutionId, LoadTestError, MetricStore, SystemClock};
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match loadtest_bootstrap::bootstrap_cli() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(64); // EX_USAGE
        }
    };

    result_to_exit_code(run(cli.command).await)
}

async fn run(command: ValidatedCommand) -> Result<(), LoadTestError> {
    let config = AppConfig::load().map_err(|e| LoadTestError::fatal(format!("failed to load configuration: {e}")))?;
    logging::init_tracing(&config);

    match command {
        ValidatedCommand::CheckConfig => {
            println!("{config:#?}");
            Ok(())
        }
        ValidatedCommand::Serve { bind_addr } => serve(config, bind_addr).await,
        ValidatedCommand::CancelExecution { execution_id } => cancel_execution(config, execution_id).await,
        ValidatedCommand::RecalculateMetrics { execution_id } => recalculate_metrics(config, execution_id).await,
    }
}

async fn connect_store(config: &AppConfig) -> Result<Arc<PostgresMetricStore>, LoadTestError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|e| LoadTestError::fatal(format!("failed to connect to database: {e}")))?;
    schema::ensure_schema(&pool).await.map_err(|e| LoadTestError::fatal(format!("failed to apply schema: {e}")))?;
    Ok(Arc::new(PostgresMetricStore::new(pool)))
}

async fn serve(mut config: AppConfig, bind_addr_override: Option<String>) -> Result<(), LoadTestError> {
    if let Some(bind_addr) = bind_addr_override {
        config.bind_addr = bind_addr;
    }

    let store = connect_store(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let observability = Arc::new(ObservabilityMetrics::new()?);

    let supervisor = Arc::new(application::ExecutionSupervisor::new(
        store.clone() as Arc<dyn MetricStore>,
        config.clone(),
        clock.clone(),
        observability.clone(),
    ));
    let recovered = supervisor.recover_orphans().await.unwrap_or(0);
    if recovered > 0 {
        info!(recovered, "orphaned executions recovered at startup");
    }

    let scripts_dir = PathBuf::from(&config.scripts_dir);
    let schedule_engine = Arc::new(application::ScheduleEngine::new(
        store.clone() as Arc<dyn MetricStore>,
        supervisor.clone(),
        config.clone(),
        clock.clone(),
        observability.clone(),
        scripts_dir.clone(),
    ));
    let query_service = Arc::new(application::MetricsQueryService::new(store.clone() as Arc<dyn MetricStore>, config.clone()));

    let shutdown = ShutdownCoordinator::new(config.shutdown_grace());

    let scheduler_task = {
        let schedule_engine = schedule_engine.clone();
        let token = shutdown.token();
        tokio::spawn(async move { schedule_engine.run(token).await })
    };

    let state = presentation::AppState {
        store: store.clone() as Arc<dyn MetricStore>,
        supervisor,
        schedule_engine,
        query_service,
        config: config.clone(),
        scripts_dir,
    };
    let app = presentation::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| LoadTestError::fatal(format!("failed to bind {}: {e}", config.bind_addr)))?;
    info!(addr = %config.bind_addr, "control surface listening");

    let ctrl_c_shutdown = shutdown.clone();
    let server_token = shutdown.token();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown signal received");
                    ctrl_c_shutdown.initiate_shutdown();
                }
                _ = server_token.cancelled() => {}
            }
        })
        .await
        .map_err(|e| LoadTestError::fatal(format!("http server error: {e}")))?;

    shutdown.initiate_shutdown();
    scheduler_task.abort();
    Ok(())
}

async fn cancel_execution(config: AppConfig, execution_id: String) -> Result<(), LoadTestError> {
    let execution_id = ExecutionId::from_str(&execution_id).map_err(|_| LoadTestError::validation("execution id is not a valid identifier"))?;
    let store = connect_store(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let observability = Arc::new(ObservabilityMetrics::new()?);
    let supervisor = Arc::new(application::ExecutionSupervisor::new(
        store.clone() as Arc<dyn MetricStore>,
        config,
        clock,
        observability,
    ));

    let execution = store
        .get_execution(execution_id)
        .await?
        .ok_or_else(|| LoadTestError::not_found(format!("execution {execution_id} not found")))?;

    if supervisor.cancel(execution.user_id, execution_id).await {
        println!("cancellation requested for {execution_id}");
    } else {
        println!("{execution_id} is not tracked by this process (not running here, or already terminal)");
    }
    Ok(())
}

async fn recalculate_metrics(config: AppConfig, execution_id: String) -> Result<(), LoadTestError> {
    let execution_id = ExecutionId::from_str(&execution_id).map_err(|_| LoadTestError::validation("execution id is not a valid identifier"))?;
    let store = connect_store(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let observability = Arc::new(ObservabilityMetrics::new()?);
    let supervisor = Arc::new(application::ExecutionSupervisor::new(store as Arc<dyn MetricStore>, config, clock, observability));

    let execution = supervisor.recalculate(execution_id).await?;
    println!("recalculated metrics for {execution_id}: {:?}", execution.metrics_summary);
    Ok(())
}
