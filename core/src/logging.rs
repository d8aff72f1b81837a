// /////////////////////////////////////////////////////////////////////////////
// Load Test Orchestration Platform
// /////////////////////////////////////////////////////////////////////////////

//! # Structured logging setup
//!
//! Initializes the global `tracing` subscriber once at process start, with
//! `EnvFilter` driven by `RUST_LOG` (falling back to the configured
//! `log_level`), and pretty or JSON formatting per `log_format`.

use crate::config::AppConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the process-wide tracing subscriber. Call once, before any
/// other component logs.
pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = fmt().with_env_filter(filter).with_target(true);

    match config.log_format.as_str() {
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}
