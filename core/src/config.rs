// /////////////////////////////////////////////////////////////////////////////
// Load Test Orchestration Platform
// /////////////////////////////////////////////////////////////////////////////

//! # Application configuration
//!
//! Layered the way the teacher's `generic_config_manager.rs` does:
//! `default.toml` -> `{RUN_MODE}.toml` -> environment variables prefixed
//! `APP__`, double underscore as the nesting separator (`APP__DATABASE_URL`).

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub max_concurrent: u32,
    pub max_vus: u32,
    pub max_duration_secs: u64,
    pub long_range_threshold_secs: i64,
    pub cache_ttl_secs: u64,
    pub scheduler_tick_secs: u64,
    pub database_url: String,
    pub bind_addr: String,
    pub metrics_bind_addr: String,
    pub log_level: String,
    pub log_format: String,
    pub shutdown_grace_secs: u64,
    pub load_generator_bin: String,
    pub csv_output_dir: String,
    pub subprocess_grace_secs: u64,
    /// Root directory under which each test's script artifact lives, as
    /// `{scripts_dir}/{test_id}.js`. Per-entity test CRUD is out of scope
    /// (§1); this core resolves `test_id -> path` directly rather than
    /// through a test repository.
    pub scripts_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            max_vus: 20,
            max_duration_secs: 300,
            long_range_threshold_secs: 12 * 3600,
            cache_ttl_secs: 30,
            scheduler_tick_secs: 10,
            database_url: "postgres://localhost/loadtest".to_string(),
            bind_addr: "0.0.0.0:8080".to_string(),
            metrics_bind_addr: "0.0.0.0:9090".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            shutdown_grace_secs: 5,
            load_generator_bin: "rmeter".to_string(),
            csv_output_dir: "/tmp/loadtest-orchestrator".to_string(),
            subprocess_grace_secs: 30,
            scripts_dir: "/etc/loadtest-orchestrator/scripts".to_string(),
        }
    }
}

impl AppConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    pub fn long_range_threshold(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.long_range_threshold_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn scheduler_tick(&self) -> Duration {
        Duration::from_secs(self.scheduler_tick_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn subprocess_grace(&self) -> Duration {
        Duration::from_secs(self.subprocess_grace_secs)
    }

    /// Loads configuration from `config/default`, an optional
    /// `config/{RUN_MODE}` overlay, then `APP__`-prefixed environment
    /// variables, in that order of precedence.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_specification() {
        let config = AppConfig::default();
        assert_eq!(config.max_concurrent, 5);
        assert_eq!(config.max_vus, 20);
        assert_eq!(config.max_duration(), Duration::from_secs(300));
        assert_eq!(config.long_range_threshold(), chrono::Duration::hours(12));
        assert_eq!(config.cache_ttl(), Duration::from_secs(30));
        assert_eq!(config.scheduler_tick(), Duration::from_secs(10));
    }

    #[test]
    fn env_override_takes_precedence() {
        std::env::set_var("APP__MAX_CONCURRENT", "9");
        std::env::set_var("RUN_MODE", "test_env_override_takes_precedence");
        let config = AppConfig::load().unwrap();
        assert_eq!(config.max_concurrent, 9);
        std::env::remove_var("APP__MAX_CONCURRENT");
        std::env::remove_var("RUN_MODE");
    }
}
