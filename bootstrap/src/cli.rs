// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. Cli::parse()                    │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validate_cli()                  │  Range / address validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated config
//! └─────────────────────────────────────┘
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "loadtest-orchestrator", about = "Load test execution and metrics orchestration platform")]
pub struct Cli {
    /// Path to a configuration file (layered under environment variable overrides)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the orchestrator: HTTP control surface, execution supervisor,
    /// and schedule engine.
    Serve {
        /// Override the configured HTTP bind address
        #[arg(long)]
        bind_addr: Option<String>,
    },
    /// Load and print the effective configuration, then exit.
    CheckConfig,
    /// Cancel a running or queued execution by id.
    CancelExecution { execution_id: String },
    /// Re-run aggregation for a terminal execution by id.
    RecalculateMetrics { execution_id: String },
}

/// Errors produced while validating parsed CLI arguments.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid value for --{arg}: {reason}")]
    InvalidValue { arg: String, reason: String },
}

/// Validated CLI configuration
///
/// Holds all CLI arguments after validation: addresses parse, ids are
/// non-empty. The rest of the process never sees an unvalidated `Cli`.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<PathBuf>,
}

/// Validated command variants
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Serve { bind_addr: Option<String> },
    CheckConfig,
    CancelExecution { execution_id: String },
    RecalculateMetrics { execution_id: String },
}

/// Parse and validate CLI arguments
///
/// # Errors
///
/// Returns `ParseError` if any validation fails.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    validate_cli(Cli::parse())
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let command = match cli.command {
        Commands::Serve { bind_addr } => {
            if let Some(ref addr) = bind_addr {
                if addr.parse::<std::net::SocketAddr>().is_err() {
                    return Err(ParseError::InvalidValue {
                        arg: "bind-addr".to_string(),
                        reason: "must be a valid socket address, e.g. 0.0.0.0:8080".to_string(),
                    });
                }
            }
            ValidatedCommand::Serve { bind_addr }
        }
        Commands::CheckConfig => ValidatedCommand::CheckConfig,
        Commands::CancelExecution { execution_id } => ValidatedCommand::CancelExecution {
            execution_id: non_empty("execution-id", execution_id)?,
        },
        Commands::RecalculateMetrics { execution_id } => ValidatedCommand::RecalculateMetrics {
            execution_id: non_empty("execution-id", execution_id)?,
        },
    };

    Ok(ValidatedCli {
        command,
        verbose: cli.verbose,
        config: cli.config,
    })
}

fn non_empty(arg: &str, value: String) -> Result<String, ParseError> {
    if value.trim().is_empty() {
        Err(ParseError::InvalidValue {
            arg: arg.to_string(),
            reason: "must not be empty".to_string(),
        })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_bind_addr() {
        let cli = Cli {
            config: None,
            verbose: false,
            command: Commands::Serve {
                bind_addr: Some("not-an-addr".to_string()),
            },
        };
        assert!(validate_cli(cli).is_err());
    }

    #[test]
    fn rejects_empty_execution_id() {
        let cli = Cli {
            config: None,
            verbose: false,
            command: Commands::CancelExecution {
                execution_id: "  ".to_string(),
            },
        };
        assert!(validate_cli(cli).is_err());
    }

    #[test]
    fn accepts_valid_serve_command() {
        let cli = Cli {
            config: None,
            verbose: true,
            command: Commands::Serve {
                bind_addr: Some("127.0.0.1:9000".to_string()),
            },
        };
        let validated = validate_cli(cli).unwrap();
        assert!(validated.verbose);
    }

    #[test]
    fn serve_without_bind_addr_is_valid() {
        let cli = Cli {
            config: None,
            verbose: false,
            command: Commands::Serve { bind_addr: None },
        };
        assert!(validate_cli(cli).is_ok());
    }
}
