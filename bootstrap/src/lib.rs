// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the enterprise application layers
//! (domain, application, infrastructure) and provides:
//!
//! - **Entry point** - CLI parsing and process lifecycle
//! - **Argument parsing** - Validated CLI argument handling
//! - **Error handling** - Unix exit code mapping
//! - **Logging** - Bootstrap-phase logging abstraction
//! - **Async coordination** - Shutdown coordination and cancellation
//!
//! ## Architecture Position
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          BOOTSTRAP (This Module)            │
//! │  - Entry Point                              │
//! │  - CLI Parsing & Validation                 │
//! │  - Shutdown Coordination                    │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │         APPLICATION LAYER (core)            │
//! │  - Execution supervisor, schedule engine    │
//! │  - HTTP control surface                     │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │           DOMAIN LAYER                      │
//! │  - Business Logic                           │
//! │  - Entities & Value Objects & Ports          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Key Design Principles
//!
//! 1. **Separation from Enterprise Layers** - bootstrap can see all layers;
//!    the domain and application layers never see bootstrap.
//! 2. **Graceful Shutdown** - cancellation token propagation with a grace
//!    period and timeout enforcement, shared by the execution supervisor
//!    and the schedule engine.
//! 3. **Validated CLI** - numeric ranges and addresses are checked before
//!    the rest of the process sees them.
//! 4. **Testability** - logging and shutdown are behind traits with no-op
//!    / capturing test doubles.
//!
//! ## Module Structure
//!
//! - `cli` - argument parsing and validation
//! - `exit_code` - Unix exit code mapping
//! - `logger` - bootstrap-specific logging
//! - `shutdown` - shutdown coordination

pub mod cli;
pub mod exit_code;
pub mod logger;
pub mod shutdown;

pub use cli::{parse_and_validate, ValidatedCli, ValidatedCommand};
pub use exit_code::{map_error_to_exit_code, result_to_exit_code, ExitCode};

/// Bootstrap and parse CLI arguments
///
/// This is the main entry point for the bootstrap layer. It handles CLI
/// parsing with clap and argument validation, returning a `ValidatedCli`.
///
/// The caller is responsible for running the application logic and mapping
/// the result to an exit code with [`result_to_exit_code`].
///
/// # Errors
///
/// Returns `cli::ParseError` if CLI parsing or validation fails. Clap
/// handles `--help`/`--version` itself and exits the process.
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}
