// /////////////////////////////////////////////////////////////////////////////
// Load Test Orchestration Platform
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Load Test Orchestration Platform - application and infrastructure
//!
//! Application use cases and infrastructure adapters for running HTTP load
//! tests as subprocesses and serving their metrics:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Presentation Layer                          │
//! │  (axum HTTP control surface)                                 │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application Layer                           │
//! │  (execution supervisor, schedule engine, metrics query svc)  │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Domain Layer (loadtest-domain)                │
//! │  (entities, value objects, the MetricStore port)              │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Infrastructure Layer                           │
//! │  (Postgres repository, CSV ingester, cron parsing, cache)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - layered configuration (defaults, file, environment)
//! - [`logging`] - structured `tracing` subscriber setup
//! - [`metrics`] - ambient Prometheus process metrics
//! - [`infrastructure`] - Postgres repository, schema, CSV ingestion, cron
//! - [`application`] - execution supervisor, schedule engine, query service
//! - [`presentation`] - the axum HTTP control surface

pub mod application;
pub mod config;
pub mod infrastructure;
pub mod logging;
pub mod metrics;
pub mod presentation;

#[cfg(test)]
pub mod test_support;

pub use config::AppConfig;
pub use metrics::ObservabilityMetrics;
