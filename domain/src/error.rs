// /////////////////////////////////////////////////////////////////////////////
// Load Test Orchestration Platform
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! A single, flat error enum for the whole execution + metrics core. Every
//! layer above the domain maps `LoadTestError` variants to its own
//! vocabulary (HTTP status codes, exit codes, log levels) rather than
//! growing parallel error hierarchies.
//!
//! ## Error Categories
//!
//! - **Validation** — caller-supplied input fails a constraint.
//! - **NotFound / Forbidden / Conflict / Unauthorized** — ownership and
//!   lookup failures.
//! - **TooManyConcurrent** — admission rejection.
//! - **UpstreamIo** — store, cache, disk, or subprocess failure; callers in
//!   the supervisor's post-run step log and swallow this rather than let it
//!   hide a terminal status.
//! - **Fatal** — the process should refuse to serve (store unreachable at
//!   startup).
//! - **Internal** — anything else, including task panics.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum LoadTestError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("too many concurrent executions for user")]
    TooManyConcurrent,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("upstream io error: {0}")]
    UpstreamIo(String),

    #[error("fatal: {0}")]
    Fatal(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl LoadTestError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn upstream_io(msg: impl Into<String>) -> Self {
        Self::UpstreamIo(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a caller may retry this operation unchanged.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UpstreamIo(_) | Self::TooManyConcurrent)
    }

    /// Stable category tag, used for metrics labels and structured logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::Conflict(_) => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            Self::TooManyConcurrent => "too_many_concurrent",
            Self::InvalidState(_) => "invalid_state",
            Self::UpstreamIo(_) => "upstream_io",
            Self::Fatal(_) => "fatal",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<std::io::Error> for LoadTestError {
    fn from(err: std::io::Error) -> Self {
        Self::UpstreamIo(err.to_string())
    }
}

impl From<serde_json::Error> for LoadTestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("serialization error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_only_for_transient_kinds() {
        assert!(LoadTestError::UpstreamIo("x".into()).is_recoverable());
        assert!(LoadTestError::TooManyConcurrent.is_recoverable());
        assert!(!LoadTestError::Validation("x".into()).is_recoverable());
    }

    #[test]
    fn category_is_stable() {
        assert_eq!(LoadTestError::NotFound("x".into()).category(), "not_found");
    }
}
