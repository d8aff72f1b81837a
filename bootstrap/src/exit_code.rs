// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Process Exit Codes
//!
//! Maps top-level `Result`s to Unix-style exit codes (sysexits.h) so the
//! shell and any process supervisor wrapping this binary can distinguish
//! configuration errors from runtime failures.

use std::process::ExitCode as StdExitCode;

/// Unix exit codes, following `sysexits.h` where applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    /// Generic failure not covered by a more specific code.
    Failure,
    /// Command line usage error (EX_USAGE).
    Usage,
    /// Input data was incorrect in some way (EX_DATAERR).
    DataErr,
    /// An input file did not exist or was not readable, or a required
    /// external resource (database, schedule store) was unavailable
    /// (EX_UNAVAILABLE).
    Unavailable,
}

impl ExitCode {
    pub fn code(self) -> u8 {
        match self {
            ExitCode::Success => 0,
            ExitCode::Failure => 1,
            ExitCode::Usage => 64,
            ExitCode::DataErr => 65,
            ExitCode::Unavailable => 69,
        }
    }
}

impl From<ExitCode> for StdExitCode {
    fn from(code: ExitCode) -> Self {
        StdExitCode::from(code.code())
    }
}

/// Maps a `loadtest_domain::LoadTestError` to an exit code for the CLI
/// entry point.
pub fn map_error_to_exit_code(error: &loadtest_domain::LoadTestError) -> ExitCode {
    use loadtest_domain::LoadTestError;

    match error {
        LoadTestError::Validation(_) | LoadTestError::InvalidState(_) => ExitCode::DataErr,
        LoadTestError::NotFound(_) => ExitCode::DataErr,
        LoadTestError::UpstreamIo(_) | LoadTestError::Fatal(_) => ExitCode::Unavailable,
        LoadTestError::Forbidden(_) | LoadTestError::Unauthorized(_) => ExitCode::Failure,
        LoadTestError::Conflict(_) | LoadTestError::TooManyConcurrent => ExitCode::Failure,
        LoadTestError::Internal(_) => ExitCode::Failure,
    }
}

/// Converts an arbitrary top-level result into a process exit code,
/// logging the error (if any) before returning.
pub fn result_to_exit_code<T>(result: Result<T, loadtest_domain::LoadTestError>) -> StdExitCode {
    match result {
        Ok(_) => StdExitCode::from(ExitCode::Success),
        Err(e) => {
            tracing::error!("{}", e);
            StdExitCode::from(map_error_to_exit_code(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_maps_to_zero() {
        assert_eq!(ExitCode::Success.code(), 0);
    }

    #[test]
    fn usage_maps_to_sysexits_usage() {
        assert_eq!(ExitCode::Usage.code(), 64);
    }
}
