// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use wg_core::{JobId, JobPhase, JobReport, JobSummary, StatusReport};

/// Response from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Response {
    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Daemon is shutting down
    ShuttingDown,

    /// Daemon status
    Status {
        uptime_secs: u64,
        phase: JobPhase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job: Option<JobSummary>,
    },

    /// Job launched
    Started { job_id: JobId, message: String },

    /// Poll result
    JobStatus { report: StatusReport },

    /// Cancel result; `None` when nothing was running
    Cancelled { report: Option<JobReport> },

    /// Error response
    Error { message: String },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
