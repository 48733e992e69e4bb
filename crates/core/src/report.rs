// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Results handed back to clients by start, poll, and cancel.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::job::JobId;

/// Immediate acknowledgment of a started job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartAck {
    pub job_id: JobId,
    pub message: String,
}

/// How a job ended, from the client's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Staging directory was promoted to live
    Promoted,
    /// No promotion happened; `live` is unchanged
    Failed { reason: String },
    Cancelled,
}

impl JobOutcome {
    pub fn is_promoted(&self) -> bool {
        matches!(self, JobOutcome::Promoted)
    }
}

crate::simple_display! {
    JobOutcome {
        Promoted => "promoted",
        Failed { .. } => "failed",
        Cancelled => "cancelled",
    }
}

/// Terminal report for a job. Delivered exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: JobId,
    pub outcome: JobOutcome,
    /// Full rendered log, including promotion notes and the terminal marker
    pub log: String,
}

/// Daemon-facing view of the active job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Log records captured so far
    pub lines: usize,
    pub log_path: PathBuf,
}

/// Answer to a status poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StatusReport {
    /// No job tracked
    Idle,
    /// Job still running; `log` is everything seen so far
    Running { job_id: JobId, log: String },
    /// Job just finished; state has been reset
    Finished(JobReport),
}

impl StatusReport {
    /// Log text as the original poll endpoint returned it: empty when idle.
    pub fn log_text(&self) -> &str {
        match self {
            StatusReport::Idle => "",
            StatusReport::Running { log, .. } => log,
            StatusReport::Finished(report) => &report.log,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StatusReport::Finished(_))
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
