// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier, phase, and log record types.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for one generation run.
    ///
    /// Each start gets a fresh ID so output from a previous, cancelled run
    /// can never be attributed to the current one.
    pub struct JobId("job-");
}

/// Phase of the orchestrator's single job slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// No job tracked
    Idle,
    /// Generator process launched, report not yet delivered
    Running,
    /// Terminal report built but not yet delivered to a client
    Completed,
}

crate::simple_display! {
    JobPhase {
        Idle => "idle",
        Running => "running",
        Completed => "completed",
    }
}

/// Where a log record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    Stdout,
    Stderr,
    /// Notes written by the orchestrator itself (cleanup, promotion steps)
    Orchestrator,
}

crate::simple_display! {
    LogSource {
        Stdout => "stdout",
        Stderr => "stderr",
        Orchestrator => "wg",
    }
}

const STDERR_PREFIX: &str = "Error: ";

/// One chunk of job output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub source: LogSource,
    pub at_ms: u64,
    pub text: String,
}

impl LogRecord {
    pub fn new(source: LogSource, at_ms: u64, text: impl Into<String>) -> Self {
        Self { source, at_ms, text: text.into() }
    }

    /// Client-facing rendering. Stderr chunks carry an `Error: ` prefix.
    pub fn render(&self) -> String {
        format!("{}{}", self.prefix(), self.text)
    }

    /// Length of [`render`](Self::render) plus its line separator.
    pub fn rendered_len(&self) -> usize {
        self.prefix().len() + self.text.len() + 1
    }

    fn prefix(&self) -> &'static str {
        match self.source {
            LogSource::Stderr => STDERR_PREFIX,
            LogSource::Stdout | LogSource::Orchestrator => "",
        }
    }
}

/// How the generator process ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitOutcome {
    Success,
    Failed { code: Option<i32> },
    TimedOut,
    Cancelled,
    /// Waiting on the child failed; its real status is unknown
    Lost { reason: String },
}

impl ExitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitOutcome::Success)
    }
}

impl std::fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitOutcome::Success => write!(f, "exited successfully"),
            ExitOutcome::Failed { code: Some(code) } => write!(f, "exited with code {}", code),
            ExitOutcome::Failed { code: None } => write!(f, "terminated by signal"),
            ExitOutcome::TimedOut => write!(f, "timed out"),
            ExitOutcome::Cancelled => write!(f, "cancelled"),
            ExitOutcome::Lost { reason } => write!(f, "lost track of process: {}", reason),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
