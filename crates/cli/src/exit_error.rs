// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

use wg_core::{JobOutcome, JobReport};

/// Exit code for a job that finished without promoting
pub const EXIT_JOB_FAILED: i32 = 1;
/// Exit code for a job that was cancelled
pub const EXIT_JOB_CANCELLED: i32 = 2;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    /// Printed to stderr by `main()` when non-empty
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// Exit status for a terminal report; `None` when the dataset was promoted.
    pub fn for_report(report: &JobReport) -> Option<Self> {
        match &report.outcome {
            JobOutcome::Promoted => None,
            JobOutcome::Failed { reason } => Some(Self::new(EXIT_JOB_FAILED, reason.clone())),
            JobOutcome::Cancelled => Some(Self::new(EXIT_JOB_CANCELLED, String::new())),
        }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}
