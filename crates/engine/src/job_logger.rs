// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only logger for per-job generation logs.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use wg_core::{format_utc, JobId, LogRecord};

use crate::log_paths;

/// Append-only logger for one generation job.
///
/// Writes human-readable timestamped lines to:
///   `<log_dir>/generate_<stamp>_<job>.log`
///
/// The file is opened once when the job starts and stays open until the
/// job's report is delivered. The owner serializes calls.
pub struct JobLogger {
    path: PathBuf,
    file: Option<File>,
}

impl JobLogger {
    /// Open (or create) the log file for a job.
    ///
    /// Failures are logged via tracing and leave the logger disabled;
    /// logging must not stop a job from running.
    pub fn open(log_dir: &Path, job_id: &JobId, started_at_ms: u64) -> Self {
        let path = log_paths::job_log_path(log_dir, job_id, started_at_ms);
        let file = match Self::open_file(&path) {
            Ok(file) => Some(file),
            Err(e) => {
                tracing::warn!(
                    %job_id,
                    path = %path.display(),
                    error = %e,
                    "failed to open job log"
                );
                None
            }
        };
        Self { path, file }
    }

    fn open_file(path: &Path) -> std::io::Result<File> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record.
    ///
    /// Format: `2026-01-30T08:14:09Z [stdout] text`
    pub fn write(&mut self, record: &LogRecord) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        if let Err(e) = writeln!(file, "{} [{}] {}", format_utc(record.at_ms), record.source, record.text)
        {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to write job log; disabling"
            );
            self.file = None;
        }
    }
}

#[cfg(test)]
#[path = "job_logger_tests.rs"]
mod tests;
