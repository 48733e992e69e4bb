// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log file path builders.

use std::path::{Path, PathBuf};

use wg_core::{file_stamp, JobId};

/// Build the path to a job's log file.
///
/// Structure: `{log_dir}/generate_{YYYYMMDD_HHMMSS}_{job short id}.log`
pub fn job_log_path(log_dir: &Path, job_id: &JobId, started_at_ms: u64) -> PathBuf {
    log_dir.join(format!("generate_{}_{}.log", file_stamp(started_at_ms), job_id.short(8)))
}

#[cfg(test)]
#[path = "log_paths_tests.rs"]
mod tests;
