// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory state of the single tracked generation job.
//!
//! `JobState` itself does no locking. The orchestrator owns one behind a
//! mutex, and every writer (stdout consumer, stderr consumer, exit
//! supervisor, polling request) goes through that lock, so each stream's
//! records keep their arrival order.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::job::{ExitOutcome, LogRecord};

/// Marker string the generator prints when its work is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sentinel(String);

impl Sentinel {
    /// The end-of-work line printed by `createWindFiles.py`.
    pub const DEFAULT: &'static str = "Good bye.";

    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substring match. An empty marker never matches.
    pub fn matches(&self, chunk: &str) -> bool {
        !self.0.is_empty() && chunk.contains(&self.0)
    }
}

impl Default for Sentinel {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

/// Rendered log bytes kept in memory per job.
///
/// Half goes to the first lines of the run and half to the most recent
/// ones; lines in between are dropped and counted. The job log file keeps
/// everything. Kept well under the wire frame limit even after JSON
/// escaping.
pub const DEFAULT_LOG_LIMIT: usize = 2 * 1024 * 1024;

const MIN_LOG_LIMIT: usize = 256;
const TRUNCATED: &str = " [truncated]";

/// Accumulated output and completion flags for one job.
#[derive(Debug, Clone)]
pub struct JobState {
    head: Vec<LogRecord>,
    tail: VecDeque<LogRecord>,
    head_bytes: usize,
    tail_bytes: usize,
    limit: usize,
    omitted: usize,
    total: usize,
    completed: bool,
    exit: Option<ExitOutcome>,
}

/// Point-in-time view of a [`JobState`] for a polling client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub log: String,
    pub completed: bool,
}

impl Default for JobState {
    fn default() -> Self {
        Self::with_limit(DEFAULT_LOG_LIMIT)
    }
}

impl JobState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State that keeps at most `limit` rendered bytes in memory.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            head: Vec::new(),
            tail: VecDeque::new(),
            head_bytes: 0,
            tail_bytes: 0,
            limit: limit.max(MIN_LOG_LIMIT),
            omitted: 0,
            total: 0,
            completed: false,
            exit: None,
        }
    }

    /// Append a record. Empty chunks and bare newlines are dropped.
    ///
    /// Returns whether the record was kept.
    pub fn append(&mut self, mut record: LogRecord) -> bool {
        if record.text.trim_end_matches(['\n', '\r']).is_empty() {
            return false;
        }
        let half = self.limit / 2;
        truncate(&mut record.text, half / 2);
        self.total += 1;

        let size = record.rendered_len();
        if self.tail.is_empty() && self.head_bytes + size <= half {
            self.head_bytes += size;
            self.head.push(record);
            return true;
        }

        self.tail_bytes += size;
        self.tail.push_back(record);
        while self.tail_bytes > half {
            let Some(dropped) = self.tail.pop_front() else {
                break;
            };
            self.tail_bytes -= dropped.rendered_len();
            self.omitted += 1;
        }
        true
    }

    /// Record that the sentinel has been observed. Idempotent.
    pub fn mark_complete(&mut self) {
        self.completed = true;
    }

    /// Record how the process ended. The first outcome wins.
    pub fn record_exit(&mut self, outcome: ExitOutcome) {
        if self.exit.is_none() {
            self.exit = Some(outcome);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn exit(&self) -> Option<&ExitOutcome> {
        self.exit.as_ref()
    }

    /// Every record appended since the last reset, including omitted ones.
    pub fn line_count(&self) -> usize {
        self.total
    }

    pub fn omitted(&self) -> usize {
        self.omitted
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot { log: self.render(), completed: self.completed }
    }

    /// Client-facing log text: one rendered record per line.
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = self.head.iter().map(LogRecord::render).collect();
        if self.omitted > 0 {
            lines.push(format!("[{} lines omitted; see the job log file]", self.omitted));
        }
        lines.extend(self.tail.iter().map(LogRecord::render));
        lines.join("\n")
    }

    /// Drop all output and flags, keeping the memory limit.
    pub fn reset(&mut self) {
        *self = Self::with_limit(self.limit);
    }
}

/// Cut `text` to at most `max` bytes on a char boundary.
fn truncate(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut cut = max.saturating_sub(TRUNCATED.len());
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str(TRUNCATED);
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
