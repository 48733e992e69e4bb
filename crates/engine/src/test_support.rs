// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test doubles for the engine's seams.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use wg_core::{ExitOutcome, JobId, LogSource, StageLayout};

use crate::runner::LogSink;
use crate::stager::{Promotion, StageError, Stager};

/// [`LogSink`] that records every call.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<(JobId, LogSource, String)>>,
    exits: Mutex<Vec<(JobId, ExitOutcome)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines received from one stream, in arrival order.
    pub fn lines(&self, source: LogSource) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|(_, s, _)| *s == source)
            .map(|(_, _, text)| text.clone())
            .collect()
    }

    pub fn exits(&self) -> Vec<ExitOutcome> {
        self.exits.lock().iter().map(|(_, outcome)| outcome.clone()).collect()
    }
}

impl LogSink for RecordingSink {
    fn append(&self, job_id: &JobId, source: LogSource, text: String) {
        self.lines.lock().push((job_id.clone(), source, text));
    }

    fn exited(&self, job_id: &JobId, outcome: ExitOutcome) {
        self.exits.lock().push((job_id.clone(), outcome));
    }
}

/// [`Stager`] that counts calls and touches nothing on disk.
pub struct FakeStager {
    layout: StageLayout,
    promotions: AtomicUsize,
    clears: AtomicUsize,
    fail_promote: bool,
    promote_delay: Option<Duration>,
}

impl FakeStager {
    pub fn new(layout: StageLayout) -> Self {
        Self {
            layout,
            promotions: AtomicUsize::new(0),
            clears: AtomicUsize::new(0),
            fail_promote: false,
            promote_delay: None,
        }
    }

    /// Make every promotion fail with `StagingMissing`.
    pub fn failing(mut self) -> Self {
        self.fail_promote = true;
        self
    }

    /// Block inside `promote` to widen race windows.
    pub fn with_promote_delay(mut self, delay: Duration) -> Self {
        self.promote_delay = Some(delay);
        self
    }

    pub fn promotions(&self) -> usize {
        self.promotions.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl Stager for FakeStager {
    fn layout(&self) -> &StageLayout {
        &self.layout
    }

    fn clear_staging(&self, notes: &mut Vec<String>) -> Result<(), StageError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        notes.push("cleared staging".to_string());
        Ok(())
    }

    fn promote(&self, notes: &mut Vec<String>) -> Result<Promotion, StageError> {
        self.promotions.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.promote_delay {
            std::thread::sleep(delay);
        }
        if self.fail_promote {
            notes.push("Error: staging directory missing".to_string());
            return Err(StageError::StagingMissing(self.layout.staging().to_path_buf()));
        }
        notes.push("promoted".to_string());
        Ok(Promotion { replaced_previous: false, removed_transient: 0 })
    }
}
