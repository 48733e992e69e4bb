// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-slot job orchestrator.
//!
//! The orchestrator owns one slot that is idle, tracking a running job, or
//! holding a terminal report a client has not received yet. Runner
//! callbacks, polls, start and cancel all take the same mutex, so the
//! `Running -> Completed -> Idle` transition (and the promotion that goes
//! with it) happens exactly once no matter how many polls race.
//! The mutex is never held across an `.await`.
//!
//! `start` and `check_status` can spend a long time in the filesystem;
//! async callers run them on the blocking pool.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use wg_core::{
    format_elapsed_ms, Clock, ExitOutcome, JobId, JobOutcome, JobPhase, JobReport, JobState,
    JobSummary, LogRecord, LogSource, Sentinel, StageLayout, StartAck, StatusReport, SystemClock,
};

use crate::config::OrchestratorConfig;
use crate::job_logger::JobLogger;
use crate::runner::{GeneratorCommand, JobHandle, LogSink, ProcessRunner, RunnerError};
use crate::stager::{FsStager, Stager};

/// Extra wait on top of the kill grace period before a cancel gives up
/// waiting for the exit notification.
const CANCEL_SLACK: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("job {0} is already running")]
    AlreadyRunning(JobId),

    #[error(transparent)]
    Spawn(#[from] RunnerError),
}

/// Everything behind the orchestrator's mutex.
struct Tracker {
    /// Output of the current job; emptied on start and after the report
    state: JobState,
    slot: Slot,
}

enum Slot {
    Idle,
    Running(Box<ActiveJob>),
    /// Terminal report that never reached a client
    Unclaimed(JobReport),
}

struct ActiveJob {
    id: JobId,
    logger: JobLogger,
    handle: Option<JobHandle>,
    started_at_ms: u64,
    cancelling: bool,
}

impl ActiveJob {
    /// Write to the job log file and the in-memory state.
    fn push(&mut self, state: &mut JobState, record: LogRecord) {
        self.logger.write(&record);
        state.append(record);
    }

    fn note(&mut self, state: &mut JobState, at_ms: u64, text: impl Into<String>) {
        self.push(state, LogRecord::new(LogSource::Orchestrator, at_ms, text));
    }

    fn notes(&mut self, state: &mut JobState, at_ms: u64, notes: Vec<String>) {
        for text in notes {
            self.note(state, at_ms, text);
        }
    }
}

/// State shared between the orchestrator and its runner callbacks.
struct Shared<C: Clock> {
    tracker: Mutex<Tracker>,
    clock: C,
    sentinel: Sentinel,
}

impl<C: Clock> LogSink for Shared<C> {
    fn append(&self, job_id: &JobId, source: LogSource, text: String) {
        let mut tracker = self.tracker.lock();
        let Tracker { state, slot } = &mut *tracker;
        let Slot::Running(job) = slot else {
            return;
        };
        if job.id != *job_id {
            tracing::debug!(%job_id, active = %job.id, "dropping output from stale job");
            return;
        }

        let hit = self.sentinel.matches(&text);
        job.push(state, LogRecord::new(source, self.clock.epoch_ms(), text));
        if hit && !state.is_complete() {
            tracing::info!(%job_id, "completion marker observed");
            state.mark_complete();
        }
    }

    fn exited(&self, job_id: &JobId, outcome: ExitOutcome) {
        let mut tracker = self.tracker.lock();
        let Tracker { state, slot } = &mut *tracker;
        let Slot::Running(job) = slot else {
            return;
        };
        if job.id != *job_id {
            return;
        }

        match &outcome {
            ExitOutcome::Success | ExitOutcome::Cancelled => {}
            other => {
                let now = self.clock.epoch_ms();
                job.note(state, now, format!("Error: generator {}", other));
            }
        }
        state.record_exit(outcome);
    }
}

/// What a poll should do with the active job.
enum Verdict {
    Pending,
    Promote,
    Fail(String),
}

/// Drives one generation job at a time from launch to promotion.
pub struct Orchestrator<S: Stager, C: Clock = SystemClock> {
    shared: Arc<Shared<C>>,
    stager: S,
    runner: ProcessRunner,
    command: GeneratorCommand,
    log_dir: PathBuf,
    require_clean_exit: bool,
}

impl Orchestrator<FsStager> {
    /// Orchestrator over the real filesystem and system clock.
    pub fn from_config(config: OrchestratorConfig) -> Self {
        let stager = FsStager::new(config.layout.clone(), config.transient_extension.clone());
        Self::with_clock(config, stager, SystemClock)
    }
}

impl<S: Stager> Orchestrator<S, SystemClock> {
    pub fn new(config: OrchestratorConfig, stager: S) -> Self {
        Self::with_clock(config, stager, SystemClock)
    }
}

impl<S: Stager, C: Clock> Orchestrator<S, C> {
    pub fn with_clock(config: OrchestratorConfig, stager: S, clock: C) -> Self {
        let tracker = Tracker { state: JobState::new(), slot: Slot::Idle };
        Self {
            shared: Arc::new(Shared { tracker: Mutex::new(tracker), clock, sentinel: config.sentinel }),
            stager,
            runner: ProcessRunner::new(config.limits),
            command: config.command,
            log_dir: config.log_dir,
            require_clean_exit: config.require_clean_exit,
        }
    }

    /// Clear leftovers and launch a new job.
    ///
    /// Returns as soon as the generator is spawned. Staging cleanup errors
    /// are recorded in the job log but do not stop the launch. An unclaimed
    /// report from the previous job is discarded.
    pub fn start(&self) -> Result<StartAck, OrchestratorError> {
        let mut tracker = self.shared.tracker.lock();
        let Tracker { state, slot } = &mut *tracker;
        match slot {
            Slot::Running(job) => return Err(OrchestratorError::AlreadyRunning(job.id.clone())),
            Slot::Unclaimed(report) => {
                tracing::warn!(job_id = %report.job_id, "discarding unclaimed report");
            }
            Slot::Idle => {}
        }

        let id = JobId::new();
        let now = self.shared.clock.epoch_ms();
        let logger = JobLogger::open(&self.log_dir, &id, now);
        let mut job = ActiveJob {
            id: id.clone(),
            logger,
            handle: None,
            started_at_ms: now,
            cancelling: false,
        };
        state.reset();

        let mut notes = Vec::new();
        if let Err(e) = self.stager.clear_staging(&mut notes) {
            tracing::warn!(job_id = %id, error = %e, "staging cleanup failed; launching anyway");
        }
        job.notes(state, now, notes);

        let layout = self.stager.layout();
        if let Err(e) = std::fs::create_dir_all(layout.root()) {
            tracing::warn!(job_id = %id, error = %e, "failed to create data root");
            job.note(state, now, format!("Error: failed to create {}: {}", layout.root().display(), e));
        }

        job.note(state, now, format!("Running: {} {}", self.command, layout.staging().display()));
        let handle =
            match self.runner.launch(&id, &self.command, layout.staging(), self.shared.clone()) {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::error!(job_id = %id, error = %e, "failed to launch generator");
                    job.note(state, now, format!("Error: {}", e));
                    state.reset();
                    *slot = Slot::Idle;
                    return Err(e.into());
                }
            };
        job.handle = Some(handle);
        *slot = Slot::Running(Box::new(job));

        tracing::info!(job_id = %id, "generation started");
        Ok(StartAck { job_id: id, message: "generation started".to_string() })
    }

    /// Report on the active job, promoting it if it has completed.
    ///
    /// A terminal report is returned exactly once; the slot is idle again
    /// when this returns it. A caller that fails to deliver it hands it back
    /// through [`Self::return_undelivered`].
    pub fn check_status(&self) -> StatusReport {
        let mut tracker = self.shared.tracker.lock();
        let Tracker { state, slot } = &mut *tracker;
        if matches!(slot, Slot::Unclaimed(_)) {
            return match std::mem::replace(slot, Slot::Idle) {
                Slot::Unclaimed(report) => StatusReport::Finished(report),
                _ => StatusReport::Idle,
            };
        }
        let Slot::Running(job) = slot else {
            return StatusReport::Idle;
        };

        let outcome = match self.verdict(job, state) {
            Verdict::Pending => {
                return StatusReport::Running { job_id: job.id.clone(), log: state.snapshot().log };
            }
            Verdict::Promote => self.promote(job, state),
            Verdict::Fail(reason) => {
                tracing::warn!(job_id = %job.id, %reason, "generation failed");
                self.clear(job, state);
                JobOutcome::Failed { reason }
            }
        };

        let report = self.finish(job, state, outcome);
        *slot = Slot::Idle;
        StatusReport::Finished(report)
    }

    /// Keep a terminal report whose delivery failed for the next poll.
    ///
    /// Dropped if another job has started in the meantime.
    pub fn return_undelivered(&self, report: JobReport) {
        let mut tracker = self.shared.tracker.lock();
        if matches!(tracker.slot, Slot::Idle) {
            tracing::warn!(job_id = %report.job_id, "report not delivered; keeping it for the next poll");
            tracker.slot = Slot::Unclaimed(report);
        } else {
            tracing::warn!(job_id = %report.job_id, "report not delivered and superseded; dropping it");
        }
    }

    /// Kill the active job and clear its staging output.
    ///
    /// Returns `None` when no job is running.
    pub async fn cancel(&self) -> Option<JobReport> {
        let (job_id, done) = {
            let mut tracker = self.shared.tracker.lock();
            let Tracker { state, slot } = &mut *tracker;
            let Slot::Running(job) = slot else {
                return None;
            };
            job.cancelling = true;
            job.note(state, self.shared.clock.epoch_ms(), "Cancelling generation");
            let done = job.handle.as_ref().filter(|handle| !handle.is_finished()).map(|handle| {
                handle.cancel();
                handle.done_token()
            });
            (job.id.clone(), done)
        };

        if let Some(done) = done {
            let wait = self.runner.limits().kill_grace + CANCEL_SLACK;
            if tokio::time::timeout(wait, done.cancelled()).await.is_err() {
                tracing::warn!(%job_id, "generator did not report exit after cancel");
            }
        }

        let mut tracker = self.shared.tracker.lock();
        let Tracker { state, slot } = &mut *tracker;
        let job = match slot {
            Slot::Running(job) if job.id == job_id => job,
            _ => return None,
        };
        self.clear(job, state);
        let report = self.finish(job, state, JobOutcome::Cancelled);
        *slot = Slot::Idle;
        Some(report)
    }

    pub fn phase(&self) -> JobPhase {
        match &self.shared.tracker.lock().slot {
            Slot::Idle => JobPhase::Idle,
            Slot::Running(_) => JobPhase::Running,
            Slot::Unclaimed(_) => JobPhase::Completed,
        }
    }

    pub fn active_job(&self) -> Option<JobId> {
        match &self.shared.tracker.lock().slot {
            Slot::Running(job) => Some(job.id.clone()),
            Slot::Idle | Slot::Unclaimed(_) => None,
        }
    }

    /// Summary of the active job, without touching its state.
    pub fn summary(&self) -> Option<JobSummary> {
        let tracker = self.shared.tracker.lock();
        match &tracker.slot {
            Slot::Running(job) => Some(JobSummary {
                job_id: job.id.clone(),
                started_at_ms: job.started_at_ms,
                pid: job.handle.as_ref().and_then(JobHandle::pid),
                lines: tracker.state.line_count(),
                log_path: job.logger.path().to_path_buf(),
            }),
            Slot::Idle | Slot::Unclaimed(_) => None,
        }
    }

    /// Directories this orchestrator stages into.
    pub fn layout(&self) -> &StageLayout {
        self.stager.layout()
    }

    #[cfg(test)]
    fn stager(&self) -> &S {
        &self.stager
    }

    fn verdict(&self, job: &ActiveJob, state: &JobState) -> Verdict {
        if job.cancelling {
            return Verdict::Pending;
        }
        let exit = state.exit();
        if state.is_complete() {
            if !self.require_clean_exit {
                return Verdict::Promote;
            }
            return match exit {
                None => Verdict::Pending,
                Some(outcome) if outcome.is_success() => Verdict::Promote,
                Some(other) => Verdict::Fail(format!("generator {} after completion marker", other)),
            };
        }
        match exit {
            None => Verdict::Pending,
            Some(outcome) => Verdict::Fail(format!("generator {} without completion marker", outcome)),
        }
    }

    fn promote(&self, job: &mut ActiveJob, state: &mut JobState) -> JobOutcome {
        let mut notes = Vec::new();
        let result = self.stager.promote(&mut notes);
        let now = self.shared.clock.epoch_ms();
        job.notes(state, now, notes);
        match result {
            Ok(promotion) => {
                job.note(state, now, promotion.to_string());
                JobOutcome::Promoted
            }
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "promotion failed");
                JobOutcome::Failed { reason: e.to_string() }
            }
        }
    }

    fn clear(&self, job: &mut ActiveJob, state: &mut JobState) {
        let mut notes = Vec::new();
        if let Err(e) = self.stager.clear_staging(&mut notes) {
            tracing::warn!(job_id = %job.id, error = %e, "failed to clear staging");
        }
        job.notes(state, self.shared.clock.epoch_ms(), notes);
    }

    /// Append the terminal marker, build the report and empty the state.
    fn finish(&self, job: &mut ActiveJob, state: &mut JobState, outcome: JobOutcome) -> JobReport {
        let now = self.shared.clock.epoch_ms();
        let marker = match &outcome {
            JobOutcome::Promoted => "Generation finished.".to_string(),
            JobOutcome::Failed { reason } => format!("Generation failed: {}", reason),
            JobOutcome::Cancelled => "Generation cancelled.".to_string(),
        };
        job.note(state, now, marker);

        tracing::info!(
            job_id = %job.id,
            phase = %JobPhase::Completed,
            outcome = %outcome,
            lines = state.line_count(),
            omitted = state.omitted(),
            elapsed = %format_elapsed_ms(now.saturating_sub(job.started_at_ms)),
            log = %job.logger.path().display(),
            "job finished"
        );
        let snapshot = state.snapshot();
        state.reset();
        JobReport { job_id: job.id.clone(), outcome, log: snapshot.log }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
