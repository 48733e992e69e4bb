// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generator process launch and supervision.
//!
//! [`ProcessRunner::launch`] spawns the generator with the staging
//! directory as its final argument and returns immediately. Background
//! tasks forward every output line to a [`LogSink`] and report the exit
//! outcome once both streams are drained.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wg_core::{ExitOutcome, JobId, LogSource};

/// How long to wait for output pumps after the process exits.
///
/// A grandchild that inherited the pipes can hold them open indefinitely.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors from launching the generator.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("generator program is empty")]
    EmptyProgram,

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// The external generator invocation, minus the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Defaults to the daemon's working directory
    pub working_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl GeneratorCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Build the process command. `output_dir` is appended as the last argument.
    fn to_command(&self, output_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(output_dir)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .process_group(0);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for GeneratorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Receiver for a running job's output and exit.
///
/// Calls for one stream arrive in the order the process wrote them.
/// `exited` is called once, after both streams have been drained.
pub trait LogSink: Send + Sync + 'static {
    fn append(&self, job_id: &JobId, source: LogSource, text: String);
    fn exited(&self, job_id: &JobId, outcome: ExitOutcome);
}

/// Time limits applied to every launched process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerLimits {
    /// Wall-clock limit before the process is terminated
    pub timeout: Duration,
    /// Wait between SIGTERM and SIGKILL
    pub kill_grace: Duration,
}

impl Default for RunnerLimits {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(7200), kill_grace: Duration::from_secs(5) }
    }
}

/// Launches generator processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    limits: RunnerLimits,
}

impl ProcessRunner {
    pub fn new(limits: RunnerLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> RunnerLimits {
        self.limits
    }

    /// Spawn the generator writing into `output_dir`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn launch(
        &self,
        job_id: &JobId,
        command: &GeneratorCommand,
        output_dir: &Path,
        sink: Arc<dyn LogSink>,
    ) -> Result<JobHandle, RunnerError> {
        if command.program.trim().is_empty() {
            return Err(RunnerError::EmptyProgram);
        }

        let mut child = command.to_command(output_dir).spawn().map_err(|source| {
            RunnerError::Spawn { program: command.program.clone(), source }
        })?;
        let pid = child.id();

        tracing::info!(
            %job_id,
            pid,
            command = %command,
            output_dir = %output_dir.display(),
            "generator spawned"
        );

        let mut pumps = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            pumps.push(tokio::spawn(pump(stdout, job_id.clone(), LogSource::Stdout, sink.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(tokio::spawn(pump(stderr, job_id.clone(), LogSource::Stderr, sink.clone())));
        }

        let cancel = CancellationToken::new();
        let done = CancellationToken::new();
        tokio::spawn(supervise(Supervised {
            child,
            pid,
            job_id: job_id.clone(),
            limits: self.limits,
            cancel: cancel.clone(),
            done: done.clone(),
            pumps,
            sink,
        }));

        Ok(JobHandle { pid, cancel, done })
    }
}

/// Control handle for a launched process.
///
/// Dropping the handle detaches from the process; it keeps running under
/// its timeout and later output goes to the sink unobserved.
#[derive(Debug)]
pub struct JobHandle {
    pid: Option<u32>,
    cancel: CancellationToken,
    done: CancellationToken,
}

impl JobHandle {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Request termination. Returns immediately.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once the exit outcome has been delivered to the sink.
    pub fn is_finished(&self) -> bool {
        self.done.is_cancelled()
    }

    /// Token cancelled once the exit outcome has been delivered.
    pub fn done_token(&self) -> CancellationToken {
        self.done.clone()
    }
}

struct Supervised {
    child: Child,
    pid: Option<u32>,
    job_id: JobId,
    limits: RunnerLimits,
    cancel: CancellationToken,
    done: CancellationToken,
    pumps: Vec<JoinHandle<()>>,
    sink: Arc<dyn LogSink>,
}

async fn supervise(s: Supervised) {
    let Supervised { mut child, pid, job_id, limits, cancel, done, pumps, sink } = s;

    let outcome = tokio::select! {
        status = child.wait() => match status {
            Ok(status) if status.success() => ExitOutcome::Success,
            Ok(status) => ExitOutcome::Failed { code: status.code() },
            Err(e) => ExitOutcome::Lost { reason: e.to_string() },
        },
        _ = tokio::time::sleep(limits.timeout) => {
            tracing::warn!(%job_id, timeout_secs = limits.timeout.as_secs(), "generator timed out");
            terminate(&mut child, pid, limits.kill_grace).await;
            ExitOutcome::TimedOut
        }
        _ = cancel.cancelled() => {
            tracing::info!(%job_id, "cancelling generator");
            terminate(&mut child, pid, limits.kill_grace).await;
            ExitOutcome::Cancelled
        }
    };

    for pump in pumps {
        let abort = pump.abort_handle();
        if tokio::time::timeout(DRAIN_TIMEOUT, pump).await.is_err() {
            tracing::warn!(%job_id, "output stream still open after exit; abandoning");
            abort.abort();
        }
    }

    tracing::info!(%job_id, outcome = %outcome, "generator exited");
    sink.exited(&job_id, outcome);
    done.cancel();
}

/// SIGTERM the process group, then SIGKILL after the grace period.
async fn terminate(child: &mut Child, pid: Option<u32>, grace: Duration) {
    let group = pid.and_then(|pid| i32::try_from(pid).ok()).map(Pid::from_raw);
    if let Some(group) = group {
        if let Err(e) = killpg(group, Signal::SIGTERM) {
            tracing::debug!(error = %e, "SIGTERM to process group failed");
        }
    }

    if tokio::time::timeout(grace, child.wait()).await.is_ok() {
        return;
    }

    if let Some(group) = group {
        let _ = killpg(group, Signal::SIGKILL);
    }
    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "failed to kill generator");
    }
}

/// Forward each non-blank line of `reader` to the sink.
async fn pump<R>(reader: R, job_id: JobId, source: LogSource, sink: Arc<dyn LogSink>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let line = text.trim_end_matches(['\n', '\r']);
                if !line.trim().is_empty() {
                    sink.append(&job_id, source, line.to_string());
                }
            }
            Err(e) => {
                tracing::warn!(%job_id, %source, error = %e, "failed to read generator output");
                sink.append(&job_id, LogSource::Stderr, format!("failed to read {}: {}", source, e));
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
