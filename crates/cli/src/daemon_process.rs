// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawning `wgd` in the background and reporting why it failed to come up.

use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::client::{ClientError, DaemonClient};

/// Start of the line `wgd` appends to `daemon.log` on every launch
const STARTUP_MARKER_PREFIX: &str = "--- wgd: starting (pid: ";

const STARTUP_ERROR_PREFIX: &str = "Failed to start daemon: ";

const READY_POLL: Duration = Duration::from_millis(50);

/// Locate `wgd`: next to the running `wg`, else on PATH.
pub fn find_wgd_binary() -> PathBuf {
    if let Some(dir) = std::env::current_exe().ok().as_deref().and_then(Path::parent) {
        let sibling = dir.join("wgd");
        if sibling.exists() {
            return sibling;
        }
    }
    PathBuf::from("wgd")
}

/// Launch `wgd` detached from the terminal's process group.
pub fn spawn_background() -> Result<Child, ClientError> {
    let wgd = find_wgd_binary();
    Command::new(&wgd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .map_err(|e| ClientError::StartFailed(format!("{}: {}", wgd.display(), e)))
}

/// Wait until the freshly spawned daemon answers a ping.
///
/// If the daemon exits first, the error is read back from `daemon.log`.
pub async fn wait_until_ready(
    mut child: Child,
    client: DaemonClient,
) -> Result<DaemonClient, ClientError> {
    let deadline = Instant::now() + crate::env::daemon_start_timeout();
    loop {
        if let Ok(Some(status)) = child.try_wait() {
            let message = crate::env::daemon_log_path()
                .ok()
                .and_then(|path| read_startup_error(&path))
                .unwrap_or_else(|| format!("wgd exited with {}", status));
            return Err(ClientError::StartFailed(message));
        }
        if client.ping().await.is_ok() {
            return Ok(client);
        }
        if Instant::now() >= deadline {
            return Err(ClientError::StartTimeout);
        }
        tokio::time::sleep(READY_POLL).await;
    }
}

fn read_startup_error(log_path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(log_path).ok()?;
    parse_startup_error(&content)
}

/// Find the startup error logged after the most recent startup marker.
pub fn parse_startup_error(log: &str) -> Option<String> {
    let start = log.rfind(STARTUP_MARKER_PREFIX)?;
    log[start..]
        .lines()
        .skip(1)
        .filter(|line| line.contains("ERROR"))
        .find_map(|line| {
            let idx = line.find(STARTUP_ERROR_PREFIX)?;
            Some(line[idx + STARTUP_ERROR_PREFIX.len()..].trim().to_string())
        })
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
