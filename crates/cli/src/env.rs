// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::client::ClientError;

/// Resolve state directory: WG_STATE_DIR > XDG_STATE_HOME/wg > ~/.local/state/wg
///
/// Must agree with the daemon's resolution.
pub fn state_dir() -> Result<PathBuf, ClientError> {
    if let Ok(dir) = std::env::var("WG_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("wg"));
    }
    let home = std::env::var("HOME").map_err(|_| ClientError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/wg"))
}

pub fn socket_path() -> Result<PathBuf, ClientError> {
    Ok(state_dir()?.join("daemon.sock"))
}

pub fn daemon_log_path() -> Result<PathBuf, ClientError> {
    Ok(state_dir()?.join("daemon.log"))
}

fn duration_ms(var: &str, default: Duration) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

/// Timeout for ordinary requests
pub fn ipc_timeout() -> Duration {
    duration_ms("WG_IPC_TIMEOUT_MS", Duration::from_secs(5))
}

/// Timeout for requests that wait on the generator to die (cancel, shutdown)
pub fn kill_timeout() -> Duration {
    duration_ms("WG_KILL_TIMEOUT_MS", Duration::from_secs(30))
}

/// Interval between polls in `wg watch`
pub fn poll_interval() -> Duration {
    duration_ms("WG_POLL_MS", Duration::from_millis(1000))
}

/// How long to wait for a freshly spawned daemon to accept connections
pub fn daemon_start_timeout() -> Duration {
    duration_ms("WG_DAEMON_START_TIMEOUT_MS", Duration::from_secs(5))
}
