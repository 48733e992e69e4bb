// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use wg_engine::CONFIG_FILE;

use crate::lifecycle::LifecycleError;

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Base directory of the deployment (`WG_HOME`). Required.
pub fn wg_home() -> Result<PathBuf, LifecycleError> {
    match std::env::var("WG_HOME") {
        Ok(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => Err(LifecycleError::NoHome),
    }
}

/// Resolve state directory: WG_STATE_DIR > XDG_STATE_HOME/wg > ~/.local/state/wg
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("WG_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("wg"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/wg"))
}

/// Generation config file: WG_CONFIG > `<home>/wg.toml`
pub fn config_path(home: &Path) -> PathBuf {
    match std::env::var("WG_CONFIG") {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => home.join(CONFIG_FILE),
    }
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    std::env::var("WG_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Tracing filter directive (`WG_LOG`, default `info`)
pub fn log_filter() -> String {
    std::env::var("WG_LOG").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "info".to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
