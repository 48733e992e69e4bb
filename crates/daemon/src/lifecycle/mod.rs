// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

mod startup;
pub use startup::startup;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};
use wg_engine::{ConfigError, FsStager, Orchestrator, CONFIG_FILE};

/// Daemon log file name under the state directory
pub const LOG_FILE: &str = "daemon.log";

/// Orchestrator with the concrete filesystem stager
pub type DaemonOrchestrator = Orchestrator<FsStager>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/wg)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Deployment base directory; relative paths in the generation config resolve here
    pub wg_home: PathBuf,
    /// Generation config file (may be absent)
    pub generation_config: PathBuf,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// State lives in `state_dir` (see [`crate::env::state_dir`]).
    /// `WG_HOME` names the deployment the daemon stages into.
    pub fn load(state_dir: PathBuf) -> Result<Self, LifecycleError> {
        let wg_home = crate::env::wg_home()?;
        let generation_config = crate::env::config_path(&wg_home);
        Ok(Self { generation_config, ..Self::at(state_dir, wg_home) })
    }

    /// Fixed layout under `state_dir`, config read from `<wg_home>/wg.toml`.
    pub fn at(state_dir: impl Into<PathBuf>, wg_home: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        let wg_home = wg_home.into();
        Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join(LOG_FILE),
            generation_config: wg_home.join(CONFIG_FILE),
            state_dir,
            wg_home,
        }
    }
}

/// Daemon state during operation.
///
/// The listener is returned separately from startup to be spawned as a Listener task.
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// The single job slot (shared with the listener)
    pub orchestrator: Arc<DaemonOrchestrator>,
    /// When daemon started
    pub start_time: Instant,
}

/// Result of daemon startup - includes both the daemon state and the listener.
pub struct StartupResult {
    /// The daemon state
    pub daemon: DaemonState,
    /// The Unix socket listener to spawn as a task
    pub listener: UnixListener,
}

impl DaemonState {
    /// Cancel any running generator, then remove the daemon's files.
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // 1. Kill the generator so it cannot keep writing into staging
        if let Some(report) = self.orchestrator.cancel().await {
            info!(job_id = %report.job_id, "cancelled running job on shutdown");
        }

        // 2. Remove socket file (listener task stops when tokio runtime exits)
        remove_file_logged(&self.config.socket_path, "socket");

        // 3. Remove PID file
        remove_file_logged(&self.config.lock_path, "PID");

        // 4. Remove version file
        remove_file_logged(&self.config.version_path, "version");

        // 5. Lock file is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
        Ok(())
    }
}

fn remove_file_logged(path: &Path, what: &str) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove {} file: {}", what, e);
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("WG_HOME is not set")]
    NoHome,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
