// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wgd: weather-grid generation daemon.
//!
//! Owns the single job slot and serves the `wg` CLI over a Unix socket.

mod env;
mod lifecycle;
mod listener;
mod logging;

use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

use crate::lifecycle::{Config, LifecycleError, StartupResult};
use crate::listener::{ListenCtx, Listener};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("wgd: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), LifecycleError> {
    let foreground = std::env::args().skip(1).any(|a| a == "--foreground");

    // Logging first so that config errors land in daemon.log
    let state_dir = env::state_dir()?;
    let log_path = state_dir.join(lifecycle::LOG_FILE);
    logging::write_startup_marker(&log_path)?;
    let _log_guard = logging::init(&log_path, foreground)?;
    info!(pid = std::process::id(), version = env::PROTOCOL_VERSION, "starting wgd");

    // Reported while the log guard is still alive
    serve(state_dir).await.inspect_err(|e| error!("Failed to start daemon: {}", e))
}

async fn serve(state_dir: std::path::PathBuf) -> Result<(), LifecycleError> {
    let config = Config::load(state_dir)?;

    let StartupResult { mut daemon, listener } = lifecycle::startup(&config).await?;

    let shutdown = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx {
        orchestrator: Arc::clone(&daemon.orchestrator),
        start_time: daemon.start_time,
        shutdown: Arc::clone(&shutdown),
    });
    tokio::spawn(Listener::new(listener, ctx).run());

    info!(socket = %config.socket_path.display(), log = %config.log_path.display(), "ready");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
        _ = shutdown.notified() => info!("shutdown requested"),
    }

    daemon.shutdown().await
}
