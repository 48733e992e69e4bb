// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon log file setup.

use std::io::Write;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::lifecycle::LifecycleError;

/// Prefix of the line written at the top of each daemon run.
///
/// The CLI scans `daemon.log` from the last marker to report startup failures.
pub const STARTUP_MARKER_PREFIX: &str = "--- wgd: starting (pid: ";

/// Append the startup marker for this process.
pub fn write_startup_marker(log_path: &Path) -> Result<(), LifecycleError> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

/// Install the global subscriber: `daemon.log` always, stderr too in the foreground.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and stops the background writer.
pub fn init(log_path: &Path, foreground: bool) -> Result<WorkerGuard, LifecycleError> {
    let dir = log_path.parent().ok_or(LifecycleError::NoStateDir)?;
    let file_name = log_path.file_name().ok_or(LifecycleError::NoStateDir)?;
    std::fs::create_dir_all(dir)?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    let filter = EnvFilter::try_new(crate::env::log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer().with_writer(writer).with_ansi(false);
    let stderr_layer = foreground.then(|| fmt::layer().with_writer(std::io::stderr));

    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry().with(filter).with(file_layer).with(stderr_layer).try_init();
    Ok(guard)
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
