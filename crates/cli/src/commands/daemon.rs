// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wg daemon` - Daemon management commands

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::color;
use crate::commands::job::print_not_running;
use crate::daemon_process::find_wgd_binary;
use crate::output::{display_log, format_or_json, OutputFormat};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (foreground or background)
    Start {
        /// Run in foreground (useful for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon, cancelling any running job
    Stop,
    /// Check daemon status
    Status,
    /// View daemon logs
    Logs {
        /// Number of recent lines to show (default: 200)
        #[arg(short = 'n', long, default_value = "200")]
        limit: usize,
        /// Show all lines (no limit)
        #[arg(long, conflicts_with = "limit")]
        no_limit: bool,
        /// Follow log output
        #[arg(long, short)]
        follow: bool,
    },
}

pub async fn daemon(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        DaemonCommand::Start { foreground } => start(foreground).await,
        DaemonCommand::Stop => stop().await,
        DaemonCommand::Status => status(format).await,
        DaemonCommand::Logs { limit, no_limit, follow } => {
            logs(limit, no_limit, follow, format).await
        }
    }
}

async fn start(foreground: bool) -> Result<()> {
    if foreground {
        // Run daemon in foreground - spawn and wait
        let status = Command::new(find_wgd_binary()).arg("--foreground").status()?;
        if !status.success() {
            return Err(anyhow!("Daemon exited with status: {}", status));
        }
        return Ok(());
    }

    // Check if already running
    if let Ok(client) = DaemonClient::connect() {
        if let Ok(status) = client.status().await {
            println!("Daemon already running (uptime: {})", format_uptime(status.uptime_secs));
            return Ok(());
        }
    }

    DaemonClient::connect_or_start().await?;
    println!("Daemon started");
    Ok(())
}

async fn stop() -> Result<()> {
    let client = match DaemonClient::connect() {
        Ok(client) => client,
        Err(e) if e.is_not_running() => {
            println!("Daemon not running");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match client.shutdown().await {
        Ok(()) => {}
        Err(e) if e.is_not_running() => {
            println!("Daemon not running");
            return Ok(());
        }
        Err(e) => return Err(anyhow!("Failed to stop daemon: {}", e)),
    }

    // The daemon removes its socket as the last step of shutdown
    let socket = crate::env::socket_path()?;
    let deadline = Instant::now() + crate::env::kill_timeout();
    while socket.exists() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    println!("Daemon stopped");
    Ok(())
}

async fn status(format: OutputFormat) -> Result<()> {
    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(_) => return print_not_running(format),
    };

    // Handle connection errors (socket exists but daemon not running)
    let status = match client.status().await {
        Ok(status) => status,
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(e) => return Err(anyhow!("{}", e)),
    };
    let version = client.hello().await.unwrap_or_else(|_| "unknown".to_string());

    let obj = serde_json::json!({
        "status": "running",
        "version": version,
        "uptime_secs": status.uptime_secs,
        "uptime": format_uptime(status.uptime_secs),
        "phase": status.phase,
        "job": status.job,
    });
    format_or_json(format, &obj, || {
        println!("Status: running");
        println!("Version: {}", version);
        println!("Uptime: {}", format_uptime(status.uptime_secs));
        println!("Phase: {}", status.phase);
        if let Some(job) = &status.job {
            println!();
            println!("Job: {}", color::header(job.job_id.as_str()));
            if let Some(pid) = job.pid {
                println!("  PID: {}", pid);
            }
            println!("  Log lines: {}", job.lines);
            println!("  Log file: {}", color::muted(&job.log_path.display().to_string()));
        }
    })
}

async fn logs(limit: usize, no_limit: bool, follow: bool, format: OutputFormat) -> Result<()> {
    let log_path = crate::env::daemon_log_path()?;

    if !log_path.exists() {
        let empty: Vec<String> = vec![];
        let obj = serde_json::json!({
            "log_path": log_path.to_string_lossy().into_owned(),
            "lines": empty,
        });
        return format_or_json(format, &obj, || {
            println!("No log file found at {}", log_path.display())
        });
    }

    // Read the last N lines (or all lines with --no-limit)
    let content = if no_limit {
        std::fs::read_to_string(&log_path)?
    } else {
        read_last_lines(&log_path, limit)?
    };
    display_log(&log_path, &content, follow, format).await
}

fn read_last_lines(path: &Path, n: usize) -> Result<String> {
    let file = std::fs::File::open(path)?;
    let lines: Vec<String> = BufReader::new(file).lines().collect::<std::io::Result<_>>()?;
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].join("\n"))
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
