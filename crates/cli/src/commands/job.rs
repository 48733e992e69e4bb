// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wg start|status|watch|cancel` - Generation job commands

use anyhow::Result;
use wg_core::{JobReport, StatusReport};

use crate::client::{ClientError, DaemonClient};
use crate::color;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, print_chunk, print_log, unseen, OutputFormat};

/// `wg start [--watch]`
pub async fn start(watch: bool, format: OutputFormat) -> Result<()> {
    let client = DaemonClient::connect_or_start().await?;
    let ack = match client.start().await {
        Ok(ack) => ack,
        Err(ClientError::Rejected(message)) => return Err(ExitError::new(1, message).into()),
        Err(e) => return Err(e.into()),
    };

    format_or_json(format, &ack, || {
        println!("Started job {}: {}", color::header(ack.job_id.as_str()), ack.message)
    })?;

    if watch {
        watch_until_done(&client, format).await
    } else {
        Ok(())
    }
}

/// `wg status`: a single poll. Promotes if the job just finished.
pub async fn status(format: OutputFormat) -> Result<()> {
    let Some(client) = connect_or_report(format)? else {
        return Ok(());
    };
    let report = match client.check_status().await {
        Ok(report) => report,
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(e) => return Err(e.into()),
    };

    format_or_json(format, &report, || match &report {
        StatusReport::Idle => println!("No job running"),
        StatusReport::Running { job_id, log } => {
            print_log(log);
            println!("Job {} running", color::header(job_id.as_str()));
        }
        StatusReport::Finished(finished) => {
            print_log(&finished.log);
            print_finished(finished);
        }
    })?;

    exit_for(&report)
}

/// `wg watch`: poll until the job finishes, streaming new log text.
pub async fn watch(format: OutputFormat) -> Result<()> {
    let Some(client) = connect_or_report(format)? else {
        return Ok(());
    };
    watch_until_done(&client, format).await
}

/// `wg cancel`
pub async fn cancel(format: OutputFormat) -> Result<()> {
    let Some(client) = connect_or_report(format)? else {
        return Ok(());
    };
    let report = client.cancel().await?;

    let obj = serde_json::json!({ "cancelled": &report });
    format_or_json(format, &obj, || match &report {
        Some(report) => println!("Cancelled job {}", color::header(report.job_id.as_str())),
        None => println!("No job running"),
    })
}

async fn watch_until_done(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let interval = crate::env::poll_interval();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut printed = 0;
    loop {
        let report = client.check_status().await?;
        match &report {
            StatusReport::Idle => {
                return format_or_json(format, &report, || println!("No job running"));
            }
            StatusReport::Running { log, .. } => {
                if format == OutputFormat::Text {
                    print_chunk(unseen(log, printed));
                    printed = log.len();
                }
            }
            StatusReport::Finished(finished) => {
                format_or_json(format, &report, || {
                    print_chunk(unseen(&finished.log, printed));
                    println!();
                    print_finished(finished);
                })?;
                return exit_for(&report);
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            // Stops watching only; the job keeps running
            _ = &mut ctrl_c => return Ok(()),
        }
    }
}

fn print_finished(report: &JobReport) {
    let outcome = report.outcome.to_string();
    println!(
        "Job {} {}",
        color::header(report.job_id.as_str()),
        color::outcome(&outcome, report.outcome.is_promoted())
    );
}

fn exit_for(report: &StatusReport) -> Result<()> {
    match report {
        StatusReport::Finished(finished) => match ExitError::for_report(finished) {
            Some(exit) => Err(exit.into()),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Connect without auto-starting; prints "not running" and yields `None` if absent.
fn connect_or_report(format: OutputFormat) -> Result<Option<DaemonClient>> {
    match DaemonClient::connect() {
        Ok(client) => Ok(Some(client)),
        Err(e) if e.is_not_running() => {
            print_not_running(format)?;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn print_not_running(format: OutputFormat) -> Result<()> {
    let obj = serde_json::json!({ "status": "not_running" });
    format_or_json(format, &obj, || println!("Daemon not running"))
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
