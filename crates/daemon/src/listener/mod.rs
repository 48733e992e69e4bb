// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! Each connection carries one request and one response. The orchestrator
//! serializes access to the job slot; calls that may block on it or on the
//! filesystem run on the blocking pool.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tokio::task::{spawn_blocking, JoinError};
use tracing::{debug, error, info, warn};
use wg_core::{JobReport, StatusReport};
use wg_wire::{read_request, write_response, ProtocolError, Request, Response};

use crate::env::{ipc_timeout, PROTOCOL_VERSION};
use crate::lifecycle::DaemonOrchestrator;

/// Shared daemon context for all request handlers.
pub(crate) struct ListenCtx {
    pub orchestrator: Arc<DaemonOrchestrator>,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

/// Listener task for accepting socket connections.
pub(crate) struct Listener {
    unix: UnixListener,
    ctx: Arc<ListenCtx>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl Listener {
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, ctx }
    }

    /// Run the listener loop, spawning a task for each connection.
    pub async fn run(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        if let Err(e) = handle_connection(reader, writer, &ctx).await {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => error!("Unix accept error: {}", e),
            }
        }
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected")
        }
        ConnectionError::Protocol(ProtocolError::Timeout) => warn!("Connection timeout"),
        _ => error!("Connection error: {}", e),
    }
}

/// Handle a single client connection.
///
/// The handler always runs to completion even if the client goes away:
/// a poll that promotes or a cancel that kills must not be abandoned halfway.
async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let request = read_request(&mut reader, ipc_timeout()).await?;

    // Polls arrive in a tight loop; keep them out of the info log
    if request.is_poll() {
        debug!(request = ?request, "received poll");
    } else {
        info!(request = ?request, "received request");
    }

    let response = handle_request(request, ctx).await;
    debug!("Sending response: {:?}", response);

    if let Err(e) = write_response(&mut writer, &response, ipc_timeout()).await {
        // The slot is already idle; keep the report for the next poll
        if let Some(report) = terminal_report(response) {
            ctx.orchestrator.return_undelivered(report);
        }
        return Err(e.into());
    }
    Ok(())
}

fn terminal_report(response: Response) -> Option<JobReport> {
    match response {
        Response::JobStatus { report: StatusReport::Finished(report) } => Some(report),
        Response::Cancelled { report } => report,
        _ => None,
    }
}

/// Handle a single request and return a response.
async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                warn!(client = %version, daemon = PROTOCOL_VERSION, "client version mismatch");
            }
            Response::Hello { version: PROTOCOL_VERSION.to_string() }
        }

        Request::Status => {
            let orchestrator = Arc::clone(&ctx.orchestrator);
            match spawn_blocking(move || (orchestrator.phase(), orchestrator.summary())).await {
                Ok((phase, job)) => {
                    Response::Status { uptime_secs: ctx.start_time.elapsed().as_secs(), phase, job }
                }
                Err(e) => task_failed("status", e),
            }
        }

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }

        Request::Start => {
            let orchestrator = Arc::clone(&ctx.orchestrator);
            match spawn_blocking(move || orchestrator.start()).await {
                Ok(Ok(ack)) => Response::Started { job_id: ack.job_id, message: ack.message },
                Ok(Err(e)) => {
                    warn!(error = %e, "start rejected");
                    Response::Error { message: e.to_string() }
                }
                Err(e) => task_failed("start", e),
            }
        }

        Request::CheckStatus => {
            let orchestrator = Arc::clone(&ctx.orchestrator);
            match spawn_blocking(move || orchestrator.check_status()).await {
                Ok(report) => Response::JobStatus { report },
                Err(e) => task_failed("check_status", e),
            }
        }

        Request::Cancel => Response::Cancelled { report: ctx.orchestrator.cancel().await },
    }
}

fn task_failed(what: &str, e: JoinError) -> Response {
    error!(error = %e, "{} task failed", what);
    Response::Error { message: format!("{} failed: {}", what, e) }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
