// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client: one request per connection over the Unix socket.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::net::UnixStream;
use wg_core::{JobPhase, JobReport, JobSummary, StartAck, StatusReport};
use wg_wire::{read_response, write_request, ProtocolError, Request, Response};

use crate::daemon_process;

/// Client-side errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Connection failed: {0}")]
    Connect(#[source] io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{0}")]
    Rejected(String),

    #[error("Unexpected response from daemon: {0}")]
    UnexpectedResponse(String),

    #[error("Failed to start daemon: {0}")]
    StartFailed(String),

    #[error("Timed out waiting for daemon to start")]
    StartTimeout,
}

impl ClientError {
    /// True when the failure means nothing is listening on the socket.
    pub fn is_not_running(&self) -> bool {
        match self {
            ClientError::DaemonNotRunning => true,
            ClientError::Connect(e) => {
                matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused)
            }
            ClientError::Protocol(ProtocolError::ConnectionClosed) => true,
            _ => false,
        }
    }
}

/// Answer to `Request::Status`
#[derive(Debug, Clone, Serialize)]
pub struct DaemonStatus {
    pub uptime_secs: u64,
    pub phase: JobPhase,
    pub job: Option<JobSummary>,
}

/// Client for the `wgd` socket
#[derive(Debug, Clone)]
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to a running daemon. Fails fast when the socket is absent.
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = crate::env::socket_path()?;
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(Self { socket_path })
    }

    /// Connect, spawning `wgd` in the background if nothing answers.
    pub async fn connect_or_start() -> Result<Self, ClientError> {
        if let Ok(client) = Self::connect() {
            if client.ping().await.is_ok() {
                return Ok(client);
            }
        }
        let socket_path = crate::env::socket_path()?;
        let child = daemon_process::spawn_background()?;
        daemon_process::wait_until_ready(child, Self { socket_path }).await
    }

    #[cfg(test)]
    pub(crate) fn at(socket_path: impl Into<PathBuf>) -> Self {
        Self { socket_path: socket_path.into() }
    }

    /// Send one request and read its response.
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        self.send_with_timeout(request, crate::env::ipc_timeout()).await
    }

    async fn send_with_timeout(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(ClientError::Connect)?;
        let (mut reader, mut writer) = stream.into_split();
        write_request(&mut writer, request, crate::env::ipc_timeout()).await?;
        Ok(read_response(&mut reader, timeout).await?)
    }

    fn reject<T>(response: Response) -> Result<T, ClientError> {
        match response {
            Response::Error { message } => Err(ClientError::Rejected(message)),
            other => Err(ClientError::UnexpectedResponse(format!("{:?}", other))),
        }
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.send(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Self::reject(other),
        }
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello { version: env!("CARGO_PKG_VERSION").to_string() };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Self::reject(other),
        }
    }

    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status { uptime_secs, phase, job } => {
                Ok(DaemonStatus { uptime_secs, phase, job })
            }
            other => Self::reject(other),
        }
    }

    /// Request daemon shutdown; the daemon cancels any running job first
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send_with_timeout(&Request::Shutdown, crate::env::kill_timeout()).await? {
            Response::ShuttingDown => Ok(()),
            other => Self::reject(other),
        }
    }

    pub async fn start(&self) -> Result<StartAck, ClientError> {
        match self.send(&Request::Start).await? {
            Response::Started { job_id, message } => Ok(StartAck { job_id, message }),
            other => Self::reject(other),
        }
    }

    /// Poll the job. A finished job is promoted and reported exactly once.
    pub async fn check_status(&self) -> Result<StatusReport, ClientError> {
        match self.send(&Request::CheckStatus).await? {
            Response::JobStatus { report } => Ok(report),
            other => Self::reject(other),
        }
    }

    pub async fn cancel(&self) -> Result<Option<JobReport>, ClientError> {
        match self.send_with_timeout(&Request::Cancel, crate::env::kill_timeout()).await? {
            Response::Cancelled { report } => Ok(report),
            other => Self::reject(other),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
