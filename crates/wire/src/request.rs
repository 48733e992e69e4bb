// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Request from CLI to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Daemon status
    Status,

    /// Request daemon shutdown; cancels any running job
    Shutdown,

    /// Clear staging and launch the generator
    Start,

    /// Poll the active job, promoting it if complete
    CheckStatus,

    /// Kill the active job
    Cancel,
}

impl Request {
    /// Requests a client sends in a tight loop
    pub fn is_poll(&self) -> bool {
        matches!(self, Request::CheckStatus | Request::Ping | Request::Status)
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
