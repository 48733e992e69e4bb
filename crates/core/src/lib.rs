// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wg-core: shared types for the weather-grid generation orchestrator

pub mod macros;

pub mod clock;
pub mod id;
pub mod job;
pub mod layout;
pub mod report;
pub mod state;
pub mod time_fmt;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use id::short;
pub use job::{ExitOutcome, JobId, JobPhase, LogRecord, LogSource};
pub use layout::StageLayout;
pub use report::{JobOutcome, JobReport, JobSummary, StartAck, StatusReport};
pub use state::{JobSnapshot, JobState, Sentinel, DEFAULT_LOG_LIMIT};
pub use time_fmt::{file_stamp, format_elapsed, format_elapsed_ms, format_utc};
