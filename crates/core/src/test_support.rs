// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{LogRecord, LogSource};

/// Proptest strategies for core types.
pub mod strategies {
    use crate::job::{ExitOutcome, LogSource};
    use proptest::prelude::*;

    pub fn arb_stream_source() -> impl Strategy<Value = LogSource> {
        prop_oneof![Just(LogSource::Stdout), Just(LogSource::Stderr)]
    }

    pub fn arb_exit_outcome() -> impl Strategy<Value = ExitOutcome> {
        prop_oneof![
            Just(ExitOutcome::Success),
            any::<Option<i32>>().prop_map(|code| ExitOutcome::Failed { code }),
            Just(ExitOutcome::TimedOut),
            Just(ExitOutcome::Cancelled),
        ]
    }
}

/// Stdout record at epoch zero.
pub fn stdout(text: &str) -> LogRecord {
    LogRecord::new(LogSource::Stdout, 0, text)
}

/// Stderr record at epoch zero.
pub fn stderr(text: &str) -> LogRecord {
    LogRecord::new(LogSource::Stderr, 0, text)
}
