// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp and duration formatting shared by log writers and the CLI.

use chrono::{DateTime, Utc};

fn to_utc(epoch_ms: u64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms as i64).unwrap_or_default()
}

/// Format epoch milliseconds as `2026-01-30T08:14:09Z`.
pub fn format_utc(epoch_ms: u64) -> String {
    to_utc(epoch_ms).format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Format epoch milliseconds as a file-name stamp, `20260130_081409`.
pub fn file_stamp(epoch_ms: u64) -> String {
    to_utc(epoch_ms).format("%Y%m%d_%H%M%S").to_string()
}

/// Format a duration in seconds as `5s`, `2m`, `1h30m`.
pub fn format_elapsed(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h{}m", hours, mins)
        }
    }
}

/// Format a duration in milliseconds; see [`format_elapsed`].
pub fn format_elapsed_ms(ms: u64) -> String {
    format_elapsed(ms / 1000)
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
