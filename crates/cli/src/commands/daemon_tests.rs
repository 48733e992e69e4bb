// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[yare::parameterized(
    zero          = { 0, "0s" },
    seconds       = { 59, "59s" },
    one_minute    = { 60, "1m 0s" },
    minutes       = { 125, "2m 5s" },
    one_hour      = { 3600, "1h 0m 0s" },
    hours_minutes = { 7384, "2h 3m 4s" },
)]
fn format_uptime_formats(secs: u64, expected: &str) {
    assert_eq!(format_uptime(secs), expected);
}

#[test]
fn read_last_lines_returns_tail() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("daemon.log");
    std::fs::write(&path, "one\ntwo\nthree\nfour\n").unwrap();

    assert_eq!(read_last_lines(&path, 2).unwrap(), "three\nfour");
}

#[test]
fn read_last_lines_short_file_returns_everything() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("daemon.log");
    std::fs::write(&path, "only\n").unwrap();

    assert_eq!(read_last_lines(&path, 200).unwrap(), "only");
}
