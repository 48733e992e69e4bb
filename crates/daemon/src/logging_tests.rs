// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn startup_marker_appends_one_line_per_run() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("state/daemon.log");

    write_startup_marker(&log_path).unwrap();
    write_startup_marker(&log_path).unwrap();

    let content = std::fs::read_to_string(&log_path).unwrap();
    let expected = format!("--- wgd: starting (pid: {}) ---", std::process::id());
    assert_eq!(content.lines().collect::<Vec<_>>(), vec![expected.as_str(), expected.as_str()]);
}
