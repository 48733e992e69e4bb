// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    long_id  = { "job-abcdefghijklmnopqrs", 1_769_760_849_000, "generate_20260130_081409_abcdefgh.log" },
    short_id = { "job-xyz",                 0,                 "generate_19700101_000000_xyz.log" },
)]
fn job_log_path_builds_expected(id: &str, started_at_ms: u64, expected: &str) {
    assert_eq!(
        job_log_path(Path::new("/srv/wg/log"), &JobId::from_string(id), started_at_ms),
        PathBuf::from(format!("/srv/wg/log/{}", expected))
    );
}
