// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::exit_error::{EXIT_JOB_CANCELLED, EXIT_JOB_FAILED};
use wg_core::{JobId, JobOutcome};

fn finished(outcome: JobOutcome) -> StatusReport {
    StatusReport::Finished(JobReport {
        job_id: JobId::from_string("job-test"),
        outcome,
        log: "Good bye.\nGeneration finished.".to_string(),
    })
}

fn exit_code(report: &StatusReport) -> Option<i32> {
    exit_for(report).err().map(|e| match e.downcast_ref::<ExitError>() {
        Some(exit) => exit.code,
        None => panic!("expected ExitError, got {e}"),
    })
}

#[test]
fn idle_and_running_exit_zero() {
    assert_eq!(exit_code(&StatusReport::Idle), None);
    let running =
        StatusReport::Running { job_id: JobId::from_string("job-test"), log: String::new() };
    assert_eq!(exit_code(&running), None);
}

#[test]
fn promoted_exits_zero() {
    assert_eq!(exit_code(&finished(JobOutcome::Promoted)), None);
}

#[test]
fn failed_exits_with_reason() {
    let report = finished(JobOutcome::Failed { reason: "staging directory missing".into() });
    let err = exit_for(&report).unwrap_err();
    let exit = err.downcast_ref::<ExitError>().unwrap();
    assert_eq!(exit.code, EXIT_JOB_FAILED);
    assert_eq!(exit.message, "staging directory missing");
}

#[test]
fn cancelled_exits_with_its_own_code() {
    assert_eq!(exit_code(&finished(JobOutcome::Cancelled)), Some(EXIT_JOB_CANCELLED));
}
