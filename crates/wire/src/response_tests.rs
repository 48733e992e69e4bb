// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use wg_core::JobOutcome;

#[test]
fn job_status_nests_state_tag() {
    let response = Response::JobStatus {
        report: StatusReport::Running {
            job_id: JobId::from_string("job-abc"),
            log: "Processing".to_string(),
        },
    };
    let json: serde_json::Value = serde_json::to_value(&response).unwrap();

    assert_eq!(json["type"], "JobStatus");
    assert_eq!(json["report"]["state"], "running");
    assert_eq!(json["report"]["job_id"], "job-abc");
    assert_eq!(json["report"]["log"], "Processing");
}

#[test]
fn finished_report_flattens_job_report() {
    let response = Response::JobStatus {
        report: StatusReport::Finished(JobReport {
            job_id: JobId::from_string("job-abc"),
            outcome: JobOutcome::Promoted,
            log: "Generation finished.".to_string(),
        }),
    };
    let json: serde_json::Value = serde_json::to_value(&response).unwrap();

    assert_eq!(json["report"]["state"], "finished");
    assert_eq!(json["report"]["outcome"]["kind"], "promoted");
}

#[test]
fn status_without_job_omits_field() {
    let response = Response::Status { uptime_secs: 5, phase: JobPhase::Idle, job: None };
    let json = serde_json::to_string(&response).unwrap();

    assert_eq!(json, r#"{"type":"Status","uptime_secs":5,"phase":"idle"}"#);
    let decoded: Response = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, response);
}
