// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::job::LogSource;
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;

fn rec(source: LogSource, text: &str) -> LogRecord {
    LogRecord::new(source, 0, text)
}

/// Rendered lines from one stream, with the stderr prefix stripped.
fn texts_for(state: &JobState, source: LogSource) -> Vec<String> {
    let log = state.render();
    log.lines()
        .filter_map(|line| match (source, line.strip_prefix("Error: ")) {
            (LogSource::Stderr, Some(text)) => Some(text.to_string()),
            (LogSource::Stdout, None) => Some(line.to_string()),
            _ => None,
        })
        .collect()
}

#[yare::parameterized(
    plain      = { "Good bye.",                     true },
    embedded   = { "Writing file 12... Good bye.",  true },
    lowercase  = { "good bye.",                     false },
    unrelated  = { "Processing hour 03",            false },
)]
fn default_sentinel_matching(chunk: &str, expected: bool) {
    assert_eq!(Sentinel::default().matches(chunk), expected);
}

#[test]
fn empty_sentinel_never_matches() {
    assert!(!Sentinel::new("").matches("anything"));
}

#[yare::parameterized(
    empty        = { "" },
    newline      = { "\n" },
    crlf         = { "\r\n" },
)]
fn blank_chunks_are_dropped(text: &str) {
    let mut state = JobState::new();
    assert!(!state.append(rec(LogSource::Stdout, text)));
    assert_eq!(state.render(), "");
    assert_eq!(state.line_count(), 0);
}

#[test]
fn append_keeps_insertion_order() {
    let mut state = JobState::new();
    state.append(rec(LogSource::Stdout, "one"));
    state.append(rec(LogSource::Stderr, "two"));
    state.append(rec(LogSource::Orchestrator, "three"));
    assert_eq!(state.render(), "one\nError: two\nthree");
}

#[test]
fn mark_complete_is_idempotent() {
    let mut state = JobState::new();
    assert!(!state.is_complete());
    state.mark_complete();
    state.mark_complete();
    assert!(state.is_complete());
}

#[test]
fn first_exit_outcome_wins() {
    let mut state = JobState::new();
    state.record_exit(ExitOutcome::TimedOut);
    state.record_exit(ExitOutcome::Success);
    assert_eq!(state.exit(), Some(&ExitOutcome::TimedOut));
}

#[test]
fn snapshot_is_detached_copy() {
    let mut state = JobState::new();
    state.append(rec(LogSource::Stdout, "a"));
    let snap = state.snapshot();
    state.append(rec(LogSource::Stdout, "b"));
    state.mark_complete();
    assert_eq!(snap, JobSnapshot { log: "a".to_string(), completed: false });
    assert_eq!(state.snapshot(), JobSnapshot { log: "a\nb".to_string(), completed: true });
}

#[test]
fn reset_clears_everything() {
    let mut state = JobState::new();
    state.append(rec(LogSource::Stdout, "a"));
    state.mark_complete();
    state.record_exit(ExitOutcome::Success);
    state.reset();
    assert_eq!(state.render(), "");
    assert_eq!(state.line_count(), 0);
    assert!(!state.is_complete());
    assert!(state.exit().is_none());
    assert_eq!(state.render(), "");
}

#[test]
fn long_output_keeps_head_and_tail_within_limit() {
    let mut state = JobState::with_limit(1024);
    for i in 0..1000 {
        state.append(rec(LogSource::Stdout, &format!("line {:04}", i)));
    }

    let log = state.render();
    assert!(log.len() <= 1024 + 64, "rendered {} bytes", log.len());
    assert!(log.starts_with("line 0000\nline 0001"));
    assert!(log.ends_with("line 0999"));
    assert!(log.contains(&format!("[{} lines omitted; see the job log file]", state.omitted())));
    assert!(state.omitted() > 800);
    assert_eq!(state.line_count(), 1000);
    assert_eq!(log.lines().count() - 1 + state.omitted(), 1000);
}

#[test]
fn oversized_record_is_truncated_and_kept() {
    let mut state = JobState::with_limit(1024);
    state.append(rec(LogSource::Stdout, "start"));
    state.append(rec(LogSource::Stderr, &"é".repeat(5000)));
    state.append(rec(LogSource::Stdout, "Good bye."));

    let log = state.render();
    assert!(log.len() <= 1024, "rendered {} bytes", log.len());
    assert!(log.contains(" [truncated]"));
    assert!(log.ends_with("Good bye."));
}

#[test]
fn reset_keeps_limit() {
    let mut state = JobState::with_limit(1024);
    for i in 0..1000 {
        state.append(rec(LogSource::Stdout, &i.to_string()));
    }
    state.reset();
    assert_eq!(state.omitted(), 0);
    for i in 0..1000 {
        state.append(rec(LogSource::Stdout, &i.to_string()));
    }
    assert!(state.omitted() > 0);
}

#[test]
fn concurrent_writers_preserve_per_stream_order() {
    let state = Arc::new(Mutex::new(JobState::new()));
    let writers: Vec<_> = [LogSource::Stdout, LogSource::Stderr]
        .into_iter()
        .map(|source| {
            let state = Arc::clone(&state);
            std::thread::spawn(move || {
                for i in 0..500 {
                    state.lock().append(LogRecord::new(source, 0, i.to_string()));
                }
            })
        })
        .collect();
    for w in writers {
        w.join().unwrap();
    }

    let state = state.lock();
    let expected: Vec<String> = (0..500).map(|i| i.to_string()).collect();
    assert_eq!(texts_for(&state, LogSource::Stdout), expected);
    assert_eq!(texts_for(&state, LogSource::Stderr), expected);
}

proptest! {
    #[test]
    fn any_interleaving_preserves_each_stream(schedule in proptest::collection::vec(any::<bool>(), 0..200)) {
        let mut state = JobState::new();
        let (mut out_n, mut err_n) = (0u32, 0u32);
        for from_stdout in &schedule {
            if *from_stdout {
                state.append(rec(LogSource::Stdout, &out_n.to_string()));
                out_n += 1;
            } else {
                state.append(rec(LogSource::Stderr, &err_n.to_string()));
                err_n += 1;
            }
        }
        let out: Vec<String> = (0..out_n).map(|i| i.to_string()).collect();
        let err: Vec<String> = (0..err_n).map(|i| i.to_string()).collect();
        prop_assert_eq!(texts_for(&state, LogSource::Stdout), out);
        prop_assert_eq!(texts_for(&state, LogSource::Stderr), err);
    }
}
