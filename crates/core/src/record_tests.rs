// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

use yare::parameterized;

use super::*;

#[parameterized(
    successful = { ResultCode::Successful, "SUCCESSFUL" },
    failed = { ResultCode::Failed, "FAILED" },
    not_executed = { ResultCode::NotExecuted, "NOT_EXECUTED" },
    timed_out = { ResultCode::TimedOut, "TIMED_OUT" },
    aborted = { ResultCode::Aborted, "ABORTED" },
)]
fn result_code_finished_state_round_trips_through_json(code: ResultCode, wire: &str) {
    let state = RunningState::Finished { result_code: code };
    let json = serde_json::to_value(state).unwrap();
    assert_eq!(json["state"], "FINISHED");
    assert_eq!(json["result_code"], wire);
    assert!(state.is_finished());
    assert_eq!(state.result_code(), Some(code));
}

#[test]
fn execution_priority_orders_force_above_check() {
    assert!(ExecutionPriority::ForceExecution > ExecutionPriority::CheckPreconditions);
    assert!(ExecutionPriority::CheckPreconditions >= ExecutionPriority::CheckPreconditions);
}

#[test]
fn running_state_is_finished_treats_all_result_codes_as_one_family() {
    let states = [
        RunningState::Finished { result_code: ResultCode::Successful },
        RunningState::Finished { result_code: ResultCode::Failed },
        RunningState::Finished { result_code: ResultCode::TimedOut },
    ];
    for s in states {
        assert!(s.is_finished());
        assert!(!s.is_running());
        assert!(!s.is_queued());
    }
}

#[test]
fn running_state_result_code_only_present_when_finished() {
    assert_eq!(RunningState::Running.result_code(), None);
    assert_eq!(
        RunningState::Finished { result_code: ResultCode::Aborted }.result_code(),
        Some(ResultCode::Aborted)
    );
}

#[test]
fn push_log_line_caps_and_keeps_most_recent() {
    let mut record = JobRecord::builder().build();
    for i in 0..5 {
        record.push_log_line(LogLine::new(i, format!("line-{i}")), 3);
    }
    assert_eq!(record.log_lines.len(), 3);
    let texts: Vec<_> = record.log_lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["line-2", "line-3", "line-4"]);
}

#[test]
fn set_log_lines_replaces_and_caps() {
    let mut record = JobRecord::builder().build();
    record.push_log_line(LogLine::new(0, "stale"), 100);
    let fresh = vec![LogLine::new(1, "a"), LogLine::new(2, "b"), LogLine::new(3, "c")];
    record.set_log_lines(fresh, 2);
    let texts: Vec<_> = record.log_lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["b", "c"]);
}

#[test]
fn parameters_preserve_insertion_order() {
    let mut record = JobRecord::builder().build();
    record.parameters.insert("b".to_string(), "2".to_string());
    record.parameters.insert("a".to_string(), "1".to_string());
    let keys: Vec<_> = record.parameters.keys().cloned().collect();
    assert_eq!(keys, vec!["b", "a"]);
}

#[test]
fn is_terminal_true_only_for_finished() {
    let running = JobRecord::builder().running_state(RunningState::Running).build();
    assert!(!running.is_terminal());
    let finished = JobRecord::builder()
        .running_state(RunningState::Finished { result_code: ResultCode::Successful })
        .build();
    assert!(finished.is_terminal());
}

#[test]
fn job_record_serializes_running_state_with_result_code() {
    let record = JobRecord::builder()
        .running_state(RunningState::Finished { result_code: ResultCode::Failed })
        .build();
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["running_state"]["state"], "FINISHED");
    assert_eq!(json["running_state"]["result_code"], "FAILED");
}
