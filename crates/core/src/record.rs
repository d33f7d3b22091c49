// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Job record: one entry per execution attempt (§3.1).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

crate::define_id! {
    /// Unique identifier for one execution attempt (`JobRecord`).
    ///
    /// Assigned by the store on insert; never reused.
    #[derive(Default)]
    pub struct JobId("job-");
}

/// Ordered, unique-key string map used for `parameters` and `additionalData` (I7).
pub type OrderedMap = IndexMap<String, String>;

/// Reserved `additionalData` keys (§3.1).
pub mod additional_data_keys {
    pub const REMOTE_JOB_URI: &str = "remoteJobUri";
    pub const EXIT_CODE: &str = "exitCode";
    pub const RESUMED_ALREADY_RUNNING_JOB: &str = "resumedAlreadyRunningJob";
    pub const ABORTED: &str = "aborted";
}

/// Admission priority (§3.1, §4.3).
///
/// `ForceExecution` bypasses precondition-style rejections and can displace
/// a lower-priority QUEUED record. Ordered so that `ForceExecution >
/// CheckPreconditions`; "equal or higher" comparisons include equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionPriority {
    CheckPreconditions,
    ForceExecution,
}

impl Default for ExecutionPriority {
    fn default() -> Self {
        ExecutionPriority::CheckPreconditions
    }
}

crate::simple_display! {
    ExecutionPriority {
        CheckPreconditions => "CHECK_PRECONDITIONS",
        ForceExecution => "FORCE_EXECUTION",
    }
}

/// Terminal result of a FINISHED record (§3.1, I6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    Successful,
    Failed,
    NotExecuted,
    TimedOut,
    Aborted,
}

crate::simple_display! {
    ResultCode {
        Successful => "SUCCESSFUL",
        Failed => "FAILED",
        NotExecuted => "NOT_EXECUTED",
        TimedOut => "TIMED_OUT",
        Aborted => "ABORTED",
    }
}

/// `runningState` (§3.1). FINISHED carries the terminal [`ResultCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunningState {
    Running,
    Queued,
    Finished { result_code: ResultCode },
}

impl RunningState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunningState::Running)
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, RunningState::Queued)
    }

    /// Treats all FINISHED states as one family unless the caller filters
    /// by a specific `ResultCode` (§4.1: "interpret the FINISHED states as
    /// a single family unless the caller specifies a result code").
    pub fn is_finished(&self) -> bool {
        matches!(self, RunningState::Finished { .. })
    }

    pub fn result_code(&self) -> Option<ResultCode> {
        match self {
            RunningState::Finished { result_code } => Some(*result_code),
            _ => None,
        }
    }
}

crate::simple_display! {
    RunningState {
        Running => "RUNNING",
        Queued => "QUEUED",
        Finished(..) => "FINISHED",
    }
}

/// One entry in `logLines` (§3.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub timestamp_ms: u64,
    pub text: String,
}

impl LogLine {
    pub fn new(timestamp_ms: u64, text: impl Into<String>) -> Self {
        Self { timestamp_ms, text: text.into() }
    }
}

/// One execution attempt of a named job (§3.1).
///
/// `parameters` and `additionalData` preserve insertion order with unique
/// keys (I7); `logLines` is capped at `StoreConfig::max_log_lines`,
/// most-recent-wins (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub name: String,
    pub host: String,
    pub thread: String,
    pub running_state: RunningState,
    pub execution_priority: ExecutionPriority,
    pub parameters: OrderedMap,
    pub result_message: Option<String>,
    pub status_message: Option<String>,
    pub created_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub finished_at_ms: Option<u64>,
    pub last_modified_at_ms: u64,
    pub max_execution_ms: u64,
    pub max_idle_ms: u64,
    pub log_lines: VecDeque<LogLine>,
    pub additional_data: OrderedMap,
    pub abort_requested: bool,
}

impl JobRecord {
    /// Append a log line, evicting the oldest entry if `max_log_lines` is
    /// exceeded (§4.1: "most-recent wins").
    pub fn push_log_line(&mut self, line: LogLine, max_log_lines: usize) {
        self.log_lines.push_back(line);
        while self.log_lines.len() > max_log_lines {
            self.log_lines.pop_front();
        }
    }

    /// Bulk-replace log lines, applying the same cap (§4.1 `setLogLines`).
    pub fn set_log_lines(&mut self, lines: Vec<LogLine>, max_log_lines: usize) {
        let mut deque: VecDeque<LogLine> = lines.into();
        while deque.len() > max_log_lines {
            deque.pop_front();
        }
        self.log_lines = deque;
    }

    pub fn is_terminal(&self) -> bool {
        self.running_state.is_finished()
    }
}

crate::builder! {
    pub struct JobRecordBuilder => JobRecord {
        into {
            id: JobId = JobId::new(),
            name: String = "test-job",
            host: String = "host-1:1",
            thread: String = "worker-0",
        }
        set {
            running_state: RunningState = RunningState::Running,
            execution_priority: ExecutionPriority = ExecutionPriority::CheckPreconditions,
            parameters: OrderedMap = OrderedMap::new(),
            created_at_ms: u64 = 1_000_000,
            last_modified_at_ms: u64 = 1_000_000,
            max_execution_ms: u64 = 3_600_000,
            max_idle_ms: u64 = 600_000,
            log_lines: VecDeque<LogLine> = VecDeque::new(),
            additional_data: OrderedMap = OrderedMap::new(),
            abort_requested: bool = false,
        }
        option {
            result_message: String = None,
            status_message: String = None,
            started_at_ms: u64 = None,
            finished_at_ms: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
