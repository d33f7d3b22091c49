// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! JSON request/response shapes for the `/jobs` resource tree (§6.1).
//!
//! These mirror [`wy_core::JobRecord`] field-for-field rather than wrapping
//! it directly, so the wire format stays stable if the in-process record
//! grows internal bookkeeping fields later.

use serde::{Deserialize, Serialize};
use wy_core::{ExecutionPriority, JobId, JobRecord, LogLine, OrderedMap, ResultCode, RunningState};

/// One execution attempt, as rendered to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobRecordDto {
    pub id: JobId,
    pub name: String,
    pub host: String,
    pub thread: String,
    pub running_state: String,
    pub result_code: Option<ResultCode>,
    pub execution_priority: ExecutionPriority,
    pub parameters: OrderedMap,
    pub result_message: Option<String>,
    pub status_message: Option<String>,
    pub created_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub finished_at_ms: Option<u64>,
    pub last_modified_at_ms: u64,
    pub log_lines: Vec<LogLineDto>,
    pub additional_data: OrderedMap,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogLineDto {
    pub timestamp_ms: u64,
    pub text: String,
}

impl From<&LogLine> for LogLineDto {
    fn from(line: &LogLine) -> Self {
        Self { timestamp_ms: line.timestamp_ms, text: line.text.clone() }
    }
}

impl From<&JobRecord> for JobRecordDto {
    fn from(record: &JobRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            host: record.host.clone(),
            thread: record.thread.clone(),
            running_state: record.running_state.to_string(),
            result_code: record.running_state.result_code(),
            execution_priority: record.execution_priority,
            parameters: record.parameters.clone(),
            result_message: record.result_message.clone(),
            status_message: record.status_message.clone(),
            created_at_ms: record.created_at_ms,
            started_at_ms: record.started_at_ms,
            finished_at_ms: record.finished_at_ms,
            last_modified_at_ms: record.last_modified_at_ms,
            log_lines: record.log_lines.iter().map(LogLineDto::from).collect(),
            additional_data: record.additional_data.clone(),
        }
    }
}

/// Body of `GET /jobs/enable`, `/jobs/disable`, `/jobs/status` (§6.1).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: GlobalStatus,
    pub local_running_jobs: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GlobalStatus {
    Enabled,
    Disabled,
}

impl StatusResponse {
    pub fn new(enabled: bool, local_running_jobs: bool) -> Self {
        Self {
            status: if enabled { GlobalStatus::Enabled } else { GlobalStatus::Disabled },
            local_running_jobs,
        }
    }
}

/// Body of `GET /jobs/history` (§6.1): job name to the matching records
/// within the requested window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HistoryResponse {
    pub records: OrderedHistory,
}

pub type OrderedHistory = std::collections::BTreeMap<String, Vec<JobRecordDto>>;

/// Error body returned alongside a non-2xx status (§7: "scheduler errors
/// surface to the caller").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self { error: error.into(), message: message.into() }
    }
}

#[cfg(test)]
#[path = "dto_tests.rs"]
mod tests;
