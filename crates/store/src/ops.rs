// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! The mutating half of the [`crate::Store`] trait, reified as a
//! serializable enum so [`crate::wal::Wal`] can persist and replay it.
//! Read-only primitives (`findBy*`, `hasJob`) never touch the WAL.

use serde::{Deserialize, Serialize};
use wy_core::{JobDefinition, JobId, JobRecord, LogLine, ResultCode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoreOp {
    CreateUnique {
        record: JobRecord,
    },
    Remove {
        id: JobId,
    },
    MarkQueuedAsNotExecuted {
        id: JobId,
        now_ms: u64,
    },
    ActivateQueuedJob {
        id: JobId,
        host: String,
        thread: String,
        now_ms: u64,
    },
    MarkRunningAsFinished {
        id: JobId,
        result_code: ResultCode,
        result_message: Option<String>,
        now_ms: u64,
    },
    UpdateHostThread {
        id: JobId,
        host: String,
        thread: String,
        now_ms: u64,
    },
    SetStatusMessage {
        id: JobId,
        message: Option<String>,
        now_ms: u64,
    },
    AppendLogLine {
        id: JobId,
        line: LogLine,
        max_log_lines: usize,
        now_ms: u64,
    },
    SetLogLines {
        id: JobId,
        lines: Vec<LogLine>,
        max_log_lines: usize,
        now_ms: u64,
    },
    InsertAdditionalData {
        id: JobId,
        key: String,
        value: String,
        now_ms: u64,
    },
    AddAdditionalData {
        id: JobId,
        key: String,
        value: String,
        now_ms: u64,
    },
    RequestAbort {
        id: JobId,
    },
    UpsertDefinition {
        definition: JobDefinition,
    },
    SetDefinitionDisabled {
        name: String,
        disabled: bool,
        now_ms: u64,
    },
}

impl crate::state::MaterializedState {
    /// Applies a previously-logged op during WAL replay. Mirrors exactly
    /// what `MemStore` does for a live call, so replay and live mutation
    /// can never drift apart.
    pub fn apply(&mut self, op: &StoreOp) {
        match op.clone() {
            StoreOp::CreateUnique { record } => {
                self.create_unique(record);
            }
            StoreOp::Remove { id } => {
                self.remove(&id);
            }
            StoreOp::MarkQueuedAsNotExecuted { id, now_ms } => {
                self.mark_queued_as_not_executed(&id, now_ms);
            }
            StoreOp::ActivateQueuedJob { id, host, thread, now_ms } => {
                self.activate_queued_job(&id, &host, &thread, now_ms);
            }
            StoreOp::MarkRunningAsFinished { id, result_code, result_message, now_ms } => {
                self.mark_running_as_finished(&id, result_code, result_message, now_ms);
            }
            StoreOp::UpdateHostThread { id, host, thread, now_ms } => {
                self.update_host_thread(&id, &host, &thread, now_ms);
            }
            StoreOp::SetStatusMessage { id, message, now_ms } => {
                self.set_status_message(&id, message, now_ms);
            }
            StoreOp::AppendLogLine { id, line, max_log_lines, now_ms } => {
                self.append_log_line(&id, line, max_log_lines, now_ms);
            }
            StoreOp::SetLogLines { id, lines, max_log_lines, now_ms } => {
                self.set_log_lines(&id, lines, max_log_lines, now_ms);
            }
            StoreOp::InsertAdditionalData { id, key, value, now_ms } => {
                self.insert_additional_data(&id, key, value, now_ms);
            }
            StoreOp::AddAdditionalData { id, key, value, now_ms } => {
                self.add_additional_data(&id, key, value, now_ms);
            }
            StoreOp::RequestAbort { id } => {
                self.request_abort(&id);
            }
            StoreOp::UpsertDefinition { definition } => {
                self.upsert_definition(definition);
            }
            StoreOp::SetDefinitionDisabled { name, disabled, now_ms } => {
                self.set_definition_disabled(&name, disabled, now_ms);
            }
        }
    }
}
