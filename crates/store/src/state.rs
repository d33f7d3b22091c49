// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! In-memory materialized state: the data a [`crate::MemStore`] mutates
//! under its lock. Plain data manipulation, no I/O — durability is layered
//! on top by `MemStore` via the WAL and periodic snapshots.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use wy_core::{JobDefinition, JobId, JobRecord, OrderedMap, ResultCode, RunningState};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterializedState {
    pub records: HashMap<JobId, JobRecord>,
    pub definitions: HashMap<String, JobDefinition>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// I1/I2: at most one RUNNING and at most one QUEUED record per name.
    pub fn has_job(&self, name: &str, state_matches: impl Fn(&RunningState) -> bool) -> bool {
        self.records
            .values()
            .any(|r| r.name == name && state_matches(&r.running_state))
    }

    pub fn find_by_id(&self, id: &JobId) -> Option<&JobRecord> {
        self.records.get(id)
    }

    pub fn find_by_name(&self, name: &str) -> Vec<&JobRecord> {
        self.records.values().filter(|r| r.name == name).collect()
    }

    pub fn find_by_name_and_state(
        &self,
        name: &str,
        state_matches: impl Fn(&RunningState) -> bool,
    ) -> Option<&JobRecord> {
        self.records
            .values()
            .find(|r| r.name == name && state_matches(&r.running_state))
    }

    pub fn find_by_name_and_time_range(
        &self,
        name: &str,
        from_ms: u64,
        to_ms: u64,
    ) -> Vec<&JobRecord> {
        let mut found: Vec<&JobRecord> = self
            .records
            .values()
            .filter(|r| r.name == name && r.created_at_ms >= from_ms && r.created_at_ms <= to_ms)
            .collect();
        found.sort_by_key(|r| r.created_at_ms);
        found
    }

    /// §4.1: queued jobs ready to run, oldest-created first.
    pub fn find_queued_sorted_asc_by_creation(&self) -> Vec<&JobRecord> {
        let mut queued: Vec<&JobRecord> = self
            .records
            .values()
            .filter(|r| r.running_state.is_queued())
            .collect();
        queued.sort_by_key(|r| (r.created_at_ms, r.id.clone()));
        queued
    }

    pub fn running_job_names(&self) -> impl Iterator<Item = &str> {
        self.records
            .values()
            .filter(|r| r.running_state.is_running())
            .map(|r| r.name.as_str())
    }

    /// Inserts `record` unless a job with the same name already occupies
    /// the RUNNING or QUEUED slot, per I1/I2. Returns `None` on collision.
    pub fn create_unique(&mut self, record: JobRecord) -> Option<JobId> {
        let wants_running = record.running_state.is_running();
        let wants_queued = record.running_state.is_queued();
        if wants_running && self.has_job(&record.name, RunningState::is_running) {
            return None;
        }
        if wants_queued && self.has_job(&record.name, RunningState::is_queued) {
            return None;
        }
        let id = record.id.clone();
        self.records.insert(id.clone(), record);
        Some(id)
    }

    pub fn remove(&mut self, id: &JobId) -> bool {
        self.records.remove(id).is_some()
    }

    pub fn mark_queued_as_not_executed(&mut self, id: &JobId, now_ms: u64) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        if !record.running_state.is_queued() {
            return false;
        }
        record.running_state = RunningState::Finished {
            result_code: ResultCode::NotExecuted,
        };
        record.finished_at_ms = Some(now_ms);
        record.last_modified_at_ms = now_ms;
        true
    }

    pub fn activate_queued_job(&mut self, id: &JobId, host: &str, thread: &str, now_ms: u64) -> bool {
        let Some(existing) = self.records.get(id) else {
            return false;
        };
        if !existing.running_state.is_queued() {
            return false;
        }
        if self.has_job(&existing.name, RunningState::is_running) {
            return false;
        }
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        record.running_state = RunningState::Running;
        record.host = host.to_string();
        record.thread = thread.to_string();
        record.started_at_ms = Some(now_ms);
        record.last_modified_at_ms = now_ms;
        true
    }

    pub fn mark_running_as_finished(
        &mut self,
        id: &JobId,
        result_code: ResultCode,
        result_message: Option<String>,
        now_ms: u64,
    ) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        if !record.running_state.is_running() {
            return false;
        }
        record.running_state = RunningState::Finished { result_code };
        record.result_message = result_message;
        record.finished_at_ms = Some(now_ms);
        record.last_modified_at_ms = now_ms;
        true
    }

    pub fn update_host_thread(&mut self, id: &JobId, host: &str, thread: &str, now_ms: u64) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        record.host = host.to_string();
        record.thread = thread.to_string();
        record.last_modified_at_ms = now_ms;
        true
    }

    /// §4.4: the remote supervisor stamps `statusMessage` on each RUNNING
    /// poll response, independent of `resultMessage` (which only ever gets
    /// set on a terminal transition, I6).
    pub fn set_status_message(&mut self, id: &JobId, message: Option<String>, now_ms: u64) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        record.status_message = message;
        record.last_modified_at_ms = now_ms;
        true
    }

    pub fn append_log_line(&mut self, id: &JobId, line: wy_core::LogLine, max_log_lines: usize, now_ms: u64) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        record.push_log_line(line, max_log_lines);
        record.last_modified_at_ms = now_ms;
        true
    }

    pub fn set_log_lines(
        &mut self,
        id: &JobId,
        lines: Vec<wy_core::LogLine>,
        max_log_lines: usize,
        now_ms: u64,
    ) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        record.set_log_lines(lines, max_log_lines);
        record.last_modified_at_ms = now_ms;
        true
    }

    pub fn insert_additional_data(
        &mut self,
        id: &JobId,
        key: String,
        value: String,
        now_ms: u64,
    ) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        if !record.additional_data.contains_key(&key) {
            record.additional_data.insert(key, value);
        }
        record.last_modified_at_ms = now_ms;
        true
    }

    pub fn add_additional_data(&mut self, id: &JobId, key: String, value: String, now_ms: u64) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        record.additional_data.insert(key, value);
        record.last_modified_at_ms = now_ms;
        true
    }

    pub fn request_abort(&mut self, id: &JobId) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        if record.abort_requested {
            return false;
        }
        record.abort_requested = true;
        true
    }

    pub fn upsert_definition(&mut self, definition: JobDefinition) {
        self.definitions.insert(definition.name.clone(), definition);
    }

    pub fn get_definition(&self, name: &str) -> Option<&JobDefinition> {
        self.definitions.get(name)
    }

    pub fn set_definition_disabled(&mut self, name: &str, disabled: bool, now_ms: u64) -> bool {
        let Some(def) = self.definitions.get_mut(name) else {
            return false;
        };
        def.disabled = disabled;
        if disabled {
            def.last_not_executed_at_ms = Some(now_ms);
        }
        true
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
