// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wy-store: the durable, concurrency-safe job record repository (§4.1).
//!
//! [`Store`] is the trait the scheduler depends on; [`MemStore`] is the
//! shipped implementation — an in-process [`parking_lot::RwLock`] over
//! [`state::MaterializedState`], durable via a write-ahead log
//! ([`wal::Wal`]) and periodic zstd snapshots ([`snapshot`]). A networked or
//! database-backed `Store` is a drop-in replacement; multiple processes
//! sharing one store is a property of the trait boundary, not of this
//! crate's particular implementation.

pub mod backup;
pub mod config;
pub mod error;
pub mod ops;
pub mod snapshot;
pub mod state;
pub mod wal;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};
use wy_core::{
    ExecutionPriority, JobDefinition, JobId, JobRecord, LogLine, OrderedMap, ResultCode,
    RunningState,
};

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use ops::StoreOp;
pub use state::MaterializedState;

use snapshot::Snapshot;
use wal::Wal;

/// Which `runningState` family a `findByNameAndState`-style query targets.
///
/// `Finished(None)` matches any result code (§4.1: "interpret the FINISHED
/// states as a single family unless the caller specifies a result code");
/// `Finished(Some(code))` narrows to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    Running,
    Queued,
    Finished(Option<ResultCode>),
}

impl StateFilter {
    fn matches(&self, state: &RunningState) -> bool {
        match self {
            StateFilter::Running => state.is_running(),
            StateFilter::Queued => state.is_queued(),
            StateFilter::Finished(None) => state.is_finished(),
            StateFilter::Finished(Some(code)) => state.result_code() == Some(*code),
        }
    }
}

/// Conditional, linearizable-enough primitives on [`JobRecord`] (§4.1).
///
/// Every mutating method is `async` so a future networked implementation
/// can block on I/O without changing call sites (§5: "every store primitive
/// may block on I/O"); `MemStore`'s own implementations are synchronous
/// `parking_lot` operations under the hood.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Inserts `record` unless a record for `record.name` already occupies
    /// the slot implied by `record.running_state` (I1/I2). `Ok(None)` means
    /// the uniqueness constraint rejected the insert — not an error.
    async fn create_unique(&self, record: JobRecord) -> StoreResult<Option<JobId>>;

    async fn find_by_id(&self, id: &JobId) -> StoreResult<Option<JobRecord>>;

    async fn find_by_name_and_state(
        &self,
        name: &str,
        filter: StateFilter,
    ) -> StoreResult<Option<JobRecord>>;

    /// Most-recent-first, capped at `limit`.
    async fn find_by_name(&self, name: &str, limit: usize) -> StoreResult<Vec<JobRecord>>;

    async fn find_by_name_and_time_range(
        &self,
        name: &str,
        from_ms: u64,
        to_ms: u64,
        result_codes: Option<&[ResultCode]>,
    ) -> StoreResult<Vec<JobRecord>>;

    /// Oldest-created-first (§4.3: queue drain order).
    async fn find_queued_sorted_asc_by_creation(&self) -> StoreResult<Vec<JobRecord>>;

    async fn has_job(&self, name: &str, filter: StateFilter) -> StoreResult<bool>;

    async fn remove(&self, id: &JobId) -> StoreResult<bool>;

    /// Names of every job currently RUNNING, used by the scheduler's
    /// constraint check.
    async fn running_job_names(&self) -> StoreResult<Vec<String>>;

    async fn mark_queued_as_not_executed(&self, name: &str, now_ms: u64) -> StoreResult<bool>;

    async fn activate_queued_job(
        &self,
        name: &str,
        host: &str,
        thread: &str,
        now_ms: u64,
    ) -> StoreResult<bool>;

    async fn mark_running_as_finished(
        &self,
        name: &str,
        result_code: ResultCode,
        message: Option<String>,
        now_ms: u64,
    ) -> StoreResult<bool>;

    async fn mark_running_as_finished_successfully(
        &self,
        name: &str,
        now_ms: u64,
    ) -> StoreResult<bool> {
        self.mark_running_as_finished(name, ResultCode::Successful, None, now_ms).await
    }

    async fn update_host_thread(
        &self,
        name: &str,
        host: &str,
        thread: &str,
        now_ms: u64,
    ) -> StoreResult<bool>;

    /// §4.4: stamps `statusMessage` on the RUNNING record, independent of
    /// `resultMessage` (terminal-only, I6).
    async fn set_status_message(
        &self,
        name: &str,
        message: Option<String>,
        now_ms: u64,
    ) -> StoreResult<bool>;

    async fn append_log_line(&self, name: &str, line: LogLine, now_ms: u64) -> StoreResult<bool>;

    async fn set_log_lines(
        &self,
        name: &str,
        lines: Vec<LogLine>,
        now_ms: u64,
    ) -> StoreResult<bool>;

    /// First-insert semantics: sets `key` only if it is absent from
    /// `additionalData`; a no-op (but still `Ok(true)`) if the key is
    /// already present.
    async fn insert_additional_data(
        &self,
        name: &str,
        key: String,
        value: String,
        now_ms: u64,
    ) -> StoreResult<bool>;

    /// Overwrite semantics: merges one key into `additionalData`.
    async fn add_additional_data(
        &self,
        name: &str,
        key: String,
        value: String,
        now_ms: u64,
    ) -> StoreResult<bool>;

    async fn request_abort(&self, id: &JobId) -> StoreResult<bool>;

    async fn upsert_definition(&self, definition: JobDefinition) -> StoreResult<()>;

    async fn get_definition(&self, name: &str) -> StoreResult<Option<JobDefinition>>;

    async fn set_definition_disabled(
        &self,
        name: &str,
        disabled: bool,
        now_ms: u64,
    ) -> StoreResult<bool>;
}

/// Convenience constructor used by callers that admit a new record: builds
/// the `JobRecord` and range-checks priority comparisons live in
/// `wy-engine`, not here — this crate only enforces uniqueness.
pub fn new_record(
    name: impl Into<String>,
    host: impl Into<String>,
    thread: impl Into<String>,
    running_state: RunningState,
    execution_priority: ExecutionPriority,
    parameters: OrderedMap,
    max_execution_ms: u64,
    max_idle_ms: u64,
    now_ms: u64,
) -> JobRecord {
    let started_at_ms = if running_state.is_running() { Some(now_ms) } else { None };
    JobRecord {
        id: JobId::new(),
        name: name.into(),
        host: host.into(),
        thread: thread.into(),
        running_state,
        execution_priority,
        parameters,
        result_message: None,
        status_message: None,
        created_at_ms: now_ms,
        started_at_ms,
        finished_at_ms: None,
        last_modified_at_ms: now_ms,
        max_execution_ms,
        max_idle_ms,
        log_lines: Default::default(),
        additional_data: OrderedMap::new(),
        abort_requested: false,
    }
}

/// In-process [`Store`] backed by a write-ahead log and periodic snapshots.
///
/// All `MemStore` handles opened against the same `data_dir` within one
/// process should be created via [`MemStore::open`] once and then cloned
/// (it is a cheap `Arc` handle) — opening the same directory twice would
/// produce two independent WAL writers racing on the same file.
#[derive(Clone)]
pub struct MemStore {
    inner: Arc<Inner>,
}

struct Inner {
    config: StoreConfig,
    state: RwLock<MaterializedState>,
    wal: Mutex<Wal<StoreOp>>,
    ops_since_checkpoint: AtomicU64,
}

impl MemStore {
    /// Opens (or creates) the store at `config.data_dir`: loads the newest
    /// snapshot if present, then replays WAL entries with `seq >
    /// snapshot.seq` on top of it.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let snapshot = snapshot::load_snapshot(config.snapshot_path())?;
        let (mut state, processed_seq) = match snapshot {
            Some(snap) => (snap.state, snap.seq),
            None => (MaterializedState::new(), 0),
        };

        let mut wal: Wal<StoreOp> = Wal::open(config.wal_path(), processed_seq)?;
        let mut replayed = 0u64;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply(&entry.op);
            wal.mark_processed(entry.seq);
            replayed += 1;
        }
        if replayed > 0 {
            debug!(replayed, "replayed wal entries on open");
        }

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                state: RwLock::new(state),
                wal: Mutex::new(wal),
                ops_since_checkpoint: AtomicU64::new(0),
            }),
        })
    }

    /// Opens an ephemeral store under a fresh temp directory. Test-only
    /// convenience; the directory is leaked (cleaned up by the OS tmp
    /// reaper), matching `tempfile`'s usual test pattern elsewhere in this
    /// workspace but without requiring callers to hold the `TempDir` guard.
    #[cfg(any(test, feature = "test-support"))]
    pub fn open_temp() -> StoreResult<Self> {
        let dir = tempfile::tempdir().map_err(StoreError::WalIo)?;
        let config = StoreConfig::new(dir.into_path());
        Self::open(config)
    }

    fn record_op(&self, op: StoreOp, now_ms: u64) -> StoreResult<()> {
        let mut wal = self.inner.wal.lock();
        let seq = wal.append(&op)?;
        if wal.needs_flush() {
            wal.flush()?;
        }
        wal.mark_processed(seq);
        drop(wal);

        let count = self.inner.ops_since_checkpoint.fetch_add(1, Ordering::AcqRel) + 1;
        if count >= self.inner.config.checkpoint_every_ops {
            self.checkpoint(now_ms)?;
        }
        Ok(())
    }

    /// Snapshots the current state and truncates the WAL prefix it covers.
    fn checkpoint(&self, now_ms: u64) -> StoreResult<()> {
        let mut wal = self.inner.wal.lock();
        let seq = wal.write_seq();
        let state_copy = self.inner.state.read().clone();
        snapshot::save_snapshot(
            self.inner.config.snapshot_path(),
            &Snapshot::new(seq, state_copy, now_ms),
        )?;
        wal.truncate_before(seq + 1)?;
        self.inner.ops_since_checkpoint.store(0, Ordering::Release);
        Ok(())
    }

    fn max_log_lines(&self) -> usize {
        self.inner.config.max_log_lines
    }

    fn id_for(&self, name: &str, filter: StateFilter) -> Option<JobId> {
        let state = self.inner.state.read();
        state
            .records
            .values()
            .find(|r| r.name == name && filter.matches(&r.running_state))
            .map(|r| r.id)
    }
}

#[async_trait]
impl Store for MemStore {
    async fn create_unique(&self, record: JobRecord) -> StoreResult<Option<JobId>> {
        let now_ms = record.last_modified_at_ms;
        let mut state = self.inner.state.write();
        let result = state.create_unique(record.clone());
        drop(state);
        if let Some(id) = result {
            self.record_op(StoreOp::CreateUnique { record }, now_ms)?;
            Ok(Some(id))
        } else {
            Ok(None)
        }
    }

    async fn find_by_id(&self, id: &JobId) -> StoreResult<Option<JobRecord>> {
        Ok(self.inner.state.read().find_by_id(id).cloned())
    }

    async fn find_by_name_and_state(
        &self,
        name: &str,
        filter: StateFilter,
    ) -> StoreResult<Option<JobRecord>> {
        Ok(self.inner.state.read().find_by_name_and_state(name, |s| filter.matches(s)).cloned())
    }

    async fn find_by_name(&self, name: &str, limit: usize) -> StoreResult<Vec<JobRecord>> {
        let state = self.inner.state.read();
        let mut found: Vec<JobRecord> = state.find_by_name(name).into_iter().cloned().collect();
        found.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        found.truncate(limit);
        Ok(found)
    }

    async fn find_by_name_and_time_range(
        &self,
        name: &str,
        from_ms: u64,
        to_ms: u64,
        result_codes: Option<&[ResultCode]>,
    ) -> StoreResult<Vec<JobRecord>> {
        let state = self.inner.state.read();
        let found: Vec<JobRecord> = state
            .find_by_name_and_time_range(name, from_ms, to_ms)
            .into_iter()
            .filter(|r| match result_codes {
                None => true,
                Some(codes) => r.running_state.result_code().is_some_and(|c| codes.contains(&c)),
            })
            .cloned()
            .collect();
        Ok(found)
    }

    async fn find_queued_sorted_asc_by_creation(&self) -> StoreResult<Vec<JobRecord>> {
        Ok(self
            .inner
            .state
            .read()
            .find_queued_sorted_asc_by_creation()
            .into_iter()
            .cloned()
            .collect())
    }

    async fn has_job(&self, name: &str, filter: StateFilter) -> StoreResult<bool> {
        Ok(self.inner.state.read().has_job(name, |s| filter.matches(s)))
    }

    async fn remove(&self, id: &JobId) -> StoreResult<bool> {
        let removed = self.inner.state.write().remove(id);
        if removed {
            self.record_op(StoreOp::Remove { id: *id }, 0)?;
        }
        Ok(removed)
    }

    async fn running_job_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.inner.state.read().running_job_names().map(str::to_string).collect())
    }

    async fn mark_queued_as_not_executed(&self, name: &str, now_ms: u64) -> StoreResult<bool> {
        let Some(id) = self.id_for(name, StateFilter::Queued) else {
            return Ok(false);
        };
        let applied = self.inner.state.write().mark_queued_as_not_executed(&id, now_ms);
        if applied {
            self.record_op(StoreOp::MarkQueuedAsNotExecuted { id, now_ms }, now_ms)?;
        }
        Ok(applied)
    }

    async fn activate_queued_job(
        &self,
        name: &str,
        host: &str,
        thread: &str,
        now_ms: u64,
    ) -> StoreResult<bool> {
        let Some(id) = self.id_for(name, StateFilter::Queued) else {
            return Ok(false);
        };
        let applied = self.inner.state.write().activate_queued_job(&id, host, thread, now_ms);
        if applied {
            self.record_op(
                StoreOp::ActivateQueuedJob {
                    id,
                    host: host.to_string(),
                    thread: thread.to_string(),
                    now_ms,
                },
                now_ms,
            )?;
        }
        Ok(applied)
    }

    async fn mark_running_as_finished(
        &self,
        name: &str,
        result_code: ResultCode,
        message: Option<String>,
        now_ms: u64,
    ) -> StoreResult<bool> {
        let Some(id) = self.id_for(name, StateFilter::Running) else {
            return Ok(false);
        };
        let applied =
            self.inner.state.write().mark_running_as_finished(&id, result_code, message.clone(), now_ms);
        if applied {
            self.record_op(
                StoreOp::MarkRunningAsFinished { id, result_code, result_message: message, now_ms },
                now_ms,
            )?;
        }
        Ok(applied)
    }

    async fn update_host_thread(
        &self,
        name: &str,
        host: &str,
        thread: &str,
        now_ms: u64,
    ) -> StoreResult<bool> {
        let Some(id) = self.id_for(name, StateFilter::Running) else {
            return Ok(false);
        };
        let applied = self.inner.state.write().update_host_thread(&id, host, thread, now_ms);
        if applied {
            self.record_op(
                StoreOp::UpdateHostThread {
                    id,
                    host: host.to_string(),
                    thread: thread.to_string(),
                    now_ms,
                },
                now_ms,
            )?;
        }
        Ok(applied)
    }

    async fn set_status_message(
        &self,
        name: &str,
        message: Option<String>,
        now_ms: u64,
    ) -> StoreResult<bool> {
        let Some(id) = self.id_for(name, StateFilter::Running) else {
            return Ok(false);
        };
        let applied = self.inner.state.write().set_status_message(&id, message.clone(), now_ms);
        if applied {
            self.record_op(StoreOp::SetStatusMessage { id, message, now_ms }, now_ms)?;
        }
        Ok(applied)
    }

    async fn append_log_line(&self, name: &str, line: LogLine, now_ms: u64) -> StoreResult<bool> {
        let Some(id) = self.id_for(name, StateFilter::Running) else {
            return Ok(false);
        };
        let max_log_lines = self.max_log_lines();
        let applied = self.inner.state.write().append_log_line(&id, line.clone(), max_log_lines, now_ms);
        if applied {
            self.record_op(StoreOp::AppendLogLine { id, line, max_log_lines, now_ms }, now_ms)?;
        }
        Ok(applied)
    }

    async fn set_log_lines(
        &self,
        name: &str,
        lines: Vec<LogLine>,
        now_ms: u64,
    ) -> StoreResult<bool> {
        let Some(id) = self.id_for(name, StateFilter::Running) else {
            return Ok(false);
        };
        let max_log_lines = self.max_log_lines();
        let applied =
            self.inner.state.write().set_log_lines(&id, lines.clone(), max_log_lines, now_ms);
        if applied {
            self.record_op(StoreOp::SetLogLines { id, lines, max_log_lines, now_ms }, now_ms)?;
        }
        Ok(applied)
    }

    async fn insert_additional_data(
        &self,
        name: &str,
        key: String,
        value: String,
        now_ms: u64,
    ) -> StoreResult<bool> {
        let Some(id) = self.id_for(name, StateFilter::Running) else {
            return Ok(false);
        };
        let applied =
            self.inner.state.write().insert_additional_data(&id, key.clone(), value.clone(), now_ms);
        if applied {
            self.record_op(StoreOp::InsertAdditionalData { id, key, value, now_ms }, now_ms)?;
        }
        Ok(applied)
    }

    async fn add_additional_data(
        &self,
        name: &str,
        key: String,
        value: String,
        now_ms: u64,
    ) -> StoreResult<bool> {
        let Some(id) = self.id_for(name, StateFilter::Running) else {
            return Ok(false);
        };
        let applied =
            self.inner.state.write().add_additional_data(&id, key.clone(), value.clone(), now_ms);
        if applied {
            self.record_op(StoreOp::AddAdditionalData { id, key, value, now_ms }, now_ms)?;
        }
        Ok(applied)
    }

    async fn request_abort(&self, id: &JobId) -> StoreResult<bool> {
        let applied = self.inner.state.write().request_abort(id);
        if applied {
            self.record_op(StoreOp::RequestAbort { id: *id }, 0)?;
        }
        Ok(applied)
    }

    async fn upsert_definition(&self, definition: JobDefinition) -> StoreResult<()> {
        self.inner.state.write().upsert_definition(definition.clone());
        self.record_op(StoreOp::UpsertDefinition { definition }, 0)
    }

    async fn get_definition(&self, name: &str) -> StoreResult<Option<JobDefinition>> {
        Ok(self.inner.state.read().get_definition(name).cloned())
    }

    async fn set_definition_disabled(
        &self,
        name: &str,
        disabled: bool,
        now_ms: u64,
    ) -> StoreResult<bool> {
        let applied = self.inner.state.write().set_definition_disabled(name, disabled, now_ms);
        if applied {
            self.record_op(StoreOp::SetDefinitionDisabled { name: name.to_string(), disabled, now_ms }, now_ms)?;
        }
        Ok(applied)
    }
}

impl Drop for Inner {
    /// Best-effort final checkpoint so a clean process exit doesn't leave an
    /// unbounded WAL for the next `open` to replay. Errors are logged, not
    /// propagated — `Drop` can't fail.
    fn drop(&mut self) {
        let seq = self.wal.lock().write_seq();
        if seq == 0 {
            return;
        }
        let state_copy = self.state.read().clone();
        if let Err(e) =
            snapshot::save_snapshot(self.config.snapshot_path(), &Snapshot::new(seq, state_copy, 0))
        {
            warn!(error = %e, "final checkpoint on drop failed");
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
