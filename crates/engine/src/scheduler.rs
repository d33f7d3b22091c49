// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! The admit/queue/run scheduler (§4.3).

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wy_core::{
    additional_data_keys, host_tag, thread_tag, Clock, ExecutionPriority, JobDefinition, JobId,
    OrderedMap, ResultCode, RunningConstraint, RunningState, SystemClock,
};
use wy_store::{new_record, StateFilter, Store};

use crate::constraints::ConstraintSet;
use crate::error::{SchedulerError, SchedulerResult};
use crate::registry::{ExceptionOutcome, JobContext, Phase, Registry, Runnable};

struct WorkerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

/// Implements §4.3's admit/queue/run decisions against a [`Store`] and
/// [`Registry`]. Generic over the store so tests can swap in a fresh
/// `wy_store::MemStore` per case while the daemon binary uses one shared
/// instance (§9: "support multiple scheduler instances against the same
/// store for testing").
pub struct Scheduler<S: Store, C: Clock = SystemClock> {
    store: Arc<S>,
    registry: Registry,
    constraints: ConstraintSet,
    execution_enabled: AtomicBool,
    clock: C,
    host: String,
    worker_seq: AtomicU64,
    workers: Mutex<HashMap<JobId, WorkerHandle>>,
}

impl<S: Store> Scheduler<S, SystemClock> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: Store, C: Clock> Scheduler<S, C> {
    pub fn with_clock(store: Arc<S>, clock: C) -> Self {
        Self {
            store,
            registry: Registry::new(),
            constraints: ConstraintSet::new(),
            execution_enabled: AtomicBool::new(true),
            clock,
            host: host_tag().to_string(),
            worker_seq: AtomicU64::new(0),
            workers: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The `host` tag this instance stamps onto records it activates
    /// (§3.1), used by the daemon to tell local from remote running jobs.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Registration is idempotent-checked by name, not idempotent by value
    /// (§4.2: "re-registration under the same name is rejected").
    pub fn register_job(&self, runnable: Arc<dyn Runnable>) -> SchedulerResult<()> {
        self.registry.register(runnable)?;
        Ok(())
    }

    pub fn add_running_constraint(&self, names: &[String]) -> SchedulerResult<()> {
        for name in names {
            if !self.registry.contains(name) {
                return Err(SchedulerError::JobNotRegistered(name.clone()));
            }
        }
        let constraint = RunningConstraint::new(names.to_vec())
            .map_err(|_| SchedulerError::JobNotRegistered(names.join(",")))?;
        self.constraints.add(&constraint);
        Ok(())
    }

    pub fn set_execution_enabled(&self, enabled: bool) {
        self.execution_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn execution_enabled(&self) -> bool {
        self.execution_enabled.load(Ordering::SeqCst)
    }

    /// Persists the per-job `disabled` flag on the definition (§4.3). A job
    /// registered via `register_job` has no definition row yet (the
    /// registry and the store are kept apart per §9); the first toggle
    /// upserts one seeded from the runnable's own metadata rather than
    /// requiring a definition to already exist.
    pub async fn set_job_execution_enabled(&self, name: &str, enabled: bool) -> SchedulerResult<()> {
        let now = self.clock.epoch_ms();
        let applied = self.store.set_definition_disabled(name, !enabled, now).await?;
        if applied {
            return Ok(());
        }
        let runnable = self
            .registry
            .get(name)
            .ok_or_else(|| SchedulerError::JobNotRegistered(name.to_string()))?;
        let definition = JobDefinition {
            name: name.to_string(),
            disabled: !enabled,
            last_not_executed_at_ms: if enabled { None } else { Some(now) },
            max_execution_ms: runnable.max_execution_ms(),
            max_idle_ms: runnable.max_idle_ms(),
            polling_interval_ms: runnable.polling_interval_ms(),
            is_remote: runnable.is_remote(),
            is_abortable: runnable.is_abortable(),
        };
        self.store.upsert_definition(definition).await?;
        Ok(())
    }

    /// §3.3: records are not deleted individually except on displacement,
    /// so this transitions the queued record to `FINISHED:NOT_EXECUTED`
    /// rather than removing it.
    pub async fn remove_job_from_queue(&self, name: &str) -> SchedulerResult<bool> {
        let now = self.clock.epoch_ms();
        Ok(self.store.mark_queued_as_not_executed(name, now).await?)
    }

    /// §4.3 "Admit decision": the heart of the scheduler.
    pub async fn execute_job(
        &self,
        name: &str,
        priority: ExecutionPriority,
        params: OrderedMap,
    ) -> SchedulerResult<JobId> {
        if !self.execution_enabled() {
            return Err(SchedulerError::JobExecutionDisabled(name.to_string()));
        }
        let runnable = self
            .registry
            .get(name)
            .ok_or_else(|| SchedulerError::JobNotRegistered(name.to_string()))?;
        if let Some(definition) = self.store.get_definition(name).await? {
            if definition.disabled {
                return Err(SchedulerError::JobExecutionDisabled(name.to_string()));
            }
        }

        let now = self.clock.epoch_ms();
        let queued = self.store.find_by_name_and_state(name, StateFilter::Queued).await?;

        if let Some(q) = queued {
            if q.execution_priority < priority {
                self.store.remove(&q.id).await?;
                return self.insert_queued(&runnable, name, priority, params, now, true).await;
            }
            return Err(SchedulerError::JobAlreadyQueued(name.to_string()));
        }

        let running = self.store.find_by_name_and_state(name, StateFilter::Running).await?;
        match running {
            None => {
                // A running-constraint group member being RUNNING blocks a
                // fresh admission exactly like an own RUNNING record would
                // (§4.3 Constraint check, reflexive per §9) — queue instead
                // of racing straight into RUNNING.
                let running_names: BTreeSet<String> =
                    self.store.running_job_names().await?.into_iter().collect();
                if self.constraints.is_blocked(name, &running_names) {
                    return self.insert_queued(&runnable, name, priority, params, now, false).await;
                }
                let record = new_record(
                    name,
                    &self.host,
                    thread_tag(self.worker_seq.fetch_add(1, Ordering::SeqCst)),
                    RunningState::Running,
                    priority,
                    params,
                    runnable.max_execution_ms(),
                    runnable.max_idle_ms(),
                    now,
                );
                match self.store.create_unique(record).await? {
                    Some(id) => {
                        self.dispatch_worker(id, runnable, name.to_string());
                        Ok(id)
                    }
                    None => Err(SchedulerError::JobAlreadyRunning(name.to_string())),
                }
            }
            Some(r) => {
                if r.execution_priority >= priority {
                    Err(SchedulerError::JobExecutionNotNecessary(name.to_string()))
                } else {
                    self.insert_queued(&runnable, name, priority, params, now, false).await
                }
            }
        }
    }

    async fn insert_queued(
        &self,
        runnable: &Arc<dyn Runnable>,
        name: &str,
        priority: ExecutionPriority,
        params: OrderedMap,
        now: u64,
        displaced: bool,
    ) -> SchedulerResult<JobId> {
        let mut record = new_record(
            name,
            &self.host,
            thread_tag(self.worker_seq.fetch_add(1, Ordering::SeqCst)),
            RunningState::Queued,
            priority,
            params,
            runnable.max_execution_ms(),
            runnable.max_idle_ms(),
            now,
        );
        if displaced {
            record
                .additional_data
                .insert(additional_data_keys::RESUMED_ALREADY_RUNNING_JOB.to_string(), "true".to_string());
        }
        match self.store.create_unique(record).await? {
            Some(id) => Ok(id),
            None => Err(SchedulerError::JobAlreadyQueued(name.to_string())),
        }
    }

    /// §4.3 "Queue drain": runs only when execution is enabled.
    pub async fn execute_queued_jobs(&self) -> SchedulerResult<()> {
        if !self.execution_enabled() {
            return Ok(());
        }
        let queued = self.store.find_queued_sorted_asc_by_creation().await?;
        let mut running_names: BTreeSet<String> =
            self.store.running_job_names().await?.into_iter().collect();

        for record in queued {
            if running_names.contains(&record.name) {
                continue;
            }
            if self.constraints.is_blocked(&record.name, &running_names) {
                continue;
            }
            let Some(runnable) = self.registry.get(&record.name) else {
                continue;
            };
            let now = self.clock.epoch_ms();
            let thread = thread_tag(self.worker_seq.fetch_add(1, Ordering::SeqCst));
            let activated = self
                .store
                .activate_queued_job(&record.name, &self.host, &thread, now)
                .await?;
            if !activated {
                continue;
            }
            // Activating this record makes its name RUNNING for the rest of
            // this pass — without updating the snapshot here, a later queued
            // record in the same constraint group would be checked against a
            // stale "nobody's running" view and wrongly activated too (I5/P2).
            running_names.insert(record.name.clone());
            self.store.update_host_thread(&record.name, &self.host, &thread, now).await?;
            if let Some(record) = self
                .store
                .find_by_name_and_state(&record.name, StateFilter::Running)
                .await?
            {
                self.dispatch_worker(record.id, runnable, record.name.clone());
            }
        }
        Ok(())
    }

    /// Cancels the local worker task for `id`, if one is tracked. A no-op
    /// for remote jobs (whose dispatch task has already completed) and for
    /// jobs owned by another process.
    pub fn cancel_worker(&self, id: &JobId) {
        if let Some(handle) = self.workers.lock().get(id) {
            handle.cancel.cancel();
        }
    }

    pub async fn abort_job(&self, id: &JobId) -> SchedulerResult<()> {
        let record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| SchedulerError::JobNotRunning(id.to_string()))?;
        if !record.running_state.is_running() {
            return Err(SchedulerError::JobNotRunning(record.name));
        }
        let runnable = self
            .registry
            .get(&record.name)
            .ok_or_else(|| SchedulerError::JobNotRegistered(record.name.clone()))?;
        if !runnable.is_abortable() {
            return Err(SchedulerError::JobNotAbortable(record.name));
        }
        self.store.request_abort(id).await?;
        if runnable.is_remote() {
            if let Some(uri) = record.additional_data.get(additional_data_keys::REMOTE_JOB_URI) {
                runnable.stop(uri).await;
            }
        } else {
            self.cancel_worker(id);
        }
        Ok(())
    }

    /// §4.3 `shutdownJobs`: terminate every **local** RUNNING job owned by
    /// this host and mark it `FINISHED:FAILED`. A remote job's worker
    /// handle completes (and is tracked here) as soon as `execute` has
    /// posted the start request — its record intentionally stays RUNNING
    /// with ownership passed to the remote supervisor (§4.3.1, §4.4), so it
    /// must not be terminated here even though it shares this host tag.
    pub async fn shutdown_jobs(&self) -> SchedulerResult<()> {
        let handles: Vec<(JobId, WorkerHandle)> = {
            let mut workers = self.workers.lock();
            workers.drain().collect()
        };
        for (id, handle) in handles {
            handle.cancel.cancel();
            let _ = handle.join.await;
            if let Some(record) = self.store.find_by_id(&id).await? {
                let is_local = self.registry.get(&record.name).is_some_and(|r| !r.is_remote());
                if is_local && record.running_state.is_running() && record.host == self.host {
                    let now = self.clock.epoch_ms();
                    self.store
                        .mark_running_as_finished(
                            &record.name,
                            ResultCode::Failed,
                            Some("shutdownJobs called from executing host".to_string()),
                            now,
                        )
                        .await?;
                }
            }
        }
        Ok(())
    }

    fn dispatch_worker(&self, id: JobId, runnable: Arc<dyn Runnable>, name: String) {
        let cancel = CancellationToken::new();
        let store: Arc<dyn Store> = self.store.clone();
        let clock = self.clock.clone();
        let worker_cancel = cancel.clone();
        let join = tokio::spawn(async move {
            run_worker(store, runnable, id, name, clock, worker_cancel).await;
        });
        self.workers.lock().insert(id, WorkerHandle { cancel, join });
    }
}

/// One dispatched job's lifecycle (§4.3.1): `prepare` → `execute` →
/// `afterExecution`, with exceptions routed through `onException`.
async fn run_worker<C: Clock>(
    store: Arc<dyn Store>,
    runnable: Arc<dyn Runnable>,
    id: JobId,
    name: String,
    clock: C,
    cancel: CancellationToken,
) {
    let parameters =
        store.find_by_id(&id).await.ok().flatten().map(|r| r.parameters).unwrap_or_default();
    let ctx_clock = clock.clone();
    let ctx = JobContext::new(
        id,
        name.clone(),
        parameters,
        store.clone(),
        cancel,
        Arc::new(move || ctx_clock.epoch_ms()),
    );

    let mut terminal_error: Option<String> = None;
    let mut should_execute = false;

    match runnable.prepare(&ctx).await {
        Ok(proceed) => should_execute = proceed,
        Err(err) => {
            let outcome = runnable.on_exception(&ctx, &err, Phase::Prepare).await;
            if outcome == ExceptionOutcome::Terminal {
                terminal_error = Some(err.0);
            }
        }
    }

    let not_executed = !should_execute && terminal_error.is_none();

    if should_execute && terminal_error.is_none() {
        if let Err(err) = runnable.execute(&ctx).await {
            let outcome = runnable.on_exception(&ctx, &err, Phase::Execute).await;
            match outcome {
                ExceptionOutcome::Terminal => terminal_error = Some(err.0),
                ExceptionOutcome::Recovered => debug!(job = %name, "runnable recovered from execute error"),
            }
        }
    }

    runnable.after_execution(&ctx).await;

    if runnable.is_remote() {
        // Ownership of the terminal transition passes to the remote
        // supervisor (§4.4) once `execute` has posted the job; we only
        // resolve here if the job never got that far.
        if let Some(message) = terminal_error {
            let now = clock.epoch_ms();
            if let Err(err) = store
                .mark_running_as_finished(&name, ResultCode::Failed, Some(message), now)
                .await
            {
                warn!(job = %name, error = %err, "failed to record remote dispatch failure");
            }
        }
        return;
    }

    let now = clock.epoch_ms();
    let outcome = if ctx.abort_requested() {
        store.mark_running_as_finished(&name, ResultCode::Aborted, None, now).await
    } else if let Some(message) = terminal_error {
        store.mark_running_as_finished(&name, ResultCode::Failed, Some(message), now).await
    } else if not_executed {
        store.mark_running_as_finished(&name, ResultCode::NotExecuted, None, now).await
    } else {
        let code = ctx.result_code().unwrap_or(ResultCode::Successful);
        store.mark_running_as_finished(&name, code, None, now).await
    };

    if let Err(err) = outcome {
        warn!(job = %name, error = %err, "failed to record terminal job state");
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
