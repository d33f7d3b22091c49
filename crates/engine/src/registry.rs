// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Runnable registry (§4.2): the in-process mapping from job name to its
//! behavior, kept apart from the durable [`wy_core::JobDefinition`] so that
//! lookup is always by name (§9 Design Note: "Cyclic references in domain
//! objects").
//!
//! Modeled as a flat capability struct rather than a trait-object
//! inheritance hierarchy (§9 Design Note: "Dynamic dispatch on runnable"):
//! `prepare`/`execute`/`after_execution`/`on_exception` are `async_trait`
//! methods on [`Runnable`], one adapter trait covering the whole job
//! lifecycle rather than several narrower ones.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use wy_core::{JobId, OrderedMap};
use wy_store::Store;

/// The phase a [`Runnable`] exception originated in, passed to
/// [`Runnable::on_exception`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prepare,
    Execute,
}

/// Tagged result from `onException` (§9 Design Note): avoids a
/// callback-with-mutation API in favor of an explicit returned verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionOutcome {
    /// The runnable recovered; the worker should continue as if nothing
    /// happened.
    Recovered,
    /// The runnable could not recover; surface as a terminal failure.
    Terminal,
}

/// An error raised by a [`Runnable`] phase. Carries only a message — the
/// scheduler only needs the text for `resultMessage` (§4.3.1).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct RunnableError(pub String);

impl RunnableError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Per-execution context handed to every [`Runnable`] hook.
///
/// Gives the runnable just enough to talk back to the store (log lines,
/// additional data) and to observe cooperative cancellation — it never
/// sees the scheduler or the registry.
pub struct JobContext {
    pub id: JobId,
    pub name: String,
    pub parameters: OrderedMap,
    store: Arc<dyn Store>,
    cancel: CancellationToken,
    result_code: parking_lot::Mutex<Option<wy_core::ResultCode>>,
    epoch_ms: Arc<dyn Fn() -> u64 + Send + Sync>,
}

impl JobContext {
    pub fn new(
        id: JobId,
        name: impl Into<String>,
        parameters: OrderedMap,
        store: Arc<dyn Store>,
        cancel: CancellationToken,
        epoch_ms: Arc<dyn Fn() -> u64 + Send + Sync>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            parameters,
            store,
            cancel,
            result_code: parking_lot::Mutex::new(None),
            epoch_ms,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Current wall time as seen by this job's scheduler `Clock` — lets a
    /// [`Runnable`] timestamp `additionalData`/log-line writes without
    /// depending on a concrete `Clock` type itself.
    pub fn now_ms(&self) -> u64 {
        (self.epoch_ms)()
    }

    /// Whether `abortJob` (or `shutdownJobs`) has requested cancellation.
    /// Cooperative: the runnable is expected to poll this inside `execute`.
    pub fn abort_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Lets `execute` override the default `SUCCESSFUL` result code on a
    /// clean return (§4.3.1: "`FINISHED:<ctx.resultCode ?? SUCCESSFUL>`").
    pub fn set_result_code(&self, code: wy_core::ResultCode) {
        *self.result_code.lock() = Some(code);
    }

    pub fn result_code(&self) -> Option<wy_core::ResultCode> {
        *self.result_code.lock()
    }
}

/// Status of a remote job, returned by [`Runnable::get_remote_status`]
/// (§4.4). `None` (a transient fetch error, or the remote not yet ready) is
/// represented by the caller as `Ok(None)` rather than a variant here — see
/// `wy-remote::RemoteClient::poll_status`.
#[derive(Debug, Clone)]
pub enum RemoteStatus {
    Running { log_lines: Vec<String>, message: Option<String> },
    Finished { ok: bool, exit_code: Option<i64>, message: Option<String> },
}

/// The in-process embodiment of a job's behavior (§4.2, §9).
#[async_trait]
pub trait Runnable: Send + Sync {
    fn name(&self) -> &str;

    fn max_execution_ms(&self) -> u64 {
        3_600_000
    }

    fn max_idle_ms(&self) -> u64 {
        600_000
    }

    fn polling_interval_ms(&self) -> u64 {
        10_000
    }

    fn is_remote(&self) -> bool {
        false
    }

    fn is_abortable(&self) -> bool {
        false
    }

    /// Returning `false` skips `execute` (but `after_execution` still runs).
    async fn prepare(&self, ctx: &JobContext) -> Result<bool, RunnableError> {
        let _ = ctx;
        Ok(true)
    }

    async fn execute(&self, ctx: &JobContext) -> Result<(), RunnableError>;

    async fn after_execution(&self, ctx: &JobContext) {
        let _ = ctx;
    }

    /// Default: rethrow (`Terminal`) — matches §4.3.1's stated default.
    async fn on_exception(
        &self,
        ctx: &JobContext,
        error: &RunnableError,
        phase: Phase,
    ) -> ExceptionOutcome {
        let _ = (ctx, error, phase);
        ExceptionOutcome::Terminal
    }

    /// Only consulted when [`Runnable::is_remote`] is `true`; the remote
    /// supervisor calls this to translate a raw HTTP status payload.
    async fn get_remote_status(&self, _remote_job_uri: &str) -> Option<RemoteStatus> {
        None
    }

    /// Cancels a remote job via the remote executor's stop endpoint (§5:
    /// "Remote jobs are cancelled via the remote executor's stop endpoint
    /// when the runnable's `stop` is invoked"). A no-op for local runnables.
    async fn stop(&self, _remote_job_uri: &str) {}
}

/// Failure returned by [`Registry::register`] when `name` is already
/// registered (§4.2: "re-registration under the same name is rejected").
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("job '{0}' is already registered")]
pub struct AlreadyRegistered(pub String);

/// Per-process mapping from job name to its [`Runnable`] (§4.2).
///
/// A `parking_lot::RwLock<HashMap<..>>` with `Arc<dyn Runnable>` values: a
/// reader clones the `Arc` and releases the lock immediately, satisfying
/// §5's "lock-free against a concurrent snapshot" requirement.
#[derive(Default, Clone)]
pub struct Registry {
    runnables: Arc<RwLock<HashMap<String, Arc<dyn Runnable>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent by name is NOT supported here (§4.2: "re-registration
    /// under the same name is rejected") — the scheduler surfaces
    /// `AlreadyRegistered` rather than silently overwriting.
    pub fn register(&self, runnable: Arc<dyn Runnable>) -> Result<(), AlreadyRegistered> {
        let mut map = self.runnables.write();
        if map.contains_key(runnable.name()) {
            return Err(AlreadyRegistered(runnable.name().to_string()));
        }
        map.insert(runnable.name().to_string(), runnable);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Runnable>> {
        self.runnables.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.runnables.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.runnables.read().keys().cloned().collect()
    }

    /// Snapshot of every registered remote runnable, for the remote
    /// supervisor's poll cycle (§4.4).
    pub fn remote_runnables(&self) -> Vec<Arc<dyn Runnable>> {
        self.runnables.read().values().filter(|r| r.is_remote()).cloned().collect()
    }

    /// Removes every registration. Used by tests that need a clean
    /// registry between scheduler instances (§9: "support multiple
    /// scheduler instances against the same store for testing").
    pub fn clear(&self) {
        self.runnables.write().clear();
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
