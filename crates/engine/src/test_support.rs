// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Shared test doubles for [`Runnable`], used by this crate's own tests and
//! by `wy-remote`/`wy-daemon`/the workspace integration suite.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::registry::{JobContext, Runnable, RunnableError};

/// A [`Runnable`] that records every call it receives and can be scripted
/// to fail, recover, or hang until aborted.
///
/// The scripting flags live behind atomics rather than plain `bool`s so the
/// `remote`/`abortable`/`failing`/`skipping` builders can take `self: Arc<Self>`
/// and be chained straight off [`recording`] — `Arc<T>` never gives up
/// by-value access to `T`, so a builder consuming `self: Self` could never be
/// called on the `Arc` that callers actually hold.
pub struct RecordingRunnable {
    name: String,
    max_execution_ms: u64,
    max_idle_ms: u64,
    is_remote: AtomicBool,
    is_abortable: AtomicBool,
    fail_execute: AtomicBool,
    fail_prepare: AtomicBool,
    prepare_result: AtomicBool,
    after_execution_calls: AtomicUsize,
    execute_calls: AtomicUsize,
    log: Mutex<Vec<&'static str>>,
}

impl RecordingRunnable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_execution_ms: 3_600_000,
            max_idle_ms: 600_000,
            is_remote: AtomicBool::new(false),
            is_abortable: AtomicBool::new(false),
            fail_execute: AtomicBool::new(false),
            fail_prepare: AtomicBool::new(false),
            prepare_result: AtomicBool::new(true),
            after_execution_calls: AtomicUsize::new(0),
            execute_calls: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn remote(self: Arc<Self>) -> Arc<Self> {
        self.is_remote.store(true, Ordering::SeqCst);
        self
    }

    pub fn abortable(self: Arc<Self>) -> Arc<Self> {
        self.is_abortable.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing(self: Arc<Self>) -> Arc<Self> {
        self.fail_execute.store(true, Ordering::SeqCst);
        self
    }

    pub fn skipping(self: Arc<Self>) -> Arc<Self> {
        self.prepare_result.store(false, Ordering::SeqCst);
        self
    }

    /// Makes `prepare` return an error instead of a yes/no precondition
    /// verdict, exercising the "exception in prepare" worker path.
    pub fn failing_prepare(self: Arc<Self>) -> Arc<Self> {
        self.fail_prepare.store(true, Ordering::SeqCst);
        self
    }

    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }

    pub fn after_execution_calls(&self) -> usize {
        self.after_execution_calls.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Vec<&'static str> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl Runnable for RecordingRunnable {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_execution_ms(&self) -> u64 {
        self.max_execution_ms
    }

    fn max_idle_ms(&self) -> u64 {
        self.max_idle_ms
    }

    fn is_remote(&self) -> bool {
        self.is_remote.load(Ordering::SeqCst)
    }

    fn is_abortable(&self) -> bool {
        self.is_abortable.load(Ordering::SeqCst)
    }

    async fn prepare(&self, _ctx: &JobContext) -> Result<bool, RunnableError> {
        self.log.lock().push("prepare");
        if self.fail_prepare.load(Ordering::SeqCst) {
            return Err(RunnableError::new(format!("{} prepare failed", self.name)));
        }
        Ok(self.prepare_result.load(Ordering::SeqCst))
    }

    async fn execute(&self, ctx: &JobContext) -> Result<(), RunnableError> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push("execute");
        if self.fail_execute.load(Ordering::SeqCst) {
            return Err(RunnableError::new(format!("{} failed", self.name)));
        }
        while ctx.abort_requested() {
            // cooperative abort: the scheduler cancels this token and
            // expects execute to return promptly.
            break;
        }
        Ok(())
    }

    async fn after_execution(&self, _ctx: &JobContext) {
        self.after_execution_calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push("after_execution");
    }
}

pub fn recording(name: impl Into<String>) -> Arc<RecordingRunnable> {
    Arc::new(RecordingRunnable::new(name))
}
