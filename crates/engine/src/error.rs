// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Scheduler-facing error taxonomy (§7).

use thiserror::Error;

use crate::registry::AlreadyRegistered;

/// Failures surfaced by [`crate::scheduler::Scheduler`] operations.
///
/// Each variant maps to a specific HTTP status in the daemon's API layer
/// (§7): `JobNotRegistered` and `JobAlreadyRunning`/`JobAlreadyQueued` are
/// client errors (404/409), `JobServiceNotActive` and `Store` are server
/// errors (503/500).
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("no runnable registered for job '{0}'")]
    JobNotRegistered(String),

    #[error("job '{0}' is already registered")]
    JobAlreadyRegistered(#[from] AlreadyRegistered),

    #[error("job '{0}' is already queued")]
    JobAlreadyQueued(String),

    #[error("job '{0}' is already running")]
    JobAlreadyRunning(String),

    #[error("job '{0}' does not need to execute right now")]
    JobExecutionNotNecessary(String),

    #[error("job '{0}' is disabled")]
    JobExecutionDisabled(String),

    #[error("job execution is globally disabled")]
    JobServiceNotActive,

    #[error("job '{0}' is not currently running")]
    JobNotRunning(String),

    #[error("job '{0}' is not abortable")]
    JobNotAbortable(String),

    #[error(transparent)]
    Store(#[from] wy_store::StoreError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
