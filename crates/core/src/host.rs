// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Host and thread identity stamped onto RUNNING records.
//!
//! A `JobRecord`'s `host`/`thread` pair identifies the process (and, within
//! it, the worker) currently responsible for driving a RUNNING job. It is
//! set at `createUnique`/`activateQueuedJob` time and used by `shutdownJobs`
//! to decide which RUNNING records this process owns.

use std::sync::OnceLock;

/// Stable per-process host tag.
///
/// Computed once per process: `{hostname}:{pid}`. Falls back to `"unknown"`
/// if the hostname cannot be determined (e.g. a sandboxed test runner).
pub fn host_tag() -> &'static str {
    static TAG: OnceLock<String> = OnceLock::new();
    TAG.get_or_init(|| {
        let hostname = hostname_best_effort();
        format!("{}:{}", hostname, std::process::id())
    })
}

fn hostname_best_effort() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::env::var("COMPUTERNAME").ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Identifies the worker (tokio task) within this process driving a job.
///
/// Formatted as `worker-{n}` where `n` is a process-local monotonic counter;
/// purely diagnostic, never parsed.
pub fn thread_tag(worker_seq: u64) -> String {
    format!("worker-{worker_seq}")
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
