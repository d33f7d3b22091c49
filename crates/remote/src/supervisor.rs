// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Periodic poll cycle reconciling RUNNING remote records against the
//! executor's reported status (§4.4).

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wy_core::{additional_data_keys, Clock, LogLine, ResultCode};
use wy_engine::{RemoteStatus, Scheduler};
use wy_store::{StateFilter, Store};

/// Drives [`Supervisor::poll_once`] from a dedicated `tokio::task`, ticking
/// at `tick_interval_ms` — the minimum across every registered remote job's
/// own `pollingIntervalMs` is the natural choice, since each job's
/// `lastModifiedAt` staleness check (below) enforces its own cadence
/// regardless of how often the outer loop wakes up.
pub struct Supervisor<S: Store, C: Clock> {
    scheduler: Arc<Scheduler<S, C>>,
    tick_interval_ms: u64,
}

impl<S: Store, C: Clock> Supervisor<S, C> {
    pub fn new(scheduler: Arc<Scheduler<S, C>>, tick_interval_ms: u64) -> Self {
        Self { scheduler, tick_interval_ms: tick_interval_ms.max(1) }
    }

    /// One poll cycle (§4.4 `pollRemoteJobs`). A no-op when global execution
    /// is disabled.
    pub async fn poll_once(&self) -> wy_engine::SchedulerResult<()> {
        if !self.scheduler.execution_enabled() {
            return Ok(());
        }

        for runnable in self.scheduler.registry().remote_runnables() {
            let name = runnable.name().to_string();
            let Some(record) =
                self.scheduler.store().find_by_name_and_state(&name, StateFilter::Running).await?
            else {
                continue;
            };

            let now = self.scheduler.clock().epoch_ms();
            let elapsed = now.saturating_sub(record.last_modified_at_ms);
            if elapsed < runnable.polling_interval_ms() {
                continue;
            }

            let Some(job_uri) =
                record.additional_data.get(additional_data_keys::REMOTE_JOB_URI).cloned()
            else {
                // `execute` hasn't stored a URI yet (still in flight, or the
                // start request itself failed before posting); nothing to
                // poll this cycle.
                continue;
            };

            // Null or transient errors are ignored until the next cycle
            // (§4.4): the record stays RUNNING and the housekeeper will
            // eventually time it out.
            let Some(status) = runnable.get_remote_status(&job_uri).await else {
                continue;
            };

            match status {
                RemoteStatus::Running { log_lines, message } => {
                    let lines: Vec<LogLine> =
                        log_lines.into_iter().map(|text| LogLine::new(now, text)).collect();
                    self.scheduler.store().set_log_lines(&name, lines, now).await?;
                    self.scheduler.store().set_status_message(&name, message, now).await?;
                }
                RemoteStatus::Finished { ok, exit_code, message } => {
                    if ok {
                        debug!(job = %name, "remote job finished successfully");
                        self.scheduler
                            .store()
                            .mark_running_as_finished_successfully(&name, now)
                            .await?;
                    } else {
                        if let Some(exit_code) = exit_code {
                            self.scheduler
                                .store()
                                .add_additional_data(
                                    &name,
                                    additional_data_keys::EXIT_CODE.to_string(),
                                    exit_code.to_string(),
                                    now,
                                )
                                .await?;
                        }
                        warn!(job = %name, ?exit_code, "remote job finished with failure");
                        self.scheduler
                            .store()
                            .mark_running_as_finished(&name, ResultCode::Failed, message, now)
                            .await?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Spawns the periodic poll loop. Returns a handle plus a token the
    /// caller can cancel to stop the loop cooperatively between ticks.
    pub fn spawn(self: Arc<Self>) -> (JoinHandle<()>, CancellationToken) {
        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        let interval_ms = self.tick_interval_ms;
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = self.poll_once().await {
                            warn!(error = %err, "remote supervisor poll cycle failed");
                        }
                    }
                }
            }
        });
        (join, cancel)
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
