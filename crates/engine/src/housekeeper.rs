// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Periodic timeout and retention sweep (§4.5).

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wy_core::{Clock, ResultCode};
use wy_store::{StateFilter, Store};

use crate::error::SchedulerResult;
use crate::scheduler::Scheduler;

/// Tunables for [`Housekeeper`] (§4.5). Defaults match the durable
/// retention window `SPEC_FULL.md` assumes for the default configuration.
#[derive(Debug, Clone, Copy)]
pub struct HousekeeperConfig {
    pub sweep_interval_ms: u64,
    pub finished_retention_ms: u64,
}

impl Default for HousekeeperConfig {
    fn default() -> Self {
        Self { sweep_interval_ms: 30_000, finished_retention_ms: 7 * 24 * 60 * 60 * 1000 }
    }
}

/// Drives the max-execution/max-idle timeout sweep and FINISHED-record
/// retention pruning from a periodic `tokio::task` loop (§4.5).
///
/// Holds the same [`Scheduler`] handle the API layer uses so that timing out
/// a RUNNING job can cancel its local worker task.
pub struct Housekeeper<S: Store, C: Clock> {
    scheduler: Arc<Scheduler<S, C>>,
    config: HousekeeperConfig,
}

impl<S: Store, C: Clock> Housekeeper<S, C> {
    pub fn new(scheduler: Arc<Scheduler<S, C>>, config: HousekeeperConfig) -> Self {
        Self { scheduler, config }
    }

    /// One sweep pass: timeouts, then retention. Exposed standalone so
    /// tests can drive a single pass deterministically against a
    /// [`wy_core::FakeClock`] instead of waiting on a real interval.
    pub async fn sweep_once(&self) -> SchedulerResult<()> {
        self.sweep_timeouts().await?;
        self.sweep_retention().await?;
        Ok(())
    }

    async fn sweep_timeouts(&self) -> SchedulerResult<()> {
        let now = self.scheduler.clock().epoch_ms();
        for name in self.scheduler.registry().names() {
            let Some(record) =
                self.scheduler.store().find_by_name_and_state(&name, StateFilter::Running).await?
            else {
                continue;
            };

            let max_execution_hit = record
                .started_at_ms
                .map(|started| now.saturating_sub(started) > record.max_execution_ms)
                .unwrap_or(false);
            let max_idle_hit = now.saturating_sub(record.last_modified_at_ms) > record.max_idle_ms;

            if max_execution_hit || max_idle_hit {
                debug!(
                    job = %record.name,
                    id = %record.id,
                    max_execution_hit,
                    max_idle_hit,
                    "timing out running job"
                );
                self.scheduler.cancel_worker(&record.id);
                self.scheduler
                    .store()
                    .mark_running_as_finished(&record.name, ResultCode::TimedOut, None, now)
                    .await?;
            }
        }
        Ok(())
    }

    /// §4.5: prunes FINISHED records beyond `finished_retention_ms`. Gated
    /// on `finished_at_ms`, not `created_at_ms` — a long-running job created
    /// before the cutoff but finished within the retention window must
    /// survive the sweep.
    async fn sweep_retention(&self) -> SchedulerResult<()> {
        let now = self.scheduler.clock().epoch_ms();
        let cutoff = now.saturating_sub(self.config.finished_retention_ms);
        for name in self.scheduler.registry().names() {
            let records = self.scheduler.store().find_by_name(&name, usize::MAX).await?;
            for record in records {
                let aged = record.finished_at_ms.is_some_and(|finished_at| finished_at <= cutoff);
                if !aged {
                    continue;
                }
                self.scheduler.store().remove(&record.id).await?;
            }
        }
        Ok(())
    }
}

impl<S: Store, C: Clock> Housekeeper<S, C> {
    /// Spawns the periodic sweep loop on a dedicated `tokio::task`. Returns
    /// a handle plus a token the caller can cancel to stop the loop
    /// cooperatively (checked between ticks).
    pub fn spawn(self: Arc<Self>) -> (JoinHandle<()>, CancellationToken) {
        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        let interval_ms = self.config.sweep_interval_ms.max(1);
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = self.sweep_once().await {
                            warn!(error = %err, "housekeeper sweep failed");
                        }
                    }
                }
            }
        });
        (join, cancel)
    }
}

#[cfg(test)]
#[path = "housekeeper_tests.rs"]
mod tests;
