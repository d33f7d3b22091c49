// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Startup sequencing and graceful shutdown for the daemon binary.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;
use wy_core::JobDefinition;
use wy_engine::{Housekeeper, HousekeeperConfig, Scheduler};
use wy_remote::{RemoteJobRunnable, Supervisor};
use wy_store::{MemStore, Store, StoreConfig};

use crate::config::{Config, JobSeed};
use crate::scripts::FileScriptSource;

/// Everything spawned at startup that needs to be torn down on shutdown.
pub struct Daemon {
    pub scheduler: Arc<Scheduler<MemStore>>,
    housekeeper_handle: tokio::task::JoinHandle<()>,
    housekeeper_cancel: CancellationToken,
    supervisor_handle: tokio::task::JoinHandle<()>,
    supervisor_cancel: CancellationToken,
}

impl Daemon {
    /// Opens the store, builds the scheduler, registers every job seeded
    /// from `config.jobs_file` (if set), and spawns the housekeeper and
    /// remote supervisor background loops.
    pub async fn start(config: &Config) -> Result<Self> {
        let store = Arc::new(
            MemStore::open(StoreConfig {
                data_dir: config.state_dir.clone(),
                max_log_lines: config.max_log_lines,
                checkpoint_every_ops: config.checkpoint_every_ops,
            })
            .context("opening job store")?,
        );
        let scheduler = Arc::new(Scheduler::new(store));

        if let Some(path) = &config.jobs_file {
            let seeds = crate::config::load_job_seeds(path)
                .with_context(|| format!("loading job seeds from {}", path.display()))?;
            for seed in seeds.jobs {
                register_seed(&scheduler, seed).await?;
            }
        }

        let housekeeper = Arc::new(Housekeeper::new(
            scheduler.clone(),
            HousekeeperConfig {
                sweep_interval_ms: config.housekeeper_sweep_interval_ms,
                finished_retention_ms: config.finished_retention_ms,
            },
        ));
        let (housekeeper_handle, housekeeper_cancel) = housekeeper.spawn();

        let supervisor =
            Arc::new(Supervisor::new(scheduler.clone(), config.supervisor_tick_interval_ms));
        let (supervisor_handle, supervisor_cancel) = supervisor.spawn();

        info!(bind_addr = %config.bind_addr, state_dir = %config.state_dir.display(), "daemon started");

        Ok(Self { scheduler, housekeeper_handle, housekeeper_cancel, supervisor_handle, supervisor_cancel })
    }

    /// Stops background loops, then drains in-flight local jobs (§4.3
    /// shutdown semantics) within the configured drain timeout.
    pub async fn shutdown(self) -> Result<()> {
        self.housekeeper_cancel.cancel();
        self.supervisor_cancel.cancel();
        let _ = self.housekeeper_handle.await;
        let _ = self.supervisor_handle.await;

        let drain = crate::config::drain_timeout();
        match tokio::time::timeout(drain, self.scheduler.shutdown_jobs()).await {
            Ok(result) => result.context("draining running jobs")?,
            Err(_) => {
                tracing::warn!(timeout_ms = drain.as_millis(), "shutdown drain timed out");
            }
        }
        Ok(())
    }
}

async fn register_seed(scheduler: &Arc<Scheduler<MemStore>>, seed: JobSeed) -> Result<()> {
    let definition = JobDefinition {
        name: seed.name.clone(),
        disabled: seed.disabled,
        last_not_executed_at_ms: None,
        max_execution_ms: seed.max_execution_ms,
        max_idle_ms: seed.max_idle_ms,
        polling_interval_ms: seed.polling_interval_ms,
        is_remote: true,
        is_abortable: seed.abortable,
    };
    scheduler
        .store()
        .upsert_definition(definition)
        .await
        .with_context(|| format!("persisting definition for seeded job '{}'", seed.name))?;

    let scripts = Box::new(FileScriptSource::new(seed.script_path.clone()));
    let mut runnable = RemoteJobRunnable::new(seed.name.clone(), seed.remote_base_uri, scripts)
        .max_execution_ms(seed.max_execution_ms)
        .max_idle_ms(seed.max_idle_ms)
        .polling_interval_ms(seed.polling_interval_ms);
    if seed.abortable {
        runnable = runnable.abortable();
    }
    scheduler
        .register_job(Arc::new(runnable))
        .with_context(|| format!("registering seeded job '{}'", seed.name))?;
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
