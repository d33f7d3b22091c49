// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! A ready-made [`Runnable`] for jobs executed on an external worker host
//! (§4.3.1, §6.2).
//!
//! `execute` posts the job to the remote executor and stores the returned
//! URI under `additionalData[remoteJobUri]`; ownership of the terminal
//! state transition then passes to [`crate::supervisor::Supervisor`] (§4.4).

use async_trait::async_trait;
use tracing::{debug, warn};
use wy_core::additional_data_keys;
use wy_engine::{JobContext, RemoteStatus, Runnable, RunnableError};

use crate::client::RemoteClient;
use crate::error::RemoteError;

/// Supplies the tar-packaged script bytes for one execution attempt.
///
/// §1 scopes tar-building itself out: callers hand over already-built
/// bytes. Boxed as a trait (rather than a plain closure type) so
/// implementations can read from disk, a cache, or build the archive
/// on demand without `RemoteJobRunnable` caring which.
#[async_trait]
pub trait ScriptSource: Send + Sync {
    async fn load(&self, ctx: &JobContext) -> Result<Vec<u8>, RunnableError>;
}

/// A [`Runnable`] whose actual work happens on a remote executor reachable
/// over HTTP (§6.2). One instance is registered per remote job name.
pub struct RemoteJobRunnable {
    name: String,
    base_uri: String,
    max_execution_ms: u64,
    max_idle_ms: u64,
    polling_interval_ms: u64,
    is_abortable: bool,
    client: RemoteClient,
    scripts: Box<dyn ScriptSource>,
}

impl RemoteJobRunnable {
    pub fn new(
        name: impl Into<String>,
        base_uri: impl Into<String>,
        scripts: Box<dyn ScriptSource>,
    ) -> Self {
        Self {
            name: name.into(),
            base_uri: base_uri.into(),
            max_execution_ms: 3_600_000,
            max_idle_ms: 600_000,
            polling_interval_ms: 10_000,
            is_abortable: false,
            client: RemoteClient::new(),
            scripts,
        }
    }

    pub fn max_execution_ms(mut self, ms: u64) -> Self {
        self.max_execution_ms = ms;
        self
    }

    pub fn max_idle_ms(mut self, ms: u64) -> Self {
        self.max_idle_ms = ms;
        self
    }

    pub fn polling_interval_ms(mut self, ms: u64) -> Self {
        self.polling_interval_ms = ms;
        self
    }

    pub fn abortable(mut self) -> Self {
        self.is_abortable = true;
        self
    }

    async fn record_remote_job_uri(&self, ctx: &JobContext, job_uri: &str) {
        let now = ctx.now_ms();
        if let Err(err) = ctx
            .store()
            .add_additional_data(
                &ctx.name,
                additional_data_keys::REMOTE_JOB_URI.to_string(),
                job_uri.to_string(),
                now,
            )
            .await
        {
            warn!(job = %ctx.name, error = %err, "failed to record remote job uri");
        }
    }
}

#[async_trait]
impl Runnable for RemoteJobRunnable {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_execution_ms(&self) -> u64 {
        self.max_execution_ms
    }

    fn max_idle_ms(&self) -> u64 {
        self.max_idle_ms
    }

    fn polling_interval_ms(&self) -> u64 {
        self.polling_interval_ms
    }

    fn is_remote(&self) -> bool {
        true
    }

    fn is_abortable(&self) -> bool {
        self.is_abortable
    }

    /// Posts to `<baseUri>/<name>/start` (§6.2). A `201` records the fresh
    /// URI; a `200`/`303` "already running" response resumes supervision of
    /// the existing remote job instead of treating it as a failure (§7:
    /// "`RemoteJobAlreadyRunning` ... carries the resumed URI").
    async fn execute(&self, ctx: &JobContext) -> Result<(), RunnableError> {
        let scripts = self.scripts.load(ctx).await?;
        match self
            .client
            .start_job(&self.base_uri, &self.name, ctx.id.as_str(), &ctx.parameters, scripts)
            .await
        {
            Ok(started) => {
                self.record_remote_job_uri(ctx, &started.job_uri).await;
                Ok(())
            }
            Err(RemoteError::AlreadyRunning { job_uri }) => {
                debug!(job = %self.name, %job_uri, "resuming already-running remote job");
                self.record_remote_job_uri(ctx, &job_uri).await;
                Ok(())
            }
            Err(err) => Err(RunnableError::new(err.to_string())),
        }
    }

    /// `GET <remoteJobUri>` (§4.4). Transport/decode failures are swallowed
    /// to `None` here — per §7 the supervisor leaves the record RUNNING and
    /// relies on the housekeeper's timeouts rather than surfacing a poll
    /// failure as terminal.
    async fn get_remote_status(&self, remote_job_uri: &str) -> Option<RemoteStatus> {
        match self.client.poll_status(remote_job_uri).await {
            Ok(status) => Some(status),
            Err(err) => {
                debug!(job = %self.name, %remote_job_uri, error = %err, "remote status poll failed");
                None
            }
        }
    }

    /// `POST <remoteJobUri>/stop` (§6.2); a `403` is a no-op (§5).
    async fn stop(&self, remote_job_uri: &str) {
        if let Err(err) = self.client.stop_job(remote_job_uri).await {
            warn!(job = %self.name, %remote_job_uri, error = %err, "failed to stop remote job");
        }
    }
}

#[cfg(test)]
#[path = "runnable_tests.rs"]
mod tests;
