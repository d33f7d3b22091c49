// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! HTTP client for the remote-executor protocol (§6.2).
//!
//! Built on `reqwest`'s `json` and `multipart` features, which cover the
//! multipart POST / JSON GET / `201`+`Link`-header call shapes directly.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use wy_core::OrderedMap;
use wy_engine::RemoteStatus;

use crate::dto::{RemoteStatusDto, StartParams};
use crate::error::{RemoteError, RemoteResult};

/// Connect timeout for every remote-executor call (§5: "~5 s").
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Overall request timeout for every remote-executor call (§5: "~20 s").
pub const READ_TIMEOUT: Duration = Duration::from_secs(20);

/// Outcome of a successful start request (§6.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    pub job_uri: String,
}

/// Thin wrapper over a shared `reqwest::Client` implementing the start /
/// status / stop / liveness calls of §6.2.
#[derive(Clone)]
pub struct RemoteClient {
    http: Client,
}

impl RemoteClient {
    pub fn new() -> Self {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http }
    }

    /// `POST <baseUri>/<name>/start` with a multipart `scripts`/`params`
    /// body (§6.2). `201 Created` with a `Link:` header is success; `200`
    /// or `303` with a `Link:` header means the job is already running —
    /// surfaced as [`RemoteError::AlreadyRunning`] carrying the resumable
    /// URI (§7).
    pub async fn start_job(
        &self,
        base_uri: &str,
        name: &str,
        id: &str,
        parameters: &OrderedMap,
        scripts_tar_gz: Vec<u8>,
    ) -> RemoteResult<Started> {
        let params = StartParams { name, id, parameters };
        let params_json = serde_json::to_vec(&params)
            .map_err(|e| RemoteError::JobExecutionException(e.to_string()))?;

        let scripts_part = reqwest::multipart::Part::bytes(scripts_tar_gz)
            .file_name("scripts.tar.gz")
            .mime_str("application/octet-stream")
            .map_err(|e| RemoteError::JobExecutionException(e.to_string()))?;
        let params_part = reqwest::multipart::Part::bytes(params_json)
            .mime_str("application/json; charset=UTF-8")
            .map_err(|e| RemoteError::JobExecutionException(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("scripts", scripts_part).part("params", params_part);

        let url = format!("{}/{}/start", base_uri.trim_end_matches('/'), name);
        let response = self.http.post(&url).multipart(form).send().await?;
        let status = response.status();
        let link = link_header(response.headers());

        match status {
            StatusCode::CREATED => {
                let job_uri = link.ok_or(RemoteError::MissingLinkHeader(status.as_u16()))?;
                debug!(job = %name, %job_uri, "remote job started");
                Ok(Started { job_uri })
            }
            StatusCode::OK | StatusCode::SEE_OTHER => {
                let job_uri = link.ok_or(RemoteError::MissingLinkHeader(status.as_u16()))?;
                Err(RemoteError::AlreadyRunning { job_uri })
            }
            other => {
                let body = response.text().await.unwrap_or_default();
                Err(RemoteError::JobExecutionException(format!("start returned {other}: {body}")))
            }
        }
    }

    /// `GET <jobUri>` (§4.4, §6.2). Transport/decode failures are returned
    /// as `Err` here; the caller (the supervisor poll cycle) is the layer
    /// responsible for swallowing them per-cycle (§7: "Remote status errors
    /// are swallowed per cycle").
    pub async fn poll_status(&self, job_uri: &str) -> RemoteResult<RemoteStatus> {
        let response = self.http.get(job_uri).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::JobExecutionException(format!(
                "status GET returned {}",
                response.status()
            )));
        }
        let dto: RemoteStatusDto = response.json().await?;
        Ok(match dto {
            RemoteStatusDto::Running { log_lines, message } => {
                RemoteStatus::Running { log_lines, message }
            }
            RemoteStatusDto::Finished { result } => RemoteStatus::Finished {
                ok: result.ok,
                exit_code: result.exit_code,
                message: result.message,
            },
        })
    }

    /// `POST <jobUri>/stop` (§6.2). A `403` means the remote considers the
    /// job already not-running — treated as a no-op, not an error (§5:
    /// "a `403` from the remote maps to \"not running\" (no-op)").
    pub async fn stop_job(&self, job_uri: &str) -> RemoteResult<()> {
        let url = format!("{}/stop", job_uri.trim_end_matches('/'));
        let response = self.http.post(&url).send().await?;
        match response.status() {
            StatusCode::FORBIDDEN => Ok(()),
            status if status.is_success() => Ok(()),
            other => {
                warn!(%job_uri, status = %other, "unexpected status stopping remote job");
                Ok(())
            }
        }
    }

    /// `GET <baseUri>` liveness probe (§6.2). Never errors — a dead
    /// executor is just `false`.
    pub async fn is_alive(&self, base_uri: &str) -> bool {
        match self.http.get(base_uri).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

impl Default for RemoteClient {
    fn default() -> Self {
        Self::new()
    }
}

fn link_header(headers: &reqwest::header::HeaderMap) -> Option<String> {
    let raw = headers.get(reqwest::header::LINK)?.to_str().ok()?;
    // `<uri>` or `<uri>; rel="self"` — §6.2 only promises the URI is present.
    let trimmed = raw.split(';').next().unwrap_or(raw).trim();
    Some(trimmed.trim_start_matches('<').trim_end_matches('>').to_string())
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
