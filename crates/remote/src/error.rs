// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Remote-executor error taxonomy (§7, §6.2).

use thiserror::Error;

/// Failures surfaced by [`crate::client::RemoteClient`] (§7).
///
/// `AlreadyRunning` is not a dead end: per §6.2 a `200`/`303` response to a
/// start request carries a `Link:` header the caller should use to resume
/// supervision of the job that is already running remotely.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote job is already running at {job_uri}")]
    AlreadyRunning { job_uri: String },

    #[error("remote job is not running")]
    NotRunning,

    #[error("remote executor rejected the start request: {0}")]
    JobExecutionException(String),

    #[error("missing Link header on a {0} response")]
    MissingLinkHeader(u16),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

pub type RemoteResult<T> = Result<T, RemoteError>;
