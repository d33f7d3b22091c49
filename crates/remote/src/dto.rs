// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! JSON shapes exchanged with the remote executor (§6.2). Distinct from
//! `wy-wire`'s HTTP/Atom DTOs — this is the executor-facing wire format,
//! not the service's own API surface.

use serde::{Deserialize, Serialize};
use wy_core::OrderedMap;

/// Body of the `params` multipart part on a start request.
#[derive(Debug, Clone, Serialize)]
pub struct StartParams<'a> {
    pub name: &'a str,
    pub id: &'a str,
    pub parameters: &'a OrderedMap,
}

/// Raw JSON shape of a status GET response, deserialized then converted to
/// [`wy_engine::RemoteStatus`] by [`crate::client::RemoteClient`].
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteStatusDto {
    Running {
        #[serde(default, rename = "logLines")]
        log_lines: Vec<String>,
        #[serde(default)]
        message: Option<String>,
    },
    Finished {
        result: RemoteJobResultDto,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteJobResultDto {
    pub ok: bool,
    #[serde(default, rename = "exitCode")]
    pub exit_code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}
