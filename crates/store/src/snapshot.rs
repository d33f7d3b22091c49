// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Point-in-time, zstd-compressed snapshots of [`crate::state::MaterializedState`].
//!
//! Recovery loads the newest readable snapshot and replays WAL entries
//! with `seq > snapshot.seq` on top of it (§4.1 durability notes).

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backup::rotate_bak;
use crate::error::StoreResult;
use crate::state::MaterializedState;

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "v")]
    pub version: u32,
    pub seq: u64,
    pub state: MaterializedState,
    pub created_at_ms: u64,
}

impl Snapshot {
    pub fn new(seq: u64, state: MaterializedState, created_at_ms: u64) -> Self {
        Self {
            version: CURRENT_SNAPSHOT_VERSION,
            seq,
            state,
            created_at_ms,
        }
    }
}

/// Serializes `snapshot` as zstd-compressed JSON and writes it atomically
/// (write to a sibling temp file, then rename). If a snapshot already
/// exists at `path` and fails to be overwritten cleanly, it is preserved
/// under `.bak` first.
pub fn save_snapshot(path: impl AsRef<Path>, snapshot: &Snapshot) -> StoreResult<()> {
    let path = path.as_ref();
    let json = serde_json::to_vec(snapshot)?;
    let compressed = zstd::encode_all(json.as_slice(), 0)
        .map_err(|e| crate::error::StoreError::Snapshot(e.to_string()))?;

    let tmp_path = path.with_extension("tmp");
    {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(&compressed)?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Loads the snapshot at `path`, or `None` if it doesn't exist yet. A
/// snapshot that fails to decompress or parse is rotated to `.bak` and
/// treated as absent, so the caller falls back to replaying the WAL from
/// the start.
pub fn load_snapshot(path: impl AsRef<Path>) -> StoreResult<Option<Snapshot>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let compressed = fs::read(path)?;
    match decode_snapshot(&compressed) {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(_) => {
            rotate_bak(path)?;
            Ok(None)
        }
    }
}

fn decode_snapshot(compressed: &[u8]) -> StoreResult<Snapshot> {
    let json = zstd::decode_all(compressed)
        .map_err(|e| crate::error::StoreError::Snapshot(e.to_string()))?;
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
