// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! §4.1: tunables the store needs that aren't part of the domain model.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Cap applied to `logLines` by `appendLogLine`/`setLogLines`.
    pub max_log_lines: usize,
    /// Directory holding `wal.log` and `state.snap`.
    pub data_dir: PathBuf,
    /// Snapshot + WAL truncation cadence.
    pub checkpoint_every_ops: u64,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            max_log_lines: 100,
            data_dir: data_dir.into(),
            checkpoint_every_ops: 500,
        }
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("wal.log")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("state.snap")
    }
}
