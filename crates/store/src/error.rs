// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Store-level errors.
//!
//! §4.1: "uniqueness violation ⇒ insert returns `null` (not an error).
//! Storage unavailability propagates as a transient error to callers." —
//! [`StoreError`] models the latter only; uniqueness collisions are plain
//! `None`/`false` return values on the [`crate::Store`] trait.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("wal io error: {0}")]
    WalIo(#[from] std::io::Error),

    #[error("wal serialization error: {0}")]
    WalSerde(#[from] serde_json::Error),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
