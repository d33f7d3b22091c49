// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Shared `.bak` rotation for the WAL and snapshot files.

use std::fs;
use std::path::{Path, PathBuf};

const MAX_BAK_FILES: u8 = 3;

/// Shifts `path.bak`, `path.bak.2`, ... down one generation (dropping
/// anything past [`MAX_BAK_FILES`]), then moves `path` itself to
/// `path.bak`.
pub(crate) fn rotate_bak(path: &Path) -> std::io::Result<()> {
    for generation in (1..MAX_BAK_FILES).rev() {
        let from = bak_path(path, generation);
        let to = bak_path(path, generation + 1);
        if from.exists() {
            fs::rename(from, to)?;
        }
    }
    fs::rename(path, bak_path(path, 1))
}

fn bak_path(path: &Path, generation: u8) -> PathBuf {
    if generation <= 1 {
        path.with_extension("bak")
    } else {
        path.with_extension(format!("bak.{generation}"))
    }
}
