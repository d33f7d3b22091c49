// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Reads tar-packaged script bytes from a fixed filesystem path (§1: "tar
//! archive building itself is out of scope" — the daemon ships only the
//! simplest possible [`wy_remote::runnable::ScriptSource`], a static file).

use std::path::PathBuf;

use async_trait::async_trait;
use wy_engine::JobContext;
use wy_engine::RunnableError;
use wy_remote::runnable::ScriptSource;

pub struct FileScriptSource {
    path: PathBuf,
}

impl FileScriptSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ScriptSource for FileScriptSource {
    async fn load(&self, _ctx: &JobContext) -> Result<Vec<u8>, RunnableError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|err| RunnableError::new(format!("reading {}: {err}", self.path.display())))
    }
}
