// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Shared application state handed to every axum handler.

use std::sync::Arc;

use wy_engine::Scheduler;
use wy_store::MemStore;

use crate::config::Config;

/// Cheaply `Clone`-able: axum extracts one copy per request, but the
/// `Arc<Scheduler<_>>` inside is the only thing that matters — cloning the
/// handle is free.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler<MemStore>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(scheduler: Arc<Scheduler<MemStore>>, config: Arc<Config>) -> Self {
        Self { scheduler, config }
    }
}
