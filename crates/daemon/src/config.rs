// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Centralized environment variable access and static job seeding for the
//! daemon binary: each setting is a one-line env lookup with a documented
//! default (`state_dir`, `ipc_timeout`, ...).

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot resolve a state directory: set WY_STATE_DIR or HOME")]
    NoStateDir,

    #[error("failed to read job definitions file {path}: {source}")]
    ReadJobsFile { path: PathBuf, source: std::io::Error },

    #[error("failed to parse job definitions file {path}: {source}")]
    ParseJobsFile { path: PathBuf, source: toml::de::Error },
}

/// Resolved daemon configuration (§9: "Configuration").
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
    pub checkpoint_every_ops: u64,
    pub max_log_lines: usize,
    pub housekeeper_sweep_interval_ms: u64,
    pub finished_retention_ms: u64,
    pub supervisor_tick_interval_ms: u64,
    pub jobs_file: Option<PathBuf>,
}

impl Config {
    /// Resolves every field from the environment, falling back to the
    /// documented defaults (`WY_STATE_DIR` > `XDG_STATE_HOME/workyard` >
    /// `~/.local/state/workyard`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let state_dir = state_dir()?;
        let log_dir = std::env::var("WY_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| state_dir.join("logs"));
        Ok(Self {
            bind_addr: std::env::var("WY_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            state_dir,
            log_dir,
            checkpoint_every_ops: env_u64("WY_CHECKPOINT_EVERY_OPS").unwrap_or(500),
            max_log_lines: env_u64("WY_MAX_LOG_LINES").unwrap_or(100) as usize,
            housekeeper_sweep_interval_ms: env_u64("WY_HOUSEKEEPER_SWEEP_MS").unwrap_or(30_000),
            finished_retention_ms: env_u64("WY_FINISHED_RETENTION_MS")
                .unwrap_or(7 * 24 * 60 * 60 * 1000),
            supervisor_tick_interval_ms: env_u64("WY_SUPERVISOR_TICK_MS").unwrap_or(5_000),
            jobs_file: std::env::var("WY_JOBS_FILE").ok().map(PathBuf::from),
        })
    }
}

fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("WY_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("workyard"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/workyard"))
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Shutdown drain timeout, read lazily rather than folded into [`Config`]
/// since only the signal-handling task consults it.
pub fn drain_timeout() -> Duration {
    std::env::var("WY_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// One TOML-seeded job definition, as read from [`Config::jobs_file`].
///
/// Static seeding is scoped to remote jobs: a [`wy_core::JobDefinition`]
/// alone carries no behavior, and the only `Runnable` this workspace ships
/// without embedding application code is `wy_remote::RemoteJobRunnable`, so
/// that's what config-driven registration can build.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct JobSeed {
    pub name: String,
    pub remote_base_uri: String,
    pub script_path: PathBuf,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default = "default_max_execution_ms")]
    pub max_execution_ms: u64,
    #[serde(default = "default_max_idle_ms")]
    pub max_idle_ms: u64,
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,
    #[serde(default)]
    pub abortable: bool,
}

fn default_max_execution_ms() -> u64 {
    3_600_000
}

fn default_max_idle_ms() -> u64 {
    600_000
}

fn default_polling_interval_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct JobSeedFile {
    #[serde(default)]
    pub jobs: Vec<JobSeed>,
}

pub fn load_job_seeds(path: &std::path::Path) -> Result<JobSeedFile, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadJobsFile { path: path.to_path_buf(), source })?;
    toml::from_str(&text)
        .map_err(|source| ConfigError::ParseJobsFile { path: path.to_path_buf(), source })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
