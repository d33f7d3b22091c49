// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

use serial_test::serial;
use tempfile::tempdir;

use super::*;

fn clear_env() {
    for key in [
        "WY_STATE_DIR",
        "XDG_STATE_HOME",
        "WY_LOG_DIR",
        "WY_BIND_ADDR",
        "WY_CHECKPOINT_EVERY_OPS",
        "WY_MAX_LOG_LINES",
        "WY_HOUSEKEEPER_SWEEP_MS",
        "WY_FINISHED_RETENTION_MS",
        "WY_SUPERVISOR_TICK_MS",
        "WY_JOBS_FILE",
        "WY_DRAIN_TIMEOUT_MS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn from_env_falls_back_to_documented_defaults() {
    clear_env();
    std::env::set_var("HOME", "/home/nobody");

    let config = Config::from_env().unwrap();
    assert_eq!(config.bind_addr, "0.0.0.0:8080");
    assert_eq!(config.state_dir, PathBuf::from("/home/nobody/.local/state/workyard"));
    assert_eq!(config.log_dir, PathBuf::from("/home/nobody/.local/state/workyard/logs"));
    assert_eq!(config.checkpoint_every_ops, 500);
    assert_eq!(config.max_log_lines, 100);
    assert_eq!(config.housekeeper_sweep_interval_ms, 30_000);
    assert_eq!(config.finished_retention_ms, 7 * 24 * 60 * 60 * 1000);
    assert_eq!(config.supervisor_tick_interval_ms, 5_000);
    assert!(config.jobs_file.is_none());

    clear_env();
}

#[test]
#[serial]
fn wy_state_dir_takes_precedence_over_xdg_and_home() {
    clear_env();
    std::env::set_var("HOME", "/home/nobody");
    std::env::set_var("XDG_STATE_HOME", "/xdg");
    std::env::set_var("WY_STATE_DIR", "/explicit/state");

    let config = Config::from_env().unwrap();
    assert_eq!(config.state_dir, PathBuf::from("/explicit/state"));

    clear_env();
}

#[test]
#[serial]
fn xdg_state_home_wins_over_home_fallback() {
    clear_env();
    std::env::set_var("HOME", "/home/nobody");
    std::env::set_var("XDG_STATE_HOME", "/xdg");

    let config = Config::from_env().unwrap();
    assert_eq!(config.state_dir, PathBuf::from("/xdg/workyard"));

    clear_env();
}

#[test]
#[serial]
fn missing_home_and_xdg_and_explicit_dir_is_an_error() {
    clear_env();
    std::env::remove_var("HOME");

    let err = state_dir().unwrap_err();
    assert!(matches!(err, ConfigError::NoStateDir));

    clear_env();
}

#[test]
#[serial]
fn env_overrides_are_honored() {
    clear_env();
    std::env::set_var("WY_STATE_DIR", "/tmp/wy");
    std::env::set_var("WY_BIND_ADDR", "127.0.0.1:9090");
    std::env::set_var("WY_CHECKPOINT_EVERY_OPS", "10");
    std::env::set_var("WY_MAX_LOG_LINES", "5");
    std::env::set_var("WY_LOG_DIR", "/var/log/workyard");

    let config = Config::from_env().unwrap();
    assert_eq!(config.bind_addr, "127.0.0.1:9090");
    assert_eq!(config.checkpoint_every_ops, 10);
    assert_eq!(config.max_log_lines, 5);
    assert_eq!(config.log_dir, PathBuf::from("/var/log/workyard"));

    clear_env();
}

#[test]
#[serial]
fn wy_log_dir_defaults_to_state_dir_logs_subdirectory() {
    clear_env();
    std::env::set_var("WY_STATE_DIR", "/tmp/wy-state");

    let config = Config::from_env().unwrap();
    assert_eq!(config.log_dir, PathBuf::from("/tmp/wy-state/logs"));

    clear_env();
}

#[test]
#[serial]
fn drain_timeout_defaults_to_five_seconds() {
    clear_env();
    assert_eq!(drain_timeout(), Duration::from_secs(5));
    std::env::set_var("WY_DRAIN_TIMEOUT_MS", "250");
    assert_eq!(drain_timeout(), Duration::from_millis(250));
    clear_env();
}

#[test]
fn load_job_seeds_parses_defaults_and_overrides() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.toml");
    std::fs::write(
        &path,
        r#"
        [[jobs]]
        name = "nightly-report"
        remote_base_uri = "http://executors.internal"
        script_path = "/opt/scripts/nightly.tar.gz"

        [[jobs]]
        name = "rebuild-index"
        remote_base_uri = "http://executors.internal"
        script_path = "/opt/scripts/rebuild.tar.gz"
        disabled = true
        max_execution_ms = 60000
        max_idle_ms = 15000
        polling_interval_ms = 2000
        abortable = true
        "#,
    )
    .unwrap();

    let seeds = load_job_seeds(&path).unwrap();
    assert_eq!(seeds.jobs.len(), 2);

    let first = &seeds.jobs[0];
    assert_eq!(first.name, "nightly-report");
    assert!(!first.disabled);
    assert_eq!(first.max_execution_ms, default_max_execution_ms());
    assert_eq!(first.max_idle_ms, default_max_idle_ms());
    assert_eq!(first.polling_interval_ms, default_polling_interval_ms());
    assert!(!first.abortable);

    let second = &seeds.jobs[1];
    assert!(second.disabled);
    assert_eq!(second.max_execution_ms, 60_000);
    assert_eq!(second.polling_interval_ms, 2_000);
    assert!(second.abortable);
}

#[test]
fn load_job_seeds_missing_file_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.toml");
    let err = load_job_seeds(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadJobsFile { .. }));
}

#[test]
fn load_job_seeds_invalid_toml_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.toml");
    std::fs::write(&path, "not valid toml [[[").unwrap();
    let err = load_job_seeds(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseJobsFile { .. }));
}
