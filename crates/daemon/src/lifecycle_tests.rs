// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

use tempfile::tempdir;
use wy_core::ExecutionPriority;

use super::*;

fn test_config(state_dir: std::path::PathBuf, jobs_file: Option<PathBuf>) -> Config {
    let log_dir = state_dir.join("logs");
    Config {
        bind_addr: "127.0.0.1:0".to_string(),
        state_dir,
        log_dir,
        checkpoint_every_ops: 500,
        max_log_lines: 100,
        housekeeper_sweep_interval_ms: 50,
        finished_retention_ms: 60_000,
        supervisor_tick_interval_ms: 50,
        jobs_file,
    }
}

#[tokio::test]
async fn start_with_no_jobs_file_registers_nothing() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path().to_path_buf(), None);

    let daemon = Daemon::start(&config).await.unwrap();
    assert!(daemon.scheduler.registry().names().is_empty());

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn start_seeds_remote_jobs_from_jobs_file() {
    let dir = tempdir().unwrap();
    let scripts_path = dir.path().join("script.tar.gz");
    std::fs::write(&scripts_path, b"not-really-a-tarball").unwrap();

    let jobs_file = dir.path().join("jobs.toml");
    std::fs::write(
        &jobs_file,
        format!(
            r#"
            [[jobs]]
            name = "seeded-job"
            remote_base_uri = "http://executors.invalid"
            script_path = "{}"
            abortable = true
            "#,
            scripts_path.display()
        ),
    )
    .unwrap();

    let config = test_config(dir.path().join("state"), Some(jobs_file));
    let daemon = Daemon::start(&config).await.unwrap();

    assert_eq!(daemon.scheduler.registry().names(), vec!["seeded-job".to_string()]);
    let definition = daemon.scheduler.store().get_definition("seeded-job").await.unwrap().unwrap();
    assert!(!definition.disabled);
    assert!(definition.is_remote);
    assert!(definition.is_abortable);

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn start_with_missing_jobs_file_fails() {
    let dir = tempdir().unwrap();
    let jobs_file = dir.path().join("missing.toml");
    let config = test_config(dir.path().join("state"), Some(jobs_file));

    let err = Daemon::start(&config).await.unwrap_err();
    assert!(err.to_string().contains("loading job seeds"));
}

#[tokio::test]
async fn shutdown_drains_running_local_jobs_as_failed() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path().join("state"), None);
    let daemon = Daemon::start(&config).await.unwrap();
    let scheduler = daemon.scheduler.clone();

    let runnable = wy_engine::test_support::recording("local-job");
    scheduler.register_job(runnable.clone()).unwrap();
    let id = scheduler
        .execute_job("local-job", ExecutionPriority::CheckPreconditions, wy_core::OrderedMap::new())
        .await
        .unwrap();

    daemon.shutdown().await.unwrap();

    let record = scheduler.store().find_by_id(&id).await.unwrap();
    if let Some(record) = record {
        // Either the worker finished on its own before shutdown drained it,
        // or shutdown marked it FAILED — both are acceptable terminal
        // outcomes for a job that was still nominally RUNNING at shutdown.
        assert!(record.running_state.is_finished());
    }
}
