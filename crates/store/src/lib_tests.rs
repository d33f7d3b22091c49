// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

use super::*;
use wy_core::test_support::sample_params;
use wy_core::{ExecutionPriority, JobDefinitionBuilder, ResultCode, RunningState};

fn running_record(name: &str, now_ms: u64) -> JobRecord {
    new_record(
        name,
        "host-1:1",
        "worker-0",
        RunningState::Running,
        ExecutionPriority::CheckPreconditions,
        sample_params(),
        3_600_000,
        600_000,
        now_ms,
    )
}

fn queued_record(name: &str, now_ms: u64) -> JobRecord {
    new_record(
        name,
        "host-1:1",
        "worker-0",
        RunningState::Queued,
        ExecutionPriority::CheckPreconditions,
        OrderedMap::new(),
        3_600_000,
        600_000,
        now_ms,
    )
}

#[tokio::test]
async fn create_unique_rejects_second_running_record() {
    let store = MemStore::open_temp().unwrap();
    let id1 = store.create_unique(running_record("alpha", 1)).await.unwrap();
    assert!(id1.is_some());

    let id2 = store.create_unique(running_record("alpha", 2)).await.unwrap();
    assert!(id2.is_none());
}

#[tokio::test]
async fn activate_queued_job_stamps_host_thread_and_started_at() {
    let store = MemStore::open_temp().unwrap();
    store.create_unique(queued_record("alpha", 1)).await.unwrap();

    assert!(store.activate_queued_job("alpha", "host-2:9", "worker-5", 50).await.unwrap());

    let record = store.find_by_name_and_state("alpha", StateFilter::Running).await.unwrap().unwrap();
    assert_eq!(record.host, "host-2:9");
    assert_eq!(record.thread, "worker-5");
    assert_eq!(record.started_at_ms, Some(50));
    assert!(store.find_by_name_and_state("alpha", StateFilter::Queued).await.unwrap().is_none());
}

#[tokio::test]
async fn mark_running_as_finished_by_name_sets_terminal_state() {
    let store = MemStore::open_temp().unwrap();
    store.create_unique(running_record("alpha", 1)).await.unwrap();

    let applied = store
        .mark_running_as_finished(
            "alpha",
            ResultCode::Failed,
            Some("boom".to_string()),
            99,
        )
        .await
        .unwrap();
    assert!(applied);

    let record = store
        .find_by_name_and_time_range("alpha", 0, 1000, None)
        .await
        .unwrap();
    assert_eq!(record.len(), 1);
    assert_eq!(record[0].running_state.result_code(), Some(ResultCode::Failed));
    assert_eq!(record[0].result_message.as_deref(), Some("boom"));
}

#[tokio::test]
async fn find_by_name_and_time_range_filters_by_result_code() {
    let store = MemStore::open_temp().unwrap();
    store.create_unique(running_record("alpha", 1)).await.unwrap();
    store.mark_running_as_finished("alpha", ResultCode::Failed, None, 2).await.unwrap();

    let matches = store
        .find_by_name_and_time_range("alpha", 0, 100, Some(&[ResultCode::Successful]))
        .await
        .unwrap();
    assert!(matches.is_empty());

    let matches = store
        .find_by_name_and_time_range("alpha", 0, 100, Some(&[ResultCode::Failed]))
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);
}

#[tokio::test]
async fn append_log_line_and_additional_data_round_trip() {
    let store = MemStore::open_temp().unwrap();
    store.create_unique(running_record("alpha", 1)).await.unwrap();

    store
        .append_log_line("alpha", wy_core::LogLine::new(1, "hello"), 2)
        .await
        .unwrap();
    store.add_additional_data("alpha", "exitCode".into(), "0".into(), 3).await.unwrap();

    let record =
        store.find_by_name_and_state("alpha", StateFilter::Running).await.unwrap().unwrap();
    assert_eq!(record.log_lines.len(), 1);
    assert_eq!(record.additional_data.get("exitCode").map(String::as_str), Some("0"));
}

#[tokio::test]
async fn set_status_message_updates_running_record_independent_of_result_message() {
    let store = MemStore::open_temp().unwrap();
    store.create_unique(running_record("alpha", 1)).await.unwrap();

    assert!(store.set_status_message("alpha", Some("50% done".to_string()), 2).await.unwrap());

    let record =
        store.find_by_name_and_state("alpha", StateFilter::Running).await.unwrap().unwrap();
    assert_eq!(record.status_message.as_deref(), Some("50% done"));
    assert!(record.result_message.is_none());
}

#[tokio::test]
async fn definitions_upsert_and_disable() {
    let store = MemStore::open_temp().unwrap();
    let def = JobDefinitionBuilder::new().name("alpha").build();
    store.upsert_definition(def).await.unwrap();

    assert!(store.get_definition("alpha").await.unwrap().is_some());
    assert!(store.set_definition_disabled("alpha", true, 5).await.unwrap());

    let def = store.get_definition("alpha").await.unwrap().unwrap();
    assert!(def.disabled);
    assert_eq!(def.last_not_executed_at_ms, Some(5));
}

#[tokio::test]
async fn state_survives_reopen_via_wal_replay() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(dir.path());

    {
        let store = MemStore::open(config.clone()).unwrap();
        store.create_unique(running_record("alpha", 1)).await.unwrap();
        store.append_log_line("alpha", wy_core::LogLine::new(2, "line"), 2).await.unwrap();
    }

    let store = MemStore::open(config).unwrap();
    let record =
        store.find_by_name_and_state("alpha", StateFilter::Running).await.unwrap().unwrap();
    assert_eq!(record.log_lines.len(), 1);
}

#[tokio::test]
async fn checkpoint_truncates_wal_after_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = StoreConfig::new(dir.path());
    config.checkpoint_every_ops = 3;

    let store = MemStore::open(config.clone()).unwrap();
    store.create_unique(running_record("alpha", 1)).await.unwrap();
    store.append_log_line("alpha", wy_core::LogLine::new(2, "a"), 2).await.unwrap();
    store.append_log_line("alpha", wy_core::LogLine::new(3, "b"), 3).await.unwrap();

    assert!(config.snapshot_path().exists());

    let reopened = MemStore::open(config).unwrap();
    let record =
        reopened.find_by_name_and_state("alpha", StateFilter::Running).await.unwrap().unwrap();
    assert_eq!(record.log_lines.len(), 2);
}

#[tokio::test]
async fn has_job_and_running_job_names_reflect_current_state() {
    let store = MemStore::open_temp().unwrap();
    store.create_unique(running_record("alpha", 1)).await.unwrap();
    store.create_unique(queued_record("beta", 1)).await.unwrap();

    assert!(store.has_job("alpha", StateFilter::Running).await.unwrap());
    assert!(!store.has_job("alpha", StateFilter::Queued).await.unwrap());

    let names = store.running_job_names().await.unwrap();
    assert_eq!(names, vec!["alpha".to_string()]);
}

#[tokio::test]
async fn remove_drops_queued_record() {
    let store = MemStore::open_temp().unwrap();
    let id = store.create_unique(queued_record("alpha", 1)).await.unwrap().unwrap();

    assert!(store.remove(&id).await.unwrap());
    assert!(store.find_by_id(&id).await.unwrap().is_none());
}
