// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

use std::sync::Arc;
use std::time::Duration;

use wy_core::{ExecutionPriority, FakeClock, ResultCode, RunningState};
use wy_store::{new_record, MemStore, StateFilter, Store};

use super::*;
use crate::scheduler::Scheduler;
use crate::test_support::recording;

fn housekeeper_with_clock(
    config: HousekeeperConfig,
) -> (Arc<Housekeeper<MemStore, FakeClock>>, Arc<Scheduler<MemStore, FakeClock>>, FakeClock) {
    let clock = FakeClock::new();
    let store = Arc::new(MemStore::open_temp().unwrap());
    let scheduler = Arc::new(Scheduler::with_clock(store, clock.clone()));
    let housekeeper = Arc::new(Housekeeper::new(scheduler.clone(), config));
    (housekeeper, scheduler, clock)
}

/// Inserts a RUNNING record directly (bypassing worker dispatch) so timeout
/// tests can control exactly when the record becomes eligible, without
/// racing a runnable's own `execute` completion.
async fn insert_running<S: Store>(store: &S, name: &str, now_ms: u64) -> wy_core::JobId {
    let record = new_record(
        name,
        "host-1:1",
        "worker-0",
        RunningState::Running,
        ExecutionPriority::CheckPreconditions,
        Default::default(),
        3_600_000,
        600_000,
        now_ms,
    );
    store.create_unique(record).await.unwrap().unwrap()
}

#[tokio::test]
async fn max_execution_timeout_finishes_running_job() {
    let config = HousekeeperConfig { sweep_interval_ms: 1_000, finished_retention_ms: u64::MAX };
    let (housekeeper, scheduler, clock) = housekeeper_with_clock(config);
    let runnable = recording("alpha").abortable();
    scheduler.register_job(runnable.clone()).unwrap();

    let now = clock.epoch_ms();
    let id = insert_running(scheduler.store().as_ref(), "alpha", now).await;

    clock.advance(Duration::from_millis(runnable.max_execution_ms() + 1));
    housekeeper.sweep_once().await.unwrap();

    let record = scheduler.store().find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(record.running_state.result_code(), Some(ResultCode::TimedOut));
}

#[tokio::test]
async fn max_idle_timeout_finishes_running_job() {
    let config = HousekeeperConfig { sweep_interval_ms: 1_000, finished_retention_ms: u64::MAX };
    let (housekeeper, scheduler, clock) = housekeeper_with_clock(config);
    let runnable = recording("alpha");
    scheduler.register_job(runnable.clone()).unwrap();

    let now = clock.epoch_ms();
    let id = insert_running(scheduler.store().as_ref(), "alpha", now).await;

    clock.advance(Duration::from_millis(runnable.max_idle_ms() + 1));
    housekeeper.sweep_once().await.unwrap();

    let record = scheduler.store().find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(record.running_state.result_code(), Some(ResultCode::TimedOut));
}

#[tokio::test]
async fn sweep_is_a_no_op_before_any_deadline() {
    let config = HousekeeperConfig { sweep_interval_ms: 1_000, finished_retention_ms: u64::MAX };
    let (housekeeper, scheduler, clock) = housekeeper_with_clock(config);
    let runnable = recording("alpha");
    scheduler.register_job(runnable.clone()).unwrap();

    let now = clock.epoch_ms();
    let id = insert_running(scheduler.store().as_ref(), "alpha", now).await;

    housekeeper.sweep_once().await.unwrap();

    let record = scheduler.store().find_by_id(&id).await.unwrap().unwrap();
    assert!(record.running_state.is_running());
}

#[tokio::test]
async fn retention_prunes_aged_finished_records_only() {
    let config = HousekeeperConfig { sweep_interval_ms: 1_000, finished_retention_ms: 60_000 };
    let (housekeeper, scheduler, clock) = housekeeper_with_clock(config);
    let runnable = recording("alpha");
    scheduler.register_job(runnable.clone()).unwrap();

    let now = clock.epoch_ms();
    let id = insert_running(scheduler.store().as_ref(), "alpha", now).await;
    scheduler
        .store()
        .mark_running_as_finished_successfully("alpha", now)
        .await
        .unwrap();

    clock.advance(Duration::from_millis(120_000));
    housekeeper.sweep_once().await.unwrap();

    assert!(scheduler.store().find_by_id(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn retention_keeps_records_within_the_window() {
    let config = HousekeeperConfig { sweep_interval_ms: 1_000, finished_retention_ms: 60_000 };
    let (housekeeper, scheduler, clock) = housekeeper_with_clock(config);
    let runnable = recording("alpha");
    scheduler.register_job(runnable.clone()).unwrap();

    let now = clock.epoch_ms();
    let id = insert_running(scheduler.store().as_ref(), "alpha", now).await;
    scheduler
        .store()
        .mark_running_as_finished_successfully("alpha", now)
        .await
        .unwrap();

    clock.advance(Duration::from_millis(1_000));
    housekeeper.sweep_once().await.unwrap();

    assert!(scheduler.store().find_by_id(&id).await.unwrap().is_some());
    assert!(scheduler.store().has_job("alpha", StateFilter::Finished(None)).await.unwrap());
}

#[tokio::test]
async fn retention_gates_on_finished_at_not_created_at() {
    let config = HousekeeperConfig { sweep_interval_ms: 1_000, finished_retention_ms: 60_000 };
    let (housekeeper, scheduler, clock) = housekeeper_with_clock(config);
    let runnable = recording("alpha");
    scheduler.register_job(runnable.clone()).unwrap();

    let created_at = clock.epoch_ms();
    let id = insert_running(scheduler.store().as_ref(), "alpha", created_at).await;

    // Long-running job: created well before what will become the retention
    // cutoff, but it only finishes moments ago.
    clock.advance(Duration::from_millis(200_000));
    let finished_at = clock.epoch_ms();
    scheduler.store().mark_running_as_finished_successfully("alpha", finished_at).await.unwrap();

    clock.advance(Duration::from_millis(1_000));
    housekeeper.sweep_once().await.unwrap();

    assert!(
        scheduler.store().find_by_id(&id).await.unwrap().is_some(),
        "a job finished within the retention window must not be pruned on its old creation time"
    );
}
