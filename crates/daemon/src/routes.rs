// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! The `/jobs` resource tree (§6.1): one handler per route-table row.

use axum::extract::{Path, RawQuery, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use wy_core::JobId;
use wy_store::StateFilter;
use wy_wire::{
    parse_execute_params, parse_history_query, parse_list_size, AtomEntry, AtomFeed,
    ErrorResponse, HistoryResponse, JobRecordDto, OrderedHistory, StatusResponse,
};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/enable", post(enable_service))
        .route("/jobs/disable", post(disable_service))
        .route("/jobs/status", get(service_status))
        .route("/jobs/history", get(history))
        .route("/jobs/:name", get(job_history).post(execute))
        .route("/jobs/:name/enable", post(enable_job))
        .route("/jobs/:name/disable", post(disable_job))
        .route("/jobs/:name/:id", get(job_record))
        .route("/jobs/:name/:id/abort", post(abort_job))
        .with_state(state)
}

fn query_pairs(raw: Option<String>) -> Vec<(String, String)> {
    raw.map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn query_error(err: wy_wire::QueryError) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new("InvalidQuery", err.to_string())))
        .into_response()
}

/// `GET /jobs`: an Atom feed of every registered job name (§6.1).
async fn list_jobs(State(state): State<AppState>) -> Response {
    let now = state.scheduler.clock().epoch_ms();
    let entries = state
        .scheduler
        .registry()
        .names()
        .into_iter()
        .map(|name| {
            let link = format!("/jobs/{name}");
            AtomEntry::new(link.clone(), name, format_rfc3339(now), link, "")
        })
        .collect();
    let feed = AtomFeed::new("/jobs", "registered jobs", format_rfc3339(now), "/jobs")
        .with_entries(entries);
    atom_response(feed)
}

/// `POST /jobs/enable` (§6.1).
async fn enable_service(State(state): State<AppState>) -> Json<StatusResponse> {
    state.scheduler.set_execution_enabled(true);
    status_response(&state).await
}

/// `POST /jobs/disable` (§6.1).
async fn disable_service(State(state): State<AppState>) -> Json<StatusResponse> {
    state.scheduler.set_execution_enabled(false);
    status_response(&state).await
}

/// `GET /jobs/status` (§6.1).
async fn service_status(State(state): State<AppState>) -> Json<StatusResponse> {
    status_response(&state).await
}

async fn status_response(state: &AppState) -> Json<StatusResponse> {
    let host = state.scheduler.host().to_string();
    let running = state.scheduler.store().running_job_names().await.unwrap_or_default();
    let local_running_jobs =
        !running.is_empty() && any_job_running_locally(state, &running, &host).await;
    Json(StatusResponse::new(state.scheduler.execution_enabled(), local_running_jobs))
}

/// Whether any currently-RUNNING job is owned by this process's host tag.
async fn any_job_running_locally(state: &AppState, names: &[String], host: &str) -> bool {
    for name in names {
        if let Ok(Some(record)) =
            state.scheduler.store().find_by_name_and_state(name, StateFilter::Running).await
        {
            if record.host == host {
                return true;
            }
        }
    }
    false
}

/// `POST /jobs/{name}`: admits `name` for execution (§4.3, §6.1).
async fn execute(
    State(state): State<AppState>,
    Path(name): Path<String>,
    RawQuery(raw): RawQuery,
) -> Response {
    let (priority, params) = match parse_execute_params(&query_pairs(raw)) {
        Ok(parsed) => parsed,
        Err(err) => return query_error(err),
    };
    match state.scheduler.execute_job(&name, priority, params).await {
        Ok(id) => (
            StatusCode::CREATED,
            [(header::LOCATION, format!("/jobs/{name}/{}", id.as_str()))],
            Json(serde_json::json!({ "id": id.as_str() })),
        )
            .into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// `GET /jobs/{name}?size=N`: most-recent attempts as an Atom feed (§6.1).
async fn job_history(
    State(state): State<AppState>,
    Path(name): Path<String>,
    RawQuery(raw): RawQuery,
) -> Response {
    let size = match parse_list_size(&query_pairs(raw)) {
        Ok(size) => size,
        Err(err) => return query_error(err),
    };
    let records = match state.scheduler.store().find_by_name(&name, size).await {
        Ok(records) => records,
        Err(err) => return ApiError::from(wy_engine::SchedulerError::Store(err)).into_response(),
    };
    let entries = records
        .iter()
        .map(|record| {
            let link = format!("/jobs/{}/{}", record.name, record.id.as_str());
            let dto = JobRecordDto::from(record);
            AtomEntry::new(
                record.id.as_str(),
                format!("{} ({})", record.name, record.running_state),
                format_rfc3339(record.last_modified_at_ms),
                link,
                serde_json::to_string(&dto).unwrap_or_default(),
            )
        })
        .collect();
    let now = state.scheduler.clock().epoch_ms();
    let feed = AtomFeed::new(
        format!("/jobs/{name}"),
        format!("history of {name}"),
        format_rfc3339(now),
        format!("/jobs/{name}"),
    )
    .with_entries(entries);
    atom_response(feed)
}

/// `POST /jobs/{name}/enable` (§6.1).
async fn enable_job(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    toggle_job(state, name, true).await
}

/// `POST /jobs/{name}/disable` (§6.1).
async fn disable_job(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    toggle_job(state, name, false).await
}

async fn toggle_job(state: AppState, name: String, enabled: bool) -> Response {
    match state.scheduler.set_job_execution_enabled(&name, enabled).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// `GET /jobs/{name}/{id}` (§6.1).
async fn job_record(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> Response {
    let job_id = JobId::from_string(&id);
    match state.scheduler.store().find_by_id(&job_id).await {
        Ok(Some(record)) if record.name == name => Json(JobRecordDto::from(&record)).into_response(),
        Ok(_) => ApiError::from(wy_engine::SchedulerError::JobNotRunning(name)).into_response(),
        Err(err) => ApiError::from(wy_engine::SchedulerError::Store(err)).into_response(),
    }
}

/// `POST /jobs/{name}/{id}/abort` (§6.1, §4.3 abort semantics).
async fn abort_job(
    State(state): State<AppState>,
    Path((_name, id)): Path<(String, String)>,
) -> Response {
    let job_id = JobId::from_string(&id);
    match state.scheduler.abort_job(&job_id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// `GET /jobs/history?hours=&resultCode=&jobName=` (§6.1).
async fn history(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let query = match parse_history_query(&query_pairs(raw)) {
        Ok(query) => query,
        Err(err) => return query_error(err),
    };
    let now = state.scheduler.clock().epoch_ms();
    let from_ms = now.saturating_sub(query.hours.saturating_mul(3_600_000));
    let names = match &query.job_name {
        Some(name) => vec![name.clone()],
        None => state.scheduler.registry().names(),
    };

    let mut records: OrderedHistory = OrderedHistory::new();
    for name in names {
        let matches = match state
            .scheduler
            .store()
            .find_by_name_and_time_range(&name, from_ms, now, query.result_codes.as_deref())
            .await
        {
            Ok(matches) => matches,
            Err(err) => {
                return ApiError::from(wy_engine::SchedulerError::Store(err)).into_response()
            }
        };
        if !matches.is_empty() {
            records.insert(name, matches.iter().map(JobRecordDto::from).collect());
        }
    }
    Json(HistoryResponse { records }).into_response()
}

fn atom_response(feed: AtomFeed) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/atom+xml")],
        feed.to_xml(),
    )
        .into_response()
}

/// Renders an epoch-millisecond timestamp as RFC 3339 UTC, good enough for
/// Atom's `updated` element without pulling in a date/time crate the rest
/// of the workspace has no other use for.
///
/// Civil-from-days conversion after Howard Hinnant's well-known
/// `http://howardhinnant.github.io/date_algorithms.html#civil_from_days`.
fn format_rfc3339(epoch_ms: u64) -> String {
    let total_secs = epoch_ms / 1000;
    let millis = epoch_ms % 1000;
    let days = (total_secs / 86_400) as i64;
    let secs_of_day = total_secs % 86_400;
    let (h, m, s) = (secs_of_day / 3600, (secs_of_day % 3600) / 60, secs_of_day % 60);

    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { y + 1 } else { y };

    format!("{year:04}-{month:02}-{day:02}T{h:02}:{m:02}:{s:02}.{millis:03}Z")
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
