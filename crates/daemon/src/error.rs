// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Maps [`wy_engine::SchedulerError`] to the HTTP status codes in §6.1's
//! route table; internal store errors collapse to 500 (§7: "Internal store
//! errors map to 500").

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use wy_engine::SchedulerError;
use wy_wire::ErrorResponse;

pub struct ApiError(SchedulerError);

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            SchedulerError::JobNotRegistered(_) => (StatusCode::NOT_FOUND, "JobNotRegistered"),
            SchedulerError::JobAlreadyRegistered(_) => {
                (StatusCode::CONFLICT, "JobAlreadyRegistered")
            }
            SchedulerError::JobAlreadyQueued(_) => (StatusCode::CONFLICT, "JobAlreadyQueued"),
            SchedulerError::JobAlreadyRunning(_) => (StatusCode::CONFLICT, "JobAlreadyRunning"),
            SchedulerError::JobExecutionNotNecessary(_) => {
                (StatusCode::PRECONDITION_FAILED, "JobExecutionNotNecessary")
            }
            SchedulerError::JobExecutionDisabled(_) => {
                (StatusCode::PRECONDITION_FAILED, "JobExecutionDisabled")
            }
            SchedulerError::JobServiceNotActive => {
                (StatusCode::SERVICE_UNAVAILABLE, "JobServiceNotActive")
            }
            SchedulerError::JobNotRunning(_) => (StatusCode::NOT_FOUND, "JobNotRunning"),
            SchedulerError::JobNotAbortable(_) => (StatusCode::FORBIDDEN, "JobNotAbortable"),
            SchedulerError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "StoreError"),
        };
        let body = ErrorResponse::new(kind, self.0.to_string());
        (status, Json(body)).into_response()
    }
}
