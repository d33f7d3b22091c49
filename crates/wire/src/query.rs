// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Query-string parsing for the `/jobs` resource tree (§6.1).

use wy_core::{ExecutionPriority, OrderedMap, ResultCode};

use crate::error::QueryError;

/// Parses an execute-job query string into the ordered parameter map,
/// rejecting a key supplied more than once or with an empty value (§6.1:
/// "multi-valued or empty parameters ⇒ 400"). `POST /jobs/{name}` always
/// admits with `FORCE_EXECUTION` (§6.1: "Execute with FORCE_EXECUTION") —
/// unlike the programmatic `Scheduler::execute_job` entry point, the HTTP
/// control-plane route carries no separate priority parameter, so every
/// query key here contributes a job parameter.
pub fn parse_execute_params(
    pairs: &[(String, String)],
) -> Result<(ExecutionPriority, OrderedMap), QueryError> {
    let mut seen = std::collections::HashSet::new();
    let mut params = OrderedMap::new();

    for (key, value) in pairs {
        if !seen.insert(key.clone()) {
            return Err(QueryError::MultiValued(key.clone()));
        }
        if value.is_empty() {
            return Err(QueryError::Empty(key.clone()));
        }
        params.insert(key.clone(), value.clone());
    }

    Ok((ExecutionPriority::ForceExecution, params))
}

/// Parsed `GET /jobs/{name}` list size. Defaults to 10 (§6.1).
pub fn parse_list_size(pairs: &[(String, String)]) -> Result<usize, QueryError> {
    for (key, value) in pairs {
        if key == "size" {
            return value
                .parse::<usize>()
                .map_err(|_| QueryError::InvalidValue("size".to_string(), value.clone()));
        }
    }
    Ok(10)
}

/// Parsed `GET /jobs/history` query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub hours: u64,
    pub result_codes: Option<Vec<ResultCode>>,
    pub job_name: Option<String>,
}

pub fn parse_history_query(pairs: &[(String, String)]) -> Result<HistoryQuery, QueryError> {
    let mut query = HistoryQuery { hours: 24, ..Default::default() };
    for (key, value) in pairs {
        match key.as_str() {
            "hours" => {
                query.hours = value
                    .parse::<u64>()
                    .map_err(|_| QueryError::InvalidValue("hours".to_string(), value.clone()))?;
            }
            "resultCode" => {
                let code = parse_result_code(value)
                    .ok_or_else(|| QueryError::InvalidValue("resultCode".to_string(), value.clone()))?;
                query.result_codes.get_or_insert_with(Vec::new).push(code);
            }
            "jobName" => query.job_name = Some(value.clone()),
            _ => {}
        }
    }
    Ok(query)
}

fn parse_result_code(s: &str) -> Option<ResultCode> {
    match s {
        "SUCCESSFUL" => Some(ResultCode::Successful),
        "FAILED" => Some(ResultCode::Failed),
        "NOT_EXECUTED" => Some(ResultCode::NotExecuted),
        "TIMED_OUT" => Some(ResultCode::TimedOut),
        "ABORTED" => Some(ResultCode::Aborted),
        _ => None,
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
