// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

use thiserror::Error;

/// Failures turning a raw query string into typed request parameters
/// (§6.1: "multi-valued or empty parameters ⇒ 400").
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("parameter '{0}' was supplied more than once")]
    MultiValued(String),

    #[error("parameter '{0}' was empty")]
    Empty(String),

    #[error("invalid value for '{0}': {1}")]
    InvalidValue(String, String),
}
