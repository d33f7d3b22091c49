// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Wire-format types for the `/jobs` HTTP resource tree (§6.1): JSON DTOs,
//! query-string parsing, and a minimal Atom feed writer.

pub mod atom;
pub mod dto;
pub mod error;
pub mod query;

pub use atom::{AtomEntry, AtomFeed};
pub use dto::{
    ErrorResponse, GlobalStatus, HistoryResponse, JobRecordDto, LogLineDto, OrderedHistory,
    StatusResponse,
};
pub use error::QueryError;
pub use query::{parse_execute_params, parse_history_query, parse_list_size, HistoryQuery};
