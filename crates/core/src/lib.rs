// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wy-core: domain entities and cross-cutting abstractions for Workyard.
//!
//! This crate has no I/O and no async runtime dependency: it defines the
//! job record/definition/constraint data model (§3), the `Clock`
//! abstraction, and the declarative macros shared by the other crates.

pub mod macros;

pub mod clock;
pub mod constraint;
pub mod definition;
pub mod host;
pub mod id;
pub mod record;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use constraint::{EmptyConstraint, RunningConstraint};
pub use definition::JobDefinition;
#[cfg(any(test, feature = "test-support"))]
pub use definition::JobDefinitionBuilder;
pub use host::{host_tag, thread_tag};
pub use id::short;
#[cfg(any(test, feature = "test-support"))]
pub use record::JobRecordBuilder;
pub use record::{
    additional_data_keys, ExecutionPriority, JobId, JobRecord, LogLine, OrderedMap, ResultCode,
    RunningState,
};
