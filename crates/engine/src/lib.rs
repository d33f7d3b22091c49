// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wy-engine: the scheduler that admits, queues, activates, and supervises
//! jobs under running-constraint rules (§4.2, §4.3, §4.5).

pub mod constraints;
pub mod error;
pub mod housekeeper;
pub mod registry;
pub mod scheduler;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use constraints::ConstraintSet;
pub use error::{SchedulerError, SchedulerResult};
pub use housekeeper::{Housekeeper, HousekeeperConfig};
pub use registry::{ExceptionOutcome, JobContext, Phase, Registry, RemoteStatus, Runnable, RunnableError};
pub use scheduler::Scheduler;
