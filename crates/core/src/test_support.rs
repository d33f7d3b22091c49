// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

/// Proptest strategies for core state-machine types, shared by `wy-store`
/// and `wy-engine`'s property tests (§8 P1-P5).
#[cfg(feature = "proptest")]
pub mod strategies {
    use crate::record::{ExecutionPriority, ResultCode, RunningState};
    use proptest::prelude::*;

    pub fn arb_execution_priority() -> impl Strategy<Value = ExecutionPriority> {
        prop_oneof![
            Just(ExecutionPriority::CheckPreconditions),
            Just(ExecutionPriority::ForceExecution),
        ]
    }

    pub fn arb_result_code() -> impl Strategy<Value = ResultCode> {
        prop_oneof![
            Just(ResultCode::Successful),
            Just(ResultCode::Failed),
            Just(ResultCode::NotExecuted),
            Just(ResultCode::TimedOut),
            Just(ResultCode::Aborted),
        ]
    }

    pub fn arb_running_state() -> impl Strategy<Value = RunningState> {
        prop_oneof![
            Just(RunningState::Running),
            Just(RunningState::Queued),
            arb_result_code().prop_map(|result_code| RunningState::Finished { result_code }),
        ]
    }

    /// A small pool of job names, so generated operations collide often
    /// enough to exercise the uniqueness invariants (I1/I2).
    pub fn arb_job_name() -> impl Strategy<Value = String> {
        prop_oneof![Just("alpha"), Just("beta"), Just("gamma")].prop_map(str::to_string)
    }
}

/// A deterministic, human-readable set of sample parameters for tests.
pub fn sample_params() -> crate::record::OrderedMap {
    let mut params = crate::record::OrderedMap::new();
    params.insert("env".to_string(), "staging".to_string());
    params.insert("retries".to_string(), "3".to_string());
    params
}
