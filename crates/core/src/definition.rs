// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! `JobDefinition`: one per job name, upserted by name (§3.1).

use serde::{Deserialize, Serialize};

/// Stored, non-dynamic metadata and policy flags for a job name.
///
/// A `JobDefinition` is distinct from the in-process [`crate::runnable`]
/// registration: the definition is durable (persisted in the store) while
/// the runnable is process-local behavior. Kept apart rather than as a
/// single bidirectional struct so that lookup is always by `name` (§9
/// Design Note: "Cyclic references in domain objects").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub name: String,
    pub disabled: bool,
    pub last_not_executed_at_ms: Option<u64>,
    pub max_execution_ms: u64,
    pub max_idle_ms: u64,
    pub polling_interval_ms: u64,
    pub is_remote: bool,
    pub is_abortable: bool,
}

impl JobDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            disabled: false,
            last_not_executed_at_ms: None,
            max_execution_ms: 3_600_000,
            max_idle_ms: 600_000,
            polling_interval_ms: 10_000,
            is_remote: false,
            is_abortable: false,
        }
    }
}

crate::builder! {
    pub struct JobDefinitionBuilder => JobDefinition {
        into {
            name: String = "test-job",
        }
        set {
            disabled: bool = false,
            max_execution_ms: u64 = 3_600_000,
            max_idle_ms: u64 = 600_000,
            polling_interval_ms: u64 = 10_000,
            is_remote: bool = false,
            is_abortable: bool = false,
        }
        option {
            last_not_executed_at_ms: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
