// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Running-constraint set: copy-on-write mutual-exclusion groups (§4.3, §5).

use std::collections::BTreeSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use wy_core::RunningConstraint;

/// Copy-on-write set of constraint groups.
///
/// `addRunningConstraint` rebuilds the whole `Vec` and swaps it in; readers
/// (`executeJob`, `executeQueuedJobs`) take a lock-free `Guard` snapshot via
/// `ArcSwap::load`, matching §5's "copy-on-write" requirement.
#[derive(Default)]
pub struct ConstraintSet {
    groups: ArcSwap<Vec<BTreeSet<String>>>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self { groups: ArcSwap::from_pointee(Vec::new()) }
    }

    pub fn add(&self, constraint: &RunningConstraint) {
        let mut next: Vec<BTreeSet<String>> = (**self.groups.load()).clone();
        next.push(constraint.names().map(str::to_string).collect());
        self.groups.store(Arc::new(next));
    }

    /// True if some other currently-RUNNING name shares a constraint group
    /// with `name`.
    ///
    /// Reflexive by design (§9 Open Question): a group containing `name`
    /// itself blocks `name` if `name` is in `running` — this duplicates the
    /// scheduler's explicit same-name RUNNING check but the source's
    /// semantics are preserved deliberately.
    pub fn is_blocked(&self, name: &str, running: &BTreeSet<String>) -> bool {
        let groups = self.groups.load();
        groups
            .iter()
            .filter(|group| group.contains(name))
            .any(|group| group.iter().any(|member| running.contains(member)))
    }
}

#[cfg(test)]
#[path = "constraints_tests.rs"]
mod tests;
