// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! `RunningConstraint`: an immutable mutual-exclusion group of job names (§3.1).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named set of two or more job names that mutually exclude RUNNING state
/// (I5). Multiple constraints may overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningConstraint {
    names: BTreeSet<String>,
}

/// A constraint group must name at least two distinct jobs.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("running constraint must contain at least two job names")]
pub struct EmptyConstraint;

impl RunningConstraint {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Result<Self, EmptyConstraint> {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if names.len() < 2 {
            return Err(EmptyConstraint);
        }
        Ok(Self { names })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
#[path = "constraint_tests.rs"]
mod tests;
