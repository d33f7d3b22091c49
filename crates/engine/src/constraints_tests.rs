// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

use super::*;

fn running(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn unblocked_when_no_group_member_running() {
    let set = ConstraintSet::new();
    set.add(&RunningConstraint::new(["j1", "j2"]).unwrap());

    assert!(!set.is_blocked("j1", &running(&["j3"])));
}

#[test]
fn blocked_when_other_group_member_running() {
    let set = ConstraintSet::new();
    set.add(&RunningConstraint::new(["j1", "j2"]).unwrap());

    assert!(set.is_blocked("j1", &running(&["j2"])));
}

#[test]
fn reflexive_block_when_same_name_running() {
    let set = ConstraintSet::new();
    set.add(&RunningConstraint::new(["j1", "j2"]).unwrap());

    assert!(set.is_blocked("j1", &running(&["j1"])));
}

#[test]
fn unrelated_name_never_blocked() {
    let set = ConstraintSet::new();
    set.add(&RunningConstraint::new(["j1", "j2"]).unwrap());

    assert!(!set.is_blocked("j3", &running(&["j1", "j2"])));
}

#[test]
fn overlapping_groups_both_apply() {
    let set = ConstraintSet::new();
    set.add(&RunningConstraint::new(["j1", "j2"]).unwrap());
    set.add(&RunningConstraint::new(["j1", "j3"]).unwrap());

    assert!(set.is_blocked("j1", &running(&["j3"])));
    assert!(!set.is_blocked("j2", &running(&["j3"])));
}
