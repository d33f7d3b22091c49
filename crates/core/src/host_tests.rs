// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

use super::*;

#[test]
fn host_tag_is_stable_across_calls() {
    assert_eq!(host_tag(), host_tag());
}

#[test]
fn host_tag_contains_pid() {
    let pid = std::process::id().to_string();
    assert!(host_tag().ends_with(&pid));
}

#[test]
fn thread_tag_formats_sequence() {
    assert_eq!(thread_tag(3), "worker-3");
}
