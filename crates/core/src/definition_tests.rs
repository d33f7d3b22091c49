// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

use super::*;

#[test]
fn new_definition_is_enabled_by_default() {
    let def = JobDefinition::new("nightly-import");
    assert!(!def.disabled);
    assert_eq!(def.name, "nightly-import");
}

#[test]
fn builder_overrides_defaults() {
    let def = JobDefinition::builder()
        .name("remote-etl")
        .is_remote(true)
        .is_abortable(true)
        .max_execution_ms(60_000)
        .build();
    assert_eq!(def.name, "remote-etl");
    assert!(def.is_remote);
    assert!(def.is_abortable);
    assert_eq!(def.max_execution_ms, 60_000);
}
