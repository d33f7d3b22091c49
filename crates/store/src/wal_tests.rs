// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

use super::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TestOp {
    Cmd(String),
    Shutdown,
}

fn cmd(name: &str) -> TestOp {
    TestOp::Cmd(format!("cmd:{name}"))
}

#[test]
fn open_creates_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");

    let wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();

    assert!(path.exists());
    assert_eq!(wal.write_seq(), 0);
    assert_eq!(wal.processed_seq(), 0);
}

#[test]
fn append_assigns_increasing_seq() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    let mut wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();

    let seq1 = wal.append(&cmd("a")).unwrap();
    let seq2 = wal.append(&cmd("b")).unwrap();
    assert_eq!(seq1, 1);
    assert_eq!(seq2, 2);

    wal.flush().unwrap();
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn next_unprocessed_reads_in_order_without_explicit_flush() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    let mut wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();

    wal.append(&cmd("a")).unwrap();
    wal.append(&cmd("b")).unwrap();

    let entry1 = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry1.seq, 1);
    assert_eq!(entry1.op, cmd("a"));

    let entry2 = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry2.seq, 2);
    assert_eq!(entry2.op, cmd("b"));

    assert!(wal.next_unprocessed().unwrap().is_none());
}

#[test]
fn mark_processed_advances_processed_seq() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    let mut wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();

    wal.append(&cmd("a")).unwrap();
    wal.flush().unwrap();

    let entry = wal.next_unprocessed().unwrap().unwrap();
    wal.mark_processed(entry.seq);

    assert_eq!(wal.processed_seq(), 1);
}

#[test]
fn reopen_with_processed_seq_skips_already_applied_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");

    {
        let mut wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();
        wal.append(&cmd("a")).unwrap();
        wal.append(&cmd("b")).unwrap();
        wal.append(&cmd("c")).unwrap();
        wal.flush().unwrap();
    }

    let mut wal: Wal<TestOp> = Wal::open(&path, 2).unwrap();
    let entry = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry.seq, 3);
    assert_eq!(entry.op, cmd("c"));
    assert!(wal.next_unprocessed().unwrap().is_none());
}

#[test]
fn entries_after_returns_suffix() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    let mut wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();

    wal.append(&cmd("a")).unwrap();
    wal.append(&cmd("b")).unwrap();
    wal.append(&cmd("c")).unwrap();
    wal.flush().unwrap();

    let entries = wal.entries_after(1).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq, 2);
    assert_eq!(entries[1].seq, 3);
}

#[test]
fn truncate_before_drops_older_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    let mut wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();

    wal.append(&cmd("a")).unwrap();
    wal.append(&cmd("b")).unwrap();
    wal.append(&cmd("c")).unwrap();
    wal.flush().unwrap();

    wal.truncate_before(2).unwrap();

    let entries = wal.entries_after(0).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq, 2);
    assert_eq!(entries[1].seq, 3);
}

/// Control operations like `Shutdown` persist through the WAL like any
/// other op; it's up to the replay caller to special-case them.
#[test]
fn shutdown_op_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");

    {
        let mut wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();
        wal.append(&cmd("a")).unwrap();
        wal.append(&TestOp::Shutdown).unwrap();
        wal.flush().unwrap();
    }

    let mut wal: Wal<TestOp> = Wal::open(&path, 1).unwrap();
    let entries = wal.entries_after(1).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(matches!(entries[0].op, TestOp::Shutdown));

    let entry = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry.seq, 2);
    assert!(matches!(entry.op, TestOp::Shutdown));
    assert!(wal.next_unprocessed().unwrap().is_none());
}

#[test]
fn needs_flush_trips_past_count_threshold() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    let mut wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();

    assert!(!wal.needs_flush());

    for i in 0..101 {
        wal.append(&cmd(&format!("cmd{i}"))).unwrap();
    }

    assert!(wal.needs_flush());
}

#[test]
fn open_with_corrupt_tail_rotates_to_bak_and_keeps_valid_prefix() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");

    {
        let mut wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();
        wal.append(&cmd("a")).unwrap();
        wal.append(&cmd("b")).unwrap();
        wal.flush().unwrap();
    }
    {
        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"not-valid-json\n").unwrap();
    }

    let wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();

    assert_eq!(wal.write_seq(), 2);
    assert!(path.with_extension("bak").exists());

    let entries = wal.entries_after(0).unwrap();
    assert_eq!(entries.len(), 2);
}

#[test]
fn open_with_binary_garbage_rotates_to_bak() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    std::fs::write(&path, b"\x80\x81\x82\xff\xfe\n").unwrap();

    let wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();

    assert_eq!(wal.write_seq(), 0);
    assert!(path.with_extension("bak").exists());
}

#[test]
fn repeated_corruption_rotates_bak_generations_and_evicts_oldest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");

    for round in 1..=4u8 {
        std::fs::write(&path, [round; 8]).unwrap();
        let wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();
        assert_eq!(wal.write_seq(), 0);
    }

    assert_eq!(std::fs::read(path.with_extension("bak")).unwrap(), vec![4u8; 8]);
    assert_eq!(std::fs::read(path.with_extension("bak.2")).unwrap(), vec![3u8; 8]);
    assert_eq!(std::fs::read(path.with_extension("bak.3")).unwrap(), vec![2u8; 8]);
    assert!(!path.with_extension("bak.4").exists());
}

#[test]
fn next_unprocessed_skips_a_corrupt_line_then_resumes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    let mut wal: Wal<TestOp> = Wal::open(&path, 0).unwrap();

    wal.append(&cmd("a")).unwrap();
    wal.flush().unwrap();

    let entry = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry.seq, 1);

    {
        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"corrupt-line\n").unwrap();
    }

    assert!(wal.next_unprocessed().unwrap().is_none());

    wal.append(&cmd("b")).unwrap();
    wal.flush().unwrap();

    let entry = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry.seq, 2);
}
