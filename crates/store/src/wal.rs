// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Workyard Authors

//! Append-only write-ahead log.
//!
//! Each line is a JSON-encoded [`WalEntry`] carrying a monotonically
//! increasing sequence number. `append` assigns the sequence and writes the
//! line through the raw file handle immediately; `flush` only controls the
//! durability (`sync_data`) boundary, not visibility — entries are readable
//! by `next_unprocessed`/`entries_after` as soon as `append` returns.
//!
//! Corruption (partial writes, non-UTF8 bytes, a line that fails to parse)
//! is expected after a crash mid-write. `open` scans the file once, keeps
//! the valid prefix, and rotates anything after the first bad line into a
//! `.bak` file (up to [`MAX_BAK_FILES`] generations) rather than failing.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::backup::rotate_bak;
use crate::error::StoreResult;

const FLUSH_COUNT_THRESHOLD: usize = 100;
const FLUSH_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry<Op> {
    pub seq: u64,
    pub op: Op,
}

pub struct Wal<Op> {
    path: PathBuf,
    file: File,
    write_seq: u64,
    processed_seq: u64,
    read_pos: u64,
    unflushed: usize,
    last_flush: Instant,
    _op: PhantomData<Op>,
}

impl<Op> Wal<Op>
where
    Op: Serialize + DeserializeOwned,
{
    /// Opens (creating if absent) the WAL at `path`. `processed_seq` is the
    /// last sequence number the caller already durably applied elsewhere
    /// (e.g. into a snapshot); entries at or below it are skipped by
    /// [`Wal::next_unprocessed`].
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            File::create(&path)?;
        }

        let write_seq = Self::recover(&path)?;

        let file = OpenOptions::new().read(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file,
            write_seq,
            processed_seq,
            read_pos: 0,
            unflushed: 0,
            last_flush: Instant::now(),
            _op: PhantomData,
        })
    }

    /// Scans the file front-to-back, keeping the valid monotonic prefix. If
    /// a line fails to parse, the original file is rotated to `.bak` and
    /// replaced by one containing only the valid prefix. Returns the
    /// sequence number of the last valid entry (i.e. the new `write_seq`).
    fn recover(path: &Path) -> StoreResult<u64> {
        let bytes = fs::read(path)?;
        let mut valid_lines = Vec::new();
        let mut seq = 0u64;
        let mut corrupt = false;

        for line in bytes.split(|&b| b == b'\n') {
            if line.is_empty() {
                continue;
            }
            match std::str::from_utf8(line).ok().and_then(|s| {
                serde_json::from_str::<WalEntry<Op>>(s)
                    .ok()
                    .map(|e| (s.to_string(), e.seq))
            }) {
                Some((text, entry_seq)) if entry_seq == seq + 1 => {
                    seq = entry_seq;
                    valid_lines.push(text);
                }
                _ => {
                    corrupt = true;
                    break;
                }
            }
        }

        if corrupt {
            rotate_bak(path)?;
            let mut rewritten = String::new();
            for line in &valid_lines {
                rewritten.push_str(line);
                rewritten.push('\n');
            }
            fs::write(path, rewritten)?;
        }

        Ok(seq)
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn needs_flush(&self) -> bool {
        self.unflushed >= FLUSH_COUNT_THRESHOLD || self.last_flush.elapsed() >= FLUSH_INTERVAL
    }

    /// Appends `op`, assigning it the next sequence number. The write lands
    /// in the OS page cache immediately; call [`Wal::flush`] to fsync it.
    pub fn append(&mut self, op: &Op) -> StoreResult<u64> {
        let seq = self.write_seq + 1;
        let entry = WalEntry { seq, op };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.write_seq = seq;
        self.unflushed += 1;
        Ok(seq)
    }

    pub fn flush(&mut self) -> StoreResult<()> {
        self.file.sync_data()?;
        self.unflushed = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    /// Returns the next entry with `seq > processed_seq` that has not yet
    /// been returned by this cursor, or `None` at end-of-file. A line that
    /// fails to parse is skipped (the cursor advances past it) and `None`
    /// is returned for that call; the next call resumes after it.
    pub fn next_unprocessed(&mut self) -> StoreResult<Option<WalEntry<Op>>> {
        let mut reader = BufReader::new(&self.file);
        loop {
            reader.seek(SeekFrom::Start(self.read_pos))?;
            let mut line = String::new();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                return Ok(None);
            }
            self.read_pos += read as u64;

            let trimmed = line.trim_end_matches('\n');
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<WalEntry<Op>>(trimmed) {
                Ok(entry) if entry.seq > self.processed_seq => return Ok(Some(entry)),
                Ok(_) => continue,
                Err(_) => return Ok(None),
            }
        }
    }

    pub fn mark_processed(&mut self, seq: u64) {
        if seq > self.processed_seq {
            self.processed_seq = seq;
        }
    }

    /// Returns every entry with `seq > since`, scanning from the start of
    /// the file independently of the `next_unprocessed` cursor. Stops at
    /// the first entry that fails to parse.
    pub fn entries_after(&self, since: u64) -> StoreResult<Vec<WalEntry<Op>>> {
        let mut file = File::open(&self.path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let mut out = Vec::new();
        for line in contents.lines() {
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<WalEntry<Op>>(line) {
                Ok(entry) => {
                    if entry.seq > since {
                        out.push(entry);
                    }
                }
                Err(_) => break,
            }
        }
        Ok(out)
    }

    /// Rewrites the WAL keeping only entries with `seq >= seq`, for
    /// snapshot-driven compaction. Resets the read cursor.
    pub fn truncate_before(&mut self, seq: u64) -> StoreResult<()> {
        let kept = self.entries_after(seq.saturating_sub(1))?;
        let mut rewritten = String::new();
        for entry in &kept {
            let mut line = serde_json::to_string(entry)?;
            line.push('\n');
            rewritten.push_str(&line);
        }
        fs::write(&self.path, rewritten)?;
        self.file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        self.read_pos = 0;
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
