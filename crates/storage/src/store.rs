// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composes the WAL, materialized state and checkpointer into the single
//! durable store the engine drives.

use std::path::{Path, PathBuf};

use hub_core::Event;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;

use crate::checkpoint::{load_snapshot, CheckpointError, CheckpointResult, Checkpointer};
use crate::snapshot::SnapshotError;
use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

struct Inner {
    wal: Wal,
    state: MaterializedState,
}

/// The durable store backing `hub-engine`'s `MaterializedState`.
///
/// Wraps the WAL and materialized state behind a single [`parking_lot::Mutex`],
/// which doubles as the advisory lock serializing state-mutating operations
/// (`CreateRun`, `ClaimNext`, and friends) across the daemon.
pub struct Store {
    inner: Mutex<Inner>,
    checkpointer: Checkpointer,
    wal_path: PathBuf,
    snapshot_path: PathBuf,
}

impl Store {
    /// Open (or create) a store rooted at `data_dir`, replaying the last
    /// snapshot and any WAL entries written after it.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir)?;
        let wal_path = data_dir.join("wal.jsonl");
        let snapshot_path = data_dir.join("snapshot.json");

        let snapshot = load_snapshot(&snapshot_path)?;
        let (mut state, processed_seq) = match snapshot {
            Some(s) => {
                info!(seq = s.seq, "restored snapshot");
                (s.state, s.seq)
            }
            None => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(&wal_path, processed_seq)?;
        let replayed = wal.entries_after(processed_seq)?;
        let replayed_count = replayed.len();
        for entry in replayed {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
        }
        info!(replayed = replayed_count, "replayed WAL entries");

        Ok(Self {
            inner: Mutex::new(Inner { wal, state }),
            checkpointer: Checkpointer::new(snapshot_path.clone()),
            wal_path,
            snapshot_path,
        })
    }

    /// Append an event, applying it to the materialized state before
    /// releasing the lock. Flushes the WAL immediately if the group-commit
    /// threshold has been reached.
    pub fn append(&self, event: Event) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock();
        let seq = inner.wal.append(&event)?;
        if inner.wal.needs_flush() {
            inner.wal.flush()?;
        }
        inner.state.apply_event(&event);
        inner.wal.mark_processed(seq);
        Ok(seq)
    }

    /// Force any buffered WAL entries to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        Ok(self.inner.lock().wal.flush()?)
    }

    /// Run `f` against the current materialized state under the advisory
    /// lock. Keep `f` cheap: it holds the lock for every other caller.
    pub fn with_state<R>(&self, f: impl FnOnce(&MaterializedState) -> R) -> R {
        f(&self.inner.lock().state)
    }

    /// Snapshot the current state and truncate the WAL up to that point.
    ///
    /// Safe to call concurrently with `append`: the state clone happens
    /// under the lock, but the (slow) serialize+compress+fsync work runs
    /// outside it.
    pub fn checkpoint(&self) -> Result<CheckpointResult, StoreError> {
        let (seq, state) = {
            let inner = self.inner.lock();
            (inner.wal.processed_seq(), inner.state.clone())
        };
        let result = self.checkpointer.checkpoint_sync(seq, &state)?;
        self.inner.lock().wal.truncate_before(seq)?;
        Ok(result)
    }

    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
