// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for the hub: write-ahead log, materialized state, and
//! periodic zstd-compressed snapshots for crash recovery.

mod checkpoint;
mod migration;
mod snapshot;
mod state;
mod store;
mod wal;

/// Bump when [`state::MaterializedState`]'s on-disk shape changes, and
/// register a [`migration::Migration`] from the prior version.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

pub use checkpoint::{
    CheckpointError, CheckpointHandle, CheckpointResult, CheckpointWriter, Checkpointer,
    FsCheckpointWriter, load_snapshot,
};
pub use migration::{Migration, MigrationError, MigrationRegistry};
pub use snapshot::{Snapshot, SnapshotError};
pub use state::MaterializedState;
pub use store::{Store, StoreError};
pub use wal::{Wal, WalEntry, WalError};
