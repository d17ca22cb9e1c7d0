// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pub/sub fan-out for live log lines, keyed by run id.
//!
//! Grounded on the daemon's wake/notify split in `oj-daemon::event_bus`,
//! adapted from a single wake signal to a per-run `tokio::sync::broadcast`
//! channel so that every subscriber of a run sees the same total order.
//! Persistence to Store happens in `RunEngine::append_log`, before
//! publishing here, so a subscriber that misses a broadcast frame can always
//! recover it from the catch-up read.

use std::collections::HashMap;

use hub_core::{RunId, RunLog};
use hub_storage::Store;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};

const CHANNEL_CAPACITY: usize = 1024;

/// Per-run broadcast hub. One channel is created lazily on first publish or
/// subscribe and dropped once its last subscriber disconnects and no new one
/// has arrived (channels are otherwise kept alive for the run's lifetime by
/// whichever caller published or subscribed first).
#[derive(Default)]
pub struct LogBus {
    channels: Mutex<HashMap<RunId, broadcast::Sender<RunLog>>>,
}

impl LogBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn channel(&self, run_id: RunId) -> broadcast::Sender<RunLog> {
        self.channels
            .lock()
            .entry(run_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Publish a line already persisted to Store. Ignored if nobody is
    /// listening.
    pub fn publish(&self, log: RunLog) {
        let _ = self.channel(log.run_id).send(log);
    }

    /// Raw live subscription, no catch-up. Most callers want
    /// [`LogBus::stream_since`] instead.
    pub fn subscribe(&self, run_id: RunId) -> broadcast::Receiver<RunLog> {
        self.channel(run_id).subscribe()
    }

    /// Catch-up-then-live handover: read every persisted line with
    /// `sequence > after_sequence` from Store, then seamlessly continue with
    /// the live broadcast, filtering out any line whose sequence was already
    /// delivered during catch-up. The caller receives a single ordered
    /// stream with no duplicates and no gaps (§4.7).
    pub fn stream_since(
        self: &std::sync::Arc<Self>,
        store: &std::sync::Arc<Store>,
        run_id: RunId,
        after_sequence: u64,
    ) -> mpsc::Receiver<RunLog> {
        // Subscribe before reading catch-up so no live line published during
        // the read is lost to the handover race.
        let mut live = self.subscribe(run_id);
        let catch_up = store.with_state(|state| state.logs_since(run_id, after_sequence).to_vec());
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut cursor = after_sequence;
            for log in catch_up {
                cursor = cursor.max(log.sequence);
                if tx.send(log).await.is_err() {
                    return;
                }
            }
            loop {
                match live.recv().await {
                    Ok(log) => {
                        if log.sequence <= cursor {
                            continue;
                        }
                        cursor = log.sequence;
                        if tx.send(log).await.is_err() {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });

        rx
    }
}

#[cfg(test)]
#[path = "log_bus_tests.rs"]
mod tests;
