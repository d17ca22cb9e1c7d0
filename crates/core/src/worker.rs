// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker registration and liveness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a worker process, stable across restarts.
    pub struct WorkerId;
}

/// Lifecycle state of a worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkerStatus {
    Running,
    Paused,
    Stopped,
}

/// One worker process registered with the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub hostname: String,
    pub status: WorkerStatus,
    pub last_heartbeat: DateTime<Utc>,
    pub version: String,
}

impl Worker {
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after_seconds: i64) -> bool {
        (now - self.last_heartbeat).num_seconds() > stale_after_seconds
    }

    pub fn accepts_claims(&self) -> bool {
        self.status == WorkerStatus::Running
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
