// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backup reclaim for `RUNNING` runs the worker itself never finished. Two
//! independent failure modes, both force-finished here:
//!
//! - **Worker lost**: the per-run timeout enforced by the Worker itself
//!   (§4.3) only fires while that worker is alive. A run is reclaimed as
//!   `"worker lost"` once it has been `RUNNING` for longer than
//!   `watchdog_margin_seconds` (`2 * worker_stale_seconds` by default) past
//!   either its `started_at`, matched against its reporting worker's
//!   heartbeat, or — if the worker crashed before ever calling
//!   `ReportStart` — its `queued_at`, since `Run` carries no claim timestamp
//!   of its own.
//! - **Timeout backup** (§5): even with a live, heartbeating worker, a child
//!   process can overrun its timeout without the Worker's own deadline ever
//!   firing (a hung `tokio` task, a runtime that never yields). A run whose
//!   `now - started_at > timeout + watchdog_margin_seconds` is force-failed
//!   as `"TIMEOUT"` regardless of worker liveness.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hub_clock::Clock;
use hub_core::{Event, HubResult, IdGen, Run, RunId, RunStatus};
use hub_storage::MaterializedState;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::run_engine::RunEngine;

pub struct Watchdog<C: Clock, G: IdGen> {
    engine: Arc<RunEngine<C, G>>,
}

impl<C: Clock, G: IdGen> Watchdog<C, G> {
    pub fn new(engine: Arc<RunEngine<C, G>>) -> Self {
        Self { engine }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(
            self.engine.config().sla_monitor_interval_seconds,
        ));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.tick() {
                        warn!(error = %err, "watchdog tick failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("watchdog shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// Force-fail every `RUNNING` run that has either overrun its timeout or
    /// whose reporting worker has gone silent. Returns the number of runs
    /// reclaimed.
    pub fn tick(&self) -> HubResult<usize> {
        let now = self.engine.clock().now();
        let margin = self.engine.config().watchdog_margin_seconds as i64;
        let default_timeout = self.engine.config().default_manual_timeout_seconds;

        let stuck: Vec<(RunId, &'static str)> = self.engine.store().with_state(|state| {
            state
                .runs
                .values()
                .filter(|run| run.status == RunStatus::Running)
                .filter_map(|run| reclaim_reason(run, state, now, margin, default_timeout).map(|reason| (run.id, reason)))
                .collect()
        });

        for (run_id, reason) in &stuck {
            self.engine
                .force_finish(*run_id, RunStatus::Failed, Some(reason.to_string()))?;
        }
        Ok(stuck.len())
    }
}

/// Run timeout in seconds: the robot's schedule, or the configured manual
/// default, mirroring `WorkerLoop::run_timeout`.
fn run_timeout_seconds(run: &Run, state: &MaterializedState, default_timeout: u64) -> i64 {
    run.schedule_id
        .and_then(|_| state.schedule_for(run.robot_id).map(|s| s.timeout_seconds))
        .unwrap_or(default_timeout) as i64
}

/// Reason to force-finish `run`, if any: a timeout overrun regardless of
/// worker liveness, or a worker that has gone silent.
fn reclaim_reason(
    run: &Run,
    state: &MaterializedState,
    now: DateTime<Utc>,
    margin_seconds: i64,
    default_timeout: u64,
) -> Option<&'static str> {
    if let Some(started_at) = run.started_at {
        let timeout = run_timeout_seconds(run, state, default_timeout);
        if now.signed_duration_since(started_at).num_seconds() > timeout + margin_seconds {
            return Some("TIMEOUT");
        }
    }

    if is_orphaned(run, state, now, margin_seconds) {
        return Some("worker lost");
    }

    None
}

fn is_orphaned(run: &Run, state: &MaterializedState, now: DateTime<Utc>, margin_seconds: i64) -> bool {
    match (&run.host_name, run.started_at) {
        (Some(host_name), Some(started_at)) => {
            if now.signed_duration_since(started_at).num_seconds() < margin_seconds {
                return false;
            }
            match state.workers.values().find(|w| &w.hostname == host_name) {
                Some(worker) => worker.is_stale(now, margin_seconds),
                None => true, // worker deregistered entirely
            }
        }
        // Claimed but the worker crashed before ever reporting a start.
        _ => now.signed_duration_since(run.queued_at).num_seconds() >= margin_seconds,
    }
}

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;
