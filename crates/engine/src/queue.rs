// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory FIFO hint layered over `MaterializedState::pending_runs`.
//!
//! Store rows are the sole source of truth (§5); the Queue only tracks
//! consecutive claim-eligibility failures so a run that keeps losing the
//! concurrency race doesn't spin hot, and is held out of rotation for a
//! backoff window instead (§4.1 ClaimNext).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hub_core::{Run, RunId};
use hub_storage::MaterializedState;
use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::dispatcher::{self, Ineligible};

#[derive(Debug, Clone, Copy, Default)]
struct Hold {
    consecutive_misses: u32,
    held_until: Option<DateTime<Utc>>,
}

/// FIFO scan with an ineligibility backoff, shared across all `ClaimNext`
/// callers against one `MaterializedState`.
#[derive(Default)]
pub struct Queue {
    holds: Mutex<HashMap<RunId, Hold>>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of runs currently due and not held back — the visible backlog
    /// depth used by `GET /ops/status` and the `QUEUE_BACKLOG` SLA check.
    pub fn depth(&self, state: &MaterializedState, now: DateTime<Utc>) -> usize {
        let holds = self.holds.lock();
        state
            .pending_runs()
            .into_iter()
            .filter(|run| run.queued_at <= now)
            .filter(|run| !Self::is_held(&holds, run.id, now))
            .count()
    }

    /// Return the next run eligible to be claimed, FIFO by `queued_at`,
    /// skipping runs held out after repeated ineligibility. Runs that lose
    /// the eligibility check on this sweep have their miss count advanced;
    /// once a run crosses `claim_ineligible_max_attempts` it is held out for
    /// the backoff window before being reconsidered.
    pub fn next_eligible<'a>(
        &self,
        state: &'a MaterializedState,
        now: DateTime<Utc>,
        config: &EngineConfig,
    ) -> Option<&'a Run> {
        let mut holds = self.holds.lock();
        for run in state.pending_runs() {
            if Self::is_held(&holds, run.id, now) {
                continue;
            }
            match dispatcher::eligibility(state, run, now) {
                Ok(()) => {
                    holds.remove(&run.id);
                    return Some(run);
                }
                Err(Ineligible::NotDue) => continue,
                Err(Ineligible::ConcurrencyCapped) | Err(Ineligible::OutsideWindow) => {
                    let backoff_seconds = state
                        .schedule_for(run.robot_id)
                        .map(|s| s.retry_backoff_seconds)
                        .unwrap_or(config.default_requeue_backoff_seconds);
                    let hold = holds.entry(run.id).or_default();
                    hold.consecutive_misses += 1;
                    if hold.consecutive_misses >= config.claim_ineligible_max_attempts {
                        hold.held_until = Some(now + chrono::Duration::seconds(backoff_seconds as i64));
                        hold.consecutive_misses = 0;
                    }
                }
            }
        }
        None
    }

    fn is_held(holds: &HashMap<RunId, Hold>, run_id: RunId, now: DateTime<Utc>) -> bool {
        holds
            .get(&run_id)
            .and_then(|hold| hold.held_until)
            .is_some_and(|until| until > now)
    }

    pub fn forget(&self, run_id: RunId) {
        self.holds.lock().remove(&run_id);
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
