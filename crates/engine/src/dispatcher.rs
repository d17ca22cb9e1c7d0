// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Eligibility filter applied inside `ClaimNext`. Dispatch is pull-based: the
//! Dispatcher has no loop of its own, it is embodied in this predicate plus
//! the Queue's FIFO scan (`queue.rs`).

use chrono::{DateTime, Timelike, Utc};
use hub_core::{Run, RunStatus, Schedule, TriggerType, WallClock};
use hub_storage::MaterializedState;

/// Why a run was not handed to the claiming worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    /// `run.queued_at` (or a post-backoff hold) is still in the future.
    NotDue,
    /// The robot already has `schedule.max_concurrency` runs `RUNNING`.
    ConcurrencyCapped,
    /// A `SCHEDULED` run outside its schedule's local-time window.
    OutsideWindow,
}

/// Default per-robot concurrency when no schedule is configured.
pub const DEFAULT_MAX_CONCURRENCY: u32 = 1;

/// Evaluate whether `run` may transition to `RUNNING` right now.
pub fn eligibility(
    state: &MaterializedState,
    run: &Run,
    now: DateTime<Utc>,
) -> Result<(), Ineligible> {
    if run.status != RunStatus::Pending {
        // Already claimed or terminal; not an eligibility failure, just stale.
        return Err(Ineligible::NotDue);
    }
    if run.queued_at > now {
        return Err(Ineligible::NotDue);
    }

    let schedule = state.schedule_for(run.robot_id);
    let max_concurrency = schedule.map(|s| s.max_concurrency).unwrap_or(DEFAULT_MAX_CONCURRENCY);
    if state.running_count(run.robot_id) >= max_concurrency {
        return Err(Ineligible::ConcurrencyCapped);
    }

    if run.trigger_type == TriggerType::Scheduled {
        if let Some(schedule) = schedule {
            if !within_window(schedule, now) {
                return Err(Ineligible::OutsideWindow);
            }
        }
    }

    Ok(())
}

fn within_window(schedule: &Schedule, now: DateTime<Utc>) -> bool {
    let local = now.with_timezone(&schedule.timezone);
    match WallClock::new(local.hour() as u8, local.minute() as u8) {
        Some(wall) => schedule.in_window(wall),
        None => true,
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
