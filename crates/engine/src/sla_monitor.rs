// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic SLA evaluation: scans run history, queue depth and worker
//! heartbeats against each robot's `SlaRule`, raising or auto-resolving the
//! four alert types. At most one open alert per `(robot_id, alert_type)`
//! (`MaterializedState::open_alert`) — `WORKER_DOWN` and `QUEUE_BACKLOG` are
//! therefore evaluated against the sentinel robot id
//! (`hub_core::global_alert_robot_id`) and combined into a single alert each.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use hub_clock::Clock;
use hub_core::{
    global_alert_robot_id, AlertEvent, AlertId, AlertType, Event, HubResult, IdGen, RobotId,
    RunStatus, SlaRule, WallClock,
};
use hub_storage::MaterializedState;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::store_fault;
use crate::run_engine::RunEngine;

pub struct SlaMonitor<C: Clock, G: IdGen> {
    engine: Arc<RunEngine<C, G>>,
}

impl<C: Clock, G: IdGen> SlaMonitor<C, G> {
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
                        warn!(error = %err, "sla monitor tick failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("sla monitor shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// One sweep over every configured `SlaRule` plus the two global
    /// checks. Returns the number of alerts raised or resolved.
    pub fn tick(&self) -> HubResult<usize> {
        let now = self.engine.clock().now();
        let rules = self
            .engine
            .store()
            .with_state(|state| state.sla_rules.values().cloned().collect::<Vec<_>>());

        let mut changes = 0;
        for rule in &rules {
            if rule.alert_on_late {
                changes += self.evaluate(rule.robot_id, AlertType::Late, now, |state| {
                    self.is_late(state, rule, now)
                })?;
            }
            if rule.alert_on_failure {
                changes += self.evaluate(rule.robot_id, AlertType::FailureStreak, now, |state| {
                    self.is_failure_streak(state, rule.robot_id)
                })?;
            }
        }

        changes += self.evaluate(global_alert_robot_id(), AlertType::WorkerDown, now, |state| {
            self.stale_workers(state, now)
        })?;
        changes += self.evaluate(global_alert_robot_id(), AlertType::QueueBacklog, now, |state| {
            let depth = self.engine.queue().depth(state, now) as u64;
            if depth >= self.engine.config().queue_backlog_alert_threshold {
                Some(format!("queue depth {depth}"))
            } else {
                None
            }
        })?;

        Ok(changes)
    }

    /// Raise, leave open, or auto-resolve the one alert of `alert_type` for
    /// `robot_id` based on `condition`, which returns `Some(message)` when
    /// the condition currently holds.
    fn evaluate(
        &self,
        robot_id: RobotId,
        alert_type: AlertType,
        now: DateTime<Utc>,
        condition: impl FnOnce(&MaterializedState) -> Option<String>,
    ) -> HubResult<usize> {
        let (message, open) = self.engine.store().with_state(|state| {
            (condition(state), state.open_alert(robot_id, alert_type).cloned())
        });

        match (message, open) {
            (Some(message), None) => {
                let alert = AlertEvent {
                    id: AlertId::from_uuid(self.engine.ids().next()),
                    robot_id,
                    run_id: None,
                    alert_type,
                    severity: alert_type.default_severity(),
                    message,
                    metadata: BTreeMap::new(),
                    created_at: now,
                    resolved_at: None,
                };
                self.engine
                    .store()
                    .append(Event::AlertRaised { alert })
                    .map_err(store_fault)?;
                Ok(1)
            }
            (None, Some(open)) => {
                self.engine
                    .store()
                    .append(Event::AlertResolved {
                        alert_id: open.id,
                        resolved_at: now,
                    })
                    .map_err(store_fault)?;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    fn is_late(&self, state: &MaterializedState, rule: &SlaRule, now: DateTime<Utc>) -> Option<String> {
        let runs = state.runs_for_robot(rule.robot_id);
        if runs.is_empty() {
            return None; // nothing has ever run; nothing to be late about
        }

        if let Some(every) = rule.expected_every_minutes {
            let last_success = runs
                .iter()
                .filter(|r| r.status == RunStatus::Success)
                .filter_map(|r| r.finished_at)
                .max();
            let deadline_minutes = every as i64 + rule.late_after_minutes as i64;
            let late = match last_success {
                Some(finished_at) => (now - finished_at).num_minutes() > deadline_minutes,
                None => true,
            };
            if late {
                return Some(format!("no successful run in the last {deadline_minutes} minutes"));
            }
        }

        if let Some(expected) = rule.expected_daily_time {
            let tz = state.schedule_for(rule.robot_id).map(|s| s.timezone).unwrap_or(chrono_tz::UTC);
            let local_now = now.with_timezone(&tz);
            let today = local_now.date_naive();
            let Some(wall_now) = WallClock::new(local_now.hour() as u8, local_now.minute() as u8) else {
                return None;
            };
            let deadline_minute = expected.hour as u32 * 60 + expected.minute as u32 + rule.late_after_minutes;
            let now_minute = wall_now.hour as u32 * 60 + wall_now.minute as u32;
            if now_minute > deadline_minute {
                let succeeded_today = runs.iter().any(|r| {
                    r.status == RunStatus::Success
                        && r.finished_at
                            .is_some_and(|t| t.with_timezone(&tz).date_naive() == today)
                });
                if !succeeded_today {
                    return Some(format!("no successful run today by {expected}"));
                }
            }
        }

        None
    }

    fn is_failure_streak(&self, state: &MaterializedState, robot_id: RobotId) -> Option<String> {
        let threshold = self.engine.config().failure_streak_threshold;
        let mut terminal: Vec<_> = state
            .runs_for_robot(robot_id)
            .into_iter()
            .filter(|r| r.status.is_terminal())
            .collect();
        if terminal.len() < threshold {
            return None;
        }
        terminal.sort_by_key(|r| r.queued_at);
        let last_n = &terminal[terminal.len() - threshold..];
        if last_n.iter().all(|r| r.status == RunStatus::Failed) {
            Some(format!("last {threshold} runs all failed"))
        } else {
            None
        }
    }

    fn stale_workers(&self, state: &MaterializedState, now: DateTime<Utc>) -> Option<String> {
        let stale_after = self.engine.config().worker_stale_seconds;
        let mut stale: Vec<_> = state
            .workers
            .values()
            .filter(|w| w.status != hub_core::WorkerStatus::Stopped && w.is_stale(now, stale_after))
            .map(|w| w.hostname.clone())
            .collect();
        if stale.is_empty() {
            return None;
        }
        stale.sort();
        Some(format!("stale workers: {}", stale.join(", ")))
    }
}

#[cfg(test)]
#[path = "sla_monitor_tests.rs"]
mod tests;
