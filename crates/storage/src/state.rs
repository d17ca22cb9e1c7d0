// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built from WAL replay.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use hub_core::{
    AlertEvent, AlertId, AlertType, Artifact, Event, Robot, RobotEnvBinding, RobotId, RobotVersion,
    RobotVersionId, Run, RunId, RunLog, RunStatus, Schedule, SlaRule, Worker, WorkerId,
    WorkerStatus,
};
use serde::{Deserialize, Serialize};

/// Materialized state derived from replaying the event log.
///
/// Every mutation the engine, scheduler, SLA monitor and worker loop perform
/// is captured as an [`Event`] and folded in here through [`apply_event`].
///
/// # Idempotency requirement
///
/// `apply_event` must be safe to call twice with the same event: once for
/// immediate in-process visibility, and again when the WAL is replayed after
/// a restart. Handlers assign fields rather than accumulate them, and guard
/// insertions that should only happen once.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub robots: HashMap<RobotId, Robot>,
    pub robot_versions: HashMap<RobotVersionId, RobotVersion>,
    /// One schedule per robot, keyed by the owning robot.
    pub schedules: HashMap<RobotId, Schedule>,
    /// One SLA rule per robot, keyed by the owning robot.
    pub sla_rules: HashMap<RobotId, SlaRule>,
    pub env_bindings: Vec<RobotEnvBinding>,
    pub runs: HashMap<RunId, Run>,
    pub run_logs: HashMap<RunId, Vec<RunLog>>,
    pub artifacts: HashMap<RunId, Vec<Artifact>>,
    pub workers: HashMap<WorkerId, Worker>,
    pub alerts: HashMap<AlertId, AlertEvent>,
    /// (robot_id, fire_time) pairs already fired, so a schedule tick replayed
    /// from the WAL never double-fires a run.
    pub fired_schedules: HashSet<(RobotId, DateTime<Utc>)>,
}

impl MaterializedState {
    /// Look up a robot by id or by an unambiguous id prefix.
    pub fn find_robot(&self, id_or_prefix: &str) -> Option<&Robot> {
        if let Ok(id) = id_or_prefix.parse::<RobotId>() {
            if let Some(robot) = self.robots.get(&id) {
                return Some(robot);
            }
        }
        let mut matches = self
            .robots
            .values()
            .filter(|r| r.id.to_string().starts_with(id_or_prefix));
        let first = matches.next()?;
        if matches.next().is_none() {
            Some(first)
        } else {
            None
        }
    }

    /// The currently active version for a robot, if any.
    pub fn active_version(&self, robot_id: RobotId) -> Option<&RobotVersion> {
        self.robot_versions
            .values()
            .filter(|v| v.robot_id == robot_id && v.is_active)
            .max_by_key(|v| v.created_at)
    }

    pub fn versions_for_robot(&self, robot_id: RobotId) -> Vec<&RobotVersion> {
        let mut versions: Vec<_> = self
            .robot_versions
            .values()
            .filter(|v| v.robot_id == robot_id)
            .collect();
        versions.sort_by_key(|v| v.created_at);
        versions
    }

    pub fn schedule_for(&self, robot_id: RobotId) -> Option<&Schedule> {
        self.schedules.get(&robot_id)
    }

    pub fn sla_rule_for(&self, robot_id: RobotId) -> Option<&SlaRule> {
        self.sla_rules.get(&robot_id)
    }

    pub fn env_bindings_for(
        &self,
        robot_id: RobotId,
        env_name: hub_core::EnvName,
    ) -> impl Iterator<Item = &RobotEnvBinding> {
        self.env_bindings
            .iter()
            .filter(move |b| b.robot_id == robot_id && b.env_name == env_name)
    }

    pub fn runs_for_robot(&self, robot_id: RobotId) -> Vec<&Run> {
        let mut runs: Vec<_> = self.runs.values().filter(|r| r.robot_id == robot_id).collect();
        runs.sort_by_key(|r| r.queued_at);
        runs
    }

    /// Count of runs for `robot_id` currently in RUNNING state.
    pub fn running_count(&self, robot_id: RobotId) -> u32 {
        self.runs
            .values()
            .filter(|r| r.robot_id == robot_id && r.status == RunStatus::Running)
            .count() as u32
    }

    /// Pending runs ordered oldest-first, the order `ClaimNext` scans in.
    pub fn pending_runs(&self) -> Vec<&Run> {
        let mut pending: Vec<_> = self
            .runs
            .values()
            .filter(|r| r.status == RunStatus::Pending)
            .collect();
        pending.sort_by_key(|r| r.queued_at);
        pending
    }

    pub fn logs_since(&self, run_id: RunId, after_sequence: u64) -> &[RunLog] {
        match self.run_logs.get(&run_id) {
            Some(logs) => {
                let start = logs.partition_point(|l| l.sequence <= after_sequence);
                &logs[start..]
            }
            None => &[],
        }
    }

    /// The open alert for a (robot, type) pair, if one exists. Invariant:
    /// at most one open alert per (robot_id, alert_type).
    pub fn open_alert(&self, robot_id: RobotId, alert_type: AlertType) -> Option<&AlertEvent> {
        self.alerts
            .values()
            .find(|a| a.robot_id == robot_id && a.alert_type == alert_type && a.is_open())
    }

    /// Apply an event to derive state changes. Must be idempotent: see the
    /// struct-level docs.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::RobotCreated { robot } => {
                self.robots.entry(robot.id).or_insert_with(|| robot.clone());
            }

            Event::RobotVersionPublished { version } => {
                self.robot_versions
                    .entry(version.id)
                    .or_insert_with(|| version.clone());
            }

            Event::RobotVersionActivated { robot_id, version_id } => {
                for version in self.robot_versions.values_mut() {
                    if version.robot_id == *robot_id {
                        version.is_active = version.id == *version_id;
                    }
                }
            }

            Event::ScheduleUpserted { schedule } => {
                self.schedules.insert(schedule.robot_id, schedule.clone());
            }

            Event::ScheduleDeleted { robot_id } => {
                self.schedules.remove(robot_id);
            }

            Event::ScheduleTicked {
                robot_id,
                last_tick_at,
            } => {
                if let Some(schedule) = self.schedules.get_mut(robot_id) {
                    schedule.last_tick_at = *last_tick_at;
                }
            }

            Event::ScheduleFired {
                robot_id,
                fire_time,
                ..
            } => {
                self.fired_schedules.insert((*robot_id, *fire_time));
            }

            Event::SlaUpserted { rule } => {
                self.sla_rules.insert(rule.robot_id, rule.clone());
            }

            Event::EnvSet { binding } => {
                if let Some(existing) = self.env_bindings.iter_mut().find(|b| {
                    b.robot_id == binding.robot_id
                        && b.env_name == binding.env_name
                        && b.key == binding.key
                }) {
                    *existing = binding.clone();
                } else {
                    self.env_bindings.push(binding.clone());
                }
            }

            Event::EnvDeleted {
                robot_id,
                env_name,
                key,
            } => {
                self.env_bindings
                    .retain(|b| !(b.robot_id == *robot_id && b.env_name == *env_name && b.key == *key));
            }

            Event::RunCreated { run } => {
                self.runs.entry(run.id).or_insert_with(|| run.clone());
            }

            Event::RunClaimed { run_id, .. } => {
                if let Some(run) = self.runs.get_mut(run_id) {
                    if run.status == RunStatus::Pending {
                        run.status = RunStatus::Running;
                    }
                }
            }

            Event::RunStarted {
                run_id,
                host_name,
                process_id,
                started_at,
            } => {
                if let Some(run) = self.runs.get_mut(run_id) {
                    run.host_name = Some(host_name.clone());
                    run.process_id = Some(*process_id);
                    run.started_at = Some(*started_at);
                }
            }

            Event::RunLogAppended {
                run_id,
                sequence,
                timestamp,
                level,
                message,
                post_terminal,
            } => {
                let logs = self.run_logs.entry(*run_id).or_default();
                if logs.last().map(|l| l.sequence) != Some(*sequence) {
                    logs.push(RunLog {
                        run_id: *run_id,
                        sequence: *sequence,
                        timestamp: *timestamp,
                        level: *level,
                        message: message.clone(),
                        post_terminal: *post_terminal,
                    });
                }
            }

            Event::RunFinished {
                run_id,
                status,
                finished_at,
                duration_seconds,
                error_message,
                artifacts,
            } => {
                if let Some(run) = self.runs.get_mut(run_id) {
                    run.status = *status;
                    run.finished_at = Some(*finished_at);
                    run.duration_seconds = Some(*duration_seconds);
                    run.error_message.clone_from(error_message);
                }
                if !artifacts.is_empty() {
                    self.artifacts.insert(*run_id, artifacts.clone());
                }
            }

            Event::RunRequeued { run_id, .. } => {
                if let Some(run) = self.runs.get_mut(run_id) {
                    run.status = RunStatus::Pending;
                    run.started_at = None;
                    run.host_name = None;
                    run.process_id = None;
                }
            }

            Event::RunCancelRequested {
                run_id,
                requested_by,
                requested_at,
            } => {
                if let Some(run) = self.runs.get_mut(run_id) {
                    run.cancel_requested = true;
                    run.canceled_at = Some(*requested_at);
                    run.canceled_by = Some(requested_by.clone());
                }
            }

            Event::WorkerRegistered { worker } => {
                self.workers.insert(worker.id, worker.clone());
            }

            Event::WorkerHeartbeat { worker_id, at } => {
                if let Some(worker) = self.workers.get_mut(worker_id) {
                    worker.last_heartbeat = *at;
                }
            }

            Event::WorkerStatusChanged { worker_id, status } => {
                if let Some(worker) = self.workers.get_mut(worker_id) {
                    worker.status = *status;
                }
                let _: WorkerStatus = *status;
            }

            Event::AlertRaised { alert } => {
                self.alerts.entry(alert.id).or_insert_with(|| alert.clone());
            }

            Event::AlertResolved {
                alert_id,
                resolved_at,
            } => {
                if let Some(alert) = self.alerts.get_mut(alert_id) {
                    alert.resolved_at = Some(*resolved_at);
                }
            }

            Event::CleanupPurged { run_ids, .. } => {
                for run_id in run_ids {
                    self.runs.remove(run_id);
                    self.run_logs.remove(run_id);
                    self.artifacts.remove(run_id);
                }
            }

            Event::RunLogsPurged { run_ids, .. } => {
                for run_id in run_ids {
                    self.run_logs.remove(run_id);
                }
            }

            Event::RunArtifactsPurged { run_ids, .. } => {
                for run_id in run_ids {
                    self.artifacts.remove(run_id);
                }
            }

            Event::Custom => {}
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
