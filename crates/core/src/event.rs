// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events that drive the materialized state. Every mutation the RunEngine,
//! Scheduler, SLAMonitor and Worker loops perform is captured as one of
//! these variants, appended to the WAL, and replayed into
//! `hub_storage::MaterializedState::apply_event`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::env_binding::RobotEnvBinding;
use crate::robot::{Robot, RobotId, RobotVersion, RobotVersionId};
use crate::run::{Artifact, EnvName, LogLevel, Run, RunId, RunStatus};
use crate::schedule::Schedule;
use crate::sla::{AlertEvent, AlertId, SlaRule};
use crate::worker::{Worker, WorkerId, WorkerStatus};
use chrono::{DateTime, Utc};

/// Events recorded in the write-ahead log.
///
/// Serializes with `{"type": "namespace:action", ...fields}`. Unknown type
/// tags deserialize to `Custom`, so the WAL can be extended without breaking
/// replay of older entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- robot --
    #[serde(rename = "robot:created")]
    RobotCreated { robot: Robot },

    #[serde(rename = "robot:version_published")]
    RobotVersionPublished { version: RobotVersion },

    #[serde(rename = "robot:version_activated")]
    RobotVersionActivated {
        robot_id: RobotId,
        version_id: RobotVersionId,
    },

    // -- schedule --
    #[serde(rename = "schedule:upserted")]
    ScheduleUpserted { schedule: Schedule },

    #[serde(rename = "schedule:deleted")]
    ScheduleDeleted { robot_id: RobotId },

    #[serde(rename = "schedule:ticked")]
    ScheduleTicked {
        robot_id: RobotId,
        last_tick_at: DateTime<Utc>,
    },

    #[serde(rename = "schedule:fired")]
    ScheduleFired {
        robot_id: RobotId,
        fire_time: DateTime<Utc>,
        run_id: RunId,
    },

    // -- sla --
    #[serde(rename = "sla:upserted")]
    SlaUpserted { rule: SlaRule },

    // -- env --
    #[serde(rename = "env:set")]
    EnvSet { binding: RobotEnvBinding },

    #[serde(rename = "env:deleted")]
    EnvDeleted {
        robot_id: RobotId,
        env_name: EnvName,
        key: String,
    },

    // -- run --
    #[serde(rename = "run:created")]
    RunCreated { run: Run },

    #[serde(rename = "run:claimed")]
    RunClaimed {
        run_id: RunId,
        worker_id: WorkerId,
        claimed_at: DateTime<Utc>,
    },

    #[serde(rename = "run:started")]
    RunStarted {
        run_id: RunId,
        host_name: String,
        process_id: u32,
        started_at: DateTime<Utc>,
    },

    #[serde(rename = "run:log_appended")]
    RunLogAppended {
        run_id: RunId,
        sequence: u64,
        timestamp: DateTime<Utc>,
        level: LogLevel,
        message: String,
        post_terminal: bool,
    },

    #[serde(rename = "run:finished")]
    RunFinished {
        run_id: RunId,
        status: RunStatus,
        finished_at: DateTime<Utc>,
        duration_seconds: f64,
        error_message: Option<String>,
        artifacts: Vec<Artifact>,
    },

    #[serde(rename = "run:requeued")]
    RunRequeued {
        run_id: RunId,
        not_before: DateTime<Utc>,
    },

    #[serde(rename = "run:cancel_requested")]
    RunCancelRequested {
        run_id: RunId,
        requested_by: String,
        requested_at: DateTime<Utc>,
    },

    // -- worker --
    #[serde(rename = "worker:registered")]
    WorkerRegistered { worker: Worker },

    #[serde(rename = "worker:heartbeat")]
    WorkerHeartbeat {
        worker_id: WorkerId,
        at: DateTime<Utc>,
    },

    #[serde(rename = "worker:status_changed")]
    WorkerStatusChanged {
        worker_id: WorkerId,
        status: WorkerStatus,
    },

    // -- alert --
    #[serde(rename = "alert:raised")]
    AlertRaised { alert: AlertEvent },

    #[serde(rename = "alert:resolved")]
    AlertResolved {
        alert_id: AlertId,
        resolved_at: DateTime<Utc>,
    },

    // -- cleanup --
    #[serde(rename = "cleanup:purged")]
    CleanupPurged {
        run_ids: Vec<RunId>,
        purged_at: DateTime<Utc>,
    },

    /// Drops a terminal run's log lines once `log_retention_days` has
    /// elapsed, independent of the run row's own `run_retention_days`.
    #[serde(rename = "cleanup:logs_purged")]
    RunLogsPurged {
        run_ids: Vec<RunId>,
        purged_at: DateTime<Utc>,
    },

    /// Drops a terminal run's output artifacts once `artifact_retention_days`
    /// has elapsed, independent of the run row's own `run_retention_days`.
    #[serde(rename = "cleanup:artifacts_purged")]
    RunArtifactsPurged {
        run_ids: Vec<RunId>,
        purged_at: DateTime<Utc>,
    },

    /// Catch-all for unknown event types (forward compatibility).
    #[serde(other, skip_serializing)]
    Custom,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::RobotCreated { .. } => "robot:created",
            Event::RobotVersionPublished { .. } => "robot:version_published",
            Event::RobotVersionActivated { .. } => "robot:version_activated",
            Event::ScheduleUpserted { .. } => "schedule:upserted",
            Event::ScheduleDeleted { .. } => "schedule:deleted",
            Event::ScheduleTicked { .. } => "schedule:ticked",
            Event::ScheduleFired { .. } => "schedule:fired",
            Event::SlaUpserted { .. } => "sla:upserted",
            Event::EnvSet { .. } => "env:set",
            Event::EnvDeleted { .. } => "env:deleted",
            Event::RunCreated { .. } => "run:created",
            Event::RunClaimed { .. } => "run:claimed",
            Event::RunStarted { .. } => "run:started",
            Event::RunLogAppended { .. } => "run:log_appended",
            Event::RunFinished { .. } => "run:finished",
            Event::RunRequeued { .. } => "run:requeued",
            Event::RunCancelRequested { .. } => "run:cancel_requested",
            Event::WorkerRegistered { .. } => "worker:registered",
            Event::WorkerHeartbeat { .. } => "worker:heartbeat",
            Event::WorkerStatusChanged { .. } => "worker:status_changed",
            Event::AlertRaised { .. } => "alert:raised",
            Event::AlertResolved { .. } => "alert:resolved",
            Event::CleanupPurged { .. } => "cleanup:purged",
            Event::RunLogsPurged { .. } => "cleanup:logs_purged",
            Event::RunArtifactsPurged { .. } => "cleanup:artifacts_purged",
            Event::Custom => "custom",
        }
    }

    /// Run this event pertains to, if any. Used by the LogBus to route
    /// WAL-replayed `RunLogAppended` entries without a full state scan.
    pub fn run_id(&self) -> Option<RunId> {
        match self {
            Event::RunCreated { run } => Some(run.id),
            Event::RunClaimed { run_id, .. }
            | Event::RunStarted { run_id, .. }
            | Event::RunLogAppended { run_id, .. }
            | Event::RunFinished { run_id, .. }
            | Event::RunRequeued { run_id, .. }
            | Event::RunCancelRequested { run_id, .. } => Some(*run_id),
            Event::ScheduleFired { run_id, .. } => Some(*run_id),
            _ => None,
        }
    }

    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            Event::RobotCreated { robot } => format!("{t} id={} name={}", robot.id, robot.name),
            Event::RobotVersionPublished { version } => {
                format!("{t} robot={} version={}", version.robot_id, version.version)
            }
            Event::RobotVersionActivated { robot_id, version_id } => {
                format!("{t} robot={robot_id} version={version_id}")
            }
            Event::ScheduleUpserted { schedule } => format!("{t} robot={}", schedule.robot_id),
            Event::ScheduleDeleted { robot_id } => format!("{t} robot={robot_id}"),
            Event::ScheduleTicked { robot_id, .. } => format!("{t} robot={robot_id}"),
            Event::ScheduleFired { robot_id, run_id, .. } => {
                format!("{t} robot={robot_id} run={run_id}")
            }
            Event::SlaUpserted { rule } => format!("{t} robot={}", rule.robot_id),
            Event::EnvSet { binding } => format!(
                "{t} robot={} env={} key={}",
                binding.robot_id, binding.env_name, binding.key
            ),
            Event::EnvDeleted {
                robot_id,
                env_name,
                key,
            } => format!("{t} robot={robot_id} env={env_name} key={key}"),
            Event::RunCreated { run } => format!("{t} id={} robot={}", run.id, run.robot_id),
            Event::RunClaimed { run_id, worker_id, .. } => {
                format!("{t} run={run_id} worker={worker_id}")
            }
            Event::RunStarted { run_id, host_name, .. } => {
                format!("{t} run={run_id} host={host_name}")
            }
            Event::RunLogAppended { run_id, sequence, level, .. } => {
                format!("{t} run={run_id} seq={sequence} level={level}")
            }
            Event::RunFinished { run_id, status, .. } => format!("{t} run={run_id} status={status}"),
            Event::RunRequeued { run_id, .. } => format!("{t} run={run_id}"),
            Event::RunCancelRequested { run_id, .. } => format!("{t} run={run_id}"),
            Event::WorkerRegistered { worker } => format!("{t} id={}", worker.id),
            Event::WorkerHeartbeat { worker_id, .. } => format!("{t} id={worker_id}"),
            Event::WorkerStatusChanged { worker_id, status } => {
                format!("{t} id={worker_id} status={status:?}")
            }
            Event::AlertRaised { alert } => format!("{t} robot={} type={:?}", alert.robot_id, alert.alert_type),
            Event::AlertResolved { alert_id, .. } => format!("{t} id={alert_id}"),
            Event::CleanupPurged { run_ids, .. } => format!("{t} count={}", run_ids.len()),
            Event::RunLogsPurged { run_ids, .. } => format!("{t} count={}", run_ids.len()),
            Event::RunArtifactsPurged { run_ids, .. } => format!("{t} count={}", run_ids.len()),
            Event::Custom => t.to_string(),
        }
    }
}

/// Runtime arguments and overlay env supplied on the execute payload, carried
/// through as a distinct type so the queue/worker layers don't need to know
/// about HTTP request shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimePayload {
    #[serde(default)]
    pub runtime_arguments: Vec<String>,
    #[serde(default)]
    pub runtime_env: BTreeMap<String, String>,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
