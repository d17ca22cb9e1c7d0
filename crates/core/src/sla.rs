// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-robot SLA policy and the alerts it produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::define_id;
use crate::robot::RobotId;
use crate::run::RunId;
use crate::schedule::WallClock;

define_id! {
    /// Identifies a robot's SLA rule. One rule per robot.
    pub struct SlaRuleId;
}

define_id! {
    /// Identifies an alert event.
    pub struct AlertId;
}

/// Sentinel robot id used for alerts that are global rather than per-robot
/// (currently only `QUEUE_BACKLOG`).
pub fn global_alert_robot_id() -> RobotId {
    RobotId::from_uuid(uuid::Uuid::nil())
}

/// The SLA policy attached to a robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaRule {
    pub id: SlaRuleId,
    pub robot_id: RobotId,
    pub expected_every_minutes: Option<u32>,
    pub expected_daily_time: Option<WallClock>,
    pub late_after_minutes: u32,
    pub alert_on_failure: bool,
    pub alert_on_late: bool,
    pub notify_channels: BTreeMap<String, String>,
}

/// Kind of condition an [`AlertEvent`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    Late,
    FailureStreak,
    WorkerDown,
    QueueBacklog,
}

/// Severity of an [`AlertEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warn,
    Critical,
}

impl AlertType {
    /// Default severity for a freshly raised alert of this type.
    pub fn default_severity(&self) -> Severity {
        match self {
            AlertType::Late => Severity::Warn,
            AlertType::FailureStreak => Severity::Critical,
            AlertType::WorkerDown => Severity::Critical,
            AlertType::QueueBacklog => Severity::Warn,
        }
    }
}

/// A raised (and eventually resolved) SLA condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: AlertId,
    pub robot_id: RobotId,
    pub run_id: Option<RunId>,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl AlertEvent {
    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }
}

#[cfg(test)]
#[path = "sla_tests.rs"]
mod tests;
