// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Run entity: one attempt to execute a specific RobotVersion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::define_id;
use crate::event::RuntimePayload;
use crate::robot::{RobotId, RobotVersionId};
use crate::schedule::ScheduleId;

define_id! {
    /// Identifies one run.
    pub struct RunId;
}

define_id! {
    /// Identifies an output artifact produced by a run.
    pub struct ArtifactId;
}

/// Deployment environment a run executes against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnvName {
    Prod,
    Hml,
    Test,
}

impl FromStr for EnvName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROD" => Ok(Self::Prod),
            "HML" => Ok(Self::Hml),
            "TEST" => Ok(Self::Test),
            other => Err(format!("unknown env_name: {other}")),
        }
    }
}

impl std::fmt::Display for EnvName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EnvName::Prod => "PROD",
            EnvName::Hml => "HML",
            EnvName::Test => "TEST",
        };
        write!(f, "{s}")
    }
}

/// Origin of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerType {
    Manual,
    Scheduled,
    Retry,
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TriggerType::Manual => "MANUAL",
            TriggerType::Scheduled => "SCHEDULED",
            TriggerType::Retry => "RETRY",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle state of a run. See `hub-engine`'s state machine for transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Success | RunStatus::Failed | RunStatus::Canceled
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Pending => "PENDING",
            RunStatus::Running => "RUNNING",
            RunStatus::Success => "SUCCESS",
            RunStatus::Failed => "FAILED",
            RunStatus::Canceled => "CANCELED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "RUNNING" => Ok(Self::Running),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            "CANCELED" => Ok(Self::Canceled),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

/// A single attempt to execute a [`RobotVersion`](crate::robot::RobotVersion).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub robot_id: RobotId,
    pub robot_version_id: RobotVersionId,
    pub service_id: Option<String>,
    pub schedule_id: Option<ScheduleId>,
    pub env_name: EnvName,
    pub trigger_type: TriggerType,
    pub attempt: u32,
    pub runtime_payload: RuntimePayload,
    pub status: RunStatus,
    pub queued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub triggered_by: Option<String>,
    pub host_name: Option<String>,
    pub process_id: Option<u32>,
    pub error_message: Option<String>,
    pub cancel_requested: bool,
    pub canceled_at: Option<DateTime<Utc>>,
    pub canceled_by: Option<String>,
}

/// Parameters accepted by `CreateRun`.
pub struct CreateRunInput {
    pub robot_id: RobotId,
    pub robot_version_id: RobotVersionId,
    pub env_name: EnvName,
    pub runtime_payload: RuntimePayload,
    pub trigger_type: TriggerType,
    pub triggered_by: Option<String>,
    pub attempt: u32,
    pub schedule_id: Option<ScheduleId>,
    pub service_id: Option<String>,
}

impl Run {
    pub fn new(id: RunId, input: CreateRunInput, queued_at: DateTime<Utc>) -> Self {
        Self {
            id,
            robot_id: input.robot_id,
            robot_version_id: input.robot_version_id,
            service_id: input.service_id,
            schedule_id: input.schedule_id,
            env_name: input.env_name,
            trigger_type: input.trigger_type,
            attempt: input.attempt,
            runtime_payload: input.runtime_payload,
            status: RunStatus::Pending,
            queued_at,
            started_at: None,
            finished_at: None,
            duration_seconds: None,
            triggered_by: input.triggered_by,
            host_name: None,
            process_id: None,
            error_message: None,
            cancel_requested: false,
            canceled_at: None,
            canceled_by: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn can_retry(&self, retry_count: u32) -> bool {
        self.status == RunStatus::Failed
            && self.trigger_type != TriggerType::Manual
            && self.attempt <= retry_count
    }
}

/// Severity of a [`RunLog`] line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

/// One line of a run's log, ordered by `sequence` within the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    pub run_id: RunId,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Set when the log was appended after the run reached a terminal state.
    #[serde(default)]
    pub post_terminal: bool,
}

/// A file a run declared as output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub run_id: RunId,
    pub name: String,
    pub path: String,
    pub size_bytes: u64,
    pub content_type: Option<String>,
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
