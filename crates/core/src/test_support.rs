// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::event::{Event, RuntimePayload};
use crate::robot::{ArtifactKind, Channel, EntrypointKind, Robot, RobotId, RobotVersion, RobotVersionId, SourceMeta};
use crate::run::{CreateRunInput, EnvName, Run, RunId, TriggerType};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};

pub fn sample_robot(name: &str) -> Robot {
    Robot::new(RobotId::new(), name, Utc::now())
}

pub fn sample_version(robot_id: RobotId) -> RobotVersion {
    RobotVersion {
        id: RobotVersionId::new(),
        robot_id,
        version: "1.0.0".to_string(),
        channel: Channel::Stable,
        changelog: String::new(),
        artifact_kind: ArtifactKind::Zip,
        artifact_digest: "0".repeat(64),
        entrypoint_kind: EntrypointKind::Script,
        entrypoint_path: "main.py".to_string(),
        default_arguments: Vec::new(),
        default_env: BTreeMap::new(),
        working_dir: None,
        required_env_keys: BTreeSet::new(),
        source_meta: SourceMeta::user(),
        is_active: true,
        created_at: Utc::now(),
    }
}

pub fn sample_run(robot_id: RobotId, robot_version_id: RobotVersionId) -> Run {
    Run::new(
        RunId::new(),
        CreateRunInput {
            robot_id,
            robot_version_id,
            env_name: EnvName::Test,
            runtime_payload: RuntimePayload::default(),
            trigger_type: TriggerType::Manual,
            triggered_by: Some("test-harness".to_string()),
            attempt: 1,
            schedule_id: None,
            service_id: None,
        },
        Utc::now(),
    )
}

pub fn robot_created_event(name: &str) -> Event {
    Event::RobotCreated {
        robot: sample_robot(name),
    }
}

pub fn run_created_event(robot_id: RobotId, robot_version_id: RobotVersionId) -> Event {
    Event::RunCreated {
        run: sample_run(robot_id, robot_version_id),
    }
}
