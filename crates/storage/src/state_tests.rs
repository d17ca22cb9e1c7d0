// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hub_core::test_support::{robot_created_event, run_created_event, sample_robot, sample_version};
use hub_core::{
    AlertEvent, AlertId, AlertType, Event, RobotVersionId, RunId, Severity, WorkerId, WorkerStatus,
};
use std::collections::BTreeMap;

#[test]
fn robot_created_is_idempotent() {
    let mut state = MaterializedState::default();
    let event = robot_created_event("alpha");
    state.apply_event(&event);
    state.apply_event(&event);
    assert_eq!(state.robots.len(), 1);
}

#[test]
fn activating_a_version_deactivates_siblings() {
    let mut state = MaterializedState::default();
    let robot = sample_robot("alpha");
    let mut v1 = sample_version(robot.id);
    let mut v2 = sample_version(robot.id);
    v1.is_active = true;
    v2.is_active = false;
    let v2_id = v2.id;
    state.apply_event(&Event::RobotCreated { robot: robot.clone() });
    state.apply_event(&Event::RobotVersionPublished { version: v1 });
    state.apply_event(&Event::RobotVersionPublished { version: v2 });

    state.apply_event(&Event::RobotVersionActivated {
        robot_id: robot.id,
        version_id: v2_id,
    });

    let active = state.active_version(robot.id).unwrap();
    assert_eq!(active.id, v2_id);
    assert_eq!(
        state
            .versions_for_robot(robot.id)
            .iter()
            .filter(|v| v.is_active)
            .count(),
        1
    );
}

#[test]
fn run_claimed_transitions_pending_to_running_once() {
    let mut state = MaterializedState::default();
    let robot = sample_robot("alpha");
    let version = sample_version(robot.id);
    let create = run_created_event(robot.id, version.id);
    state.apply_event(&create);

    let run_id = match &create {
        Event::RunCreated { run } => run.id,
        _ => unreachable!(),
    };

    let claimed = Event::RunClaimed {
        run_id,
        worker_id: WorkerId::new(),
        claimed_at: chrono::Utc::now(),
    };
    state.apply_event(&claimed);
    state.apply_event(&claimed);

    assert_eq!(state.runs[&run_id].status, hub_core::RunStatus::Running);
}

#[test]
fn run_log_append_is_idempotent_on_sequence() {
    let mut state = MaterializedState::default();
    let run_id = RunId::new();
    let appended = Event::RunLogAppended {
        run_id,
        sequence: 1,
        timestamp: chrono::Utc::now(),
        level: hub_core::LogLevel::Info,
        message: "starting".into(),
        post_terminal: false,
    };
    state.apply_event(&appended);
    state.apply_event(&appended);

    assert_eq!(state.run_logs[&run_id].len(), 1);
}

#[test]
fn logs_since_returns_only_newer_entries() {
    let mut state = MaterializedState::default();
    let run_id = RunId::new();
    for seq in 1..=3 {
        state.apply_event(&Event::RunLogAppended {
            run_id,
            sequence: seq,
            timestamp: chrono::Utc::now(),
            level: hub_core::LogLevel::Info,
            message: format!("line {seq}"),
            post_terminal: false,
        });
    }
    let since = state.logs_since(run_id, 1);
    assert_eq!(since.len(), 2);
    assert_eq!(since[0].sequence, 2);
}

#[test]
fn cleanup_purge_removes_run_and_its_logs() {
    let mut state = MaterializedState::default();
    let run_id = RunId::new();
    state.apply_event(&Event::RunLogAppended {
        run_id,
        sequence: 1,
        timestamp: chrono::Utc::now(),
        level: hub_core::LogLevel::Info,
        message: "hi".into(),
        post_terminal: false,
    });
    state.apply_event(&Event::CleanupPurged {
        run_ids: vec![run_id],
        purged_at: chrono::Utc::now(),
    });

    assert!(!state.run_logs.contains_key(&run_id));
}

#[test]
fn open_alert_respects_one_per_robot_and_type_invariant() {
    let mut state = MaterializedState::default();
    let robot_id = hub_core::RobotId::new();
    let alert = AlertEvent {
        id: AlertId::new(),
        robot_id,
        run_id: None,
        alert_type: AlertType::Late,
        severity: Severity::Warn,
        message: "late".into(),
        metadata: BTreeMap::new(),
        created_at: chrono::Utc::now(),
        resolved_at: None,
    };
    state.apply_event(&Event::AlertRaised { alert: alert.clone() });
    assert!(state.open_alert(robot_id, AlertType::Late).is_some());

    state.apply_event(&Event::AlertResolved {
        alert_id: alert.id,
        resolved_at: chrono::Utc::now(),
    });
    assert!(state.open_alert(robot_id, AlertType::Late).is_none());
}

#[test]
fn worker_heartbeat_updates_last_heartbeat() {
    let mut state = MaterializedState::default();
    let worker = hub_core::Worker {
        id: WorkerId::new(),
        hostname: "worker-1".into(),
        status: WorkerStatus::Running,
        last_heartbeat: chrono::Utc::now() - chrono::Duration::minutes(5),
        version: "1.0.0".into(),
    };
    let worker_id = worker.id;
    state.apply_event(&Event::WorkerRegistered { worker });
    let now = chrono::Utc::now();
    state.apply_event(&Event::WorkerHeartbeat {
        worker_id,
        at: now,
    });
    assert_eq!(state.workers[&worker_id].last_heartbeat, now);
}

#[test]
fn find_robot_resolves_unambiguous_prefix() {
    let mut state = MaterializedState::default();
    let robot = sample_robot("alpha");
    state.apply_event(&Event::RobotCreated { robot: robot.clone() });

    let prefix = &robot.id.to_string()[..8];
    let found = state.find_robot(prefix).unwrap();
    assert_eq!(found.id, robot.id);
}

#[test]
fn pending_runs_are_ordered_oldest_first() {
    let mut state = MaterializedState::default();
    let robot = sample_robot("alpha");
    let version_id = RobotVersionId::new();
    let older = run_created_event(robot.id, version_id);
    std::thread::sleep(std::time::Duration::from_millis(2));
    let newer = run_created_event(robot.id, version_id);
    state.apply_event(&newer);
    state.apply_event(&older);

    let pending = state.pending_runs();
    assert_eq!(pending.len(), 2);
    assert!(pending[0].queued_at <= pending[1].queued_at);
}
