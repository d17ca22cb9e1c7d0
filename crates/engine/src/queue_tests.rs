// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hub_core::test_support::{sample_robot, sample_run, sample_version};
use hub_core::{Event, RunStatus};

fn two_pending_runs_same_robot() -> (MaterializedState, Run, Run) {
    let mut state = MaterializedState::default();
    let robot = sample_robot("etl");
    let version = sample_version(robot.id);
    state.apply_event(&Event::RobotCreated { robot: robot.clone() });
    state.apply_event(&Event::RobotVersionPublished { version: version.clone() });

    let mut first = sample_run(robot.id, version.id);
    first.status = RunStatus::Running; // occupies the default max_concurrency=1 slot
    let second = sample_run(robot.id, version.id);

    state.apply_event(&Event::RunCreated { run: first.clone() });
    state.apply_event(&Event::RunCreated { run: second.clone() });
    (state, first, second)
}

#[test]
fn returns_the_only_eligible_run() {
    let mut state = MaterializedState::default();
    let robot = sample_robot("etl");
    let version = sample_version(robot.id);
    let run = sample_run(robot.id, version.id);
    state.apply_event(&Event::RobotCreated { robot });
    state.apply_event(&Event::RobotVersionPublished { version });
    state.apply_event(&Event::RunCreated { run: run.clone() });

    let queue = Queue::new();
    let config = EngineConfig::default();
    let found = queue.next_eligible(&state, Utc::now(), &config).unwrap();
    assert_eq!(found.id, run.id);
}

#[test]
fn concurrency_capped_run_is_held_out_after_max_attempts() {
    let (state, _first, second) = two_pending_runs_same_robot();
    let queue = Queue::new();
    let mut config = EngineConfig::default();
    config.claim_ineligible_max_attempts = 2;
    let now = Utc::now();

    assert!(queue.next_eligible(&state, now, &config).is_none());
    assert!(queue.next_eligible(&state, now, &config).is_none());

    let holds = queue.holds.lock();
    let hold = holds.get(&second.id).expect("hold recorded");
    assert!(hold.held_until.unwrap() > now);
}

#[test]
fn forget_clears_a_runs_hold_state() {
    let (state, _first, second) = two_pending_runs_same_robot();
    let queue = Queue::new();
    let config = EngineConfig::default();
    let now = Utc::now();
    queue.next_eligible(&state, now, &config);
    queue.forget(second.id);
    assert!(queue.holds.lock().get(&second.id).is_none());
}

#[test]
fn depth_counts_due_runs_not_held_back() {
    let (state, _first, _second) = two_pending_runs_same_robot();
    let queue = Queue::new();
    let now = Utc::now();
    // Only `second` is PENDING; `first` is already RUNNING.
    assert_eq!(queue.depth(&state, now), 1);
}
