// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use hub_core::test_support::{sample_robot, sample_run, sample_version};
use hub_core::{Event, RunStatus};
use hub_storage::MaterializedState;

fn state_with_run() -> (MaterializedState, Run) {
    let mut state = MaterializedState::default();
    let robot = sample_robot("etl");
    let version = sample_version(robot.id);
    let run = sample_run(robot.id, version.id);
    state.apply_event(&Event::RobotCreated { robot });
    state.apply_event(&Event::RobotVersionPublished { version });
    state.apply_event(&Event::RunCreated { run: run.clone() });
    (state, run)
}

#[test]
fn pending_run_due_now_with_no_schedule_is_eligible() {
    let (state, run) = state_with_run();
    assert_eq!(eligibility(&state, &run, Utc::now()), Ok(()));
}

#[test]
fn run_not_yet_due_is_ineligible() {
    let (state, mut run) = state_with_run();
    run.queued_at = Utc::now() + chrono::Duration::seconds(60);
    assert_eq!(eligibility(&state, &run, Utc::now()), Err(Ineligible::NotDue));
}

#[test]
fn running_run_is_not_eligible_again() {
    let (state, mut run) = state_with_run();
    run.status = RunStatus::Running;
    assert_eq!(eligibility(&state, &run, Utc::now()), Err(Ineligible::NotDue));
}

#[test]
fn concurrency_cap_blocks_a_second_running_run_for_the_same_robot() {
    let (mut state, run) = state_with_run();
    let mut already_running = run.clone();
    already_running.id = hub_core::RunId::new();
    already_running.status = RunStatus::Running;
    state.apply_event(&Event::RunCreated { run: already_running });

    assert_eq!(eligibility(&state, &run, Utc::now()), Err(Ineligible::ConcurrencyCapped));
}
