// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hub_clock::FakeClock;
use hub_core::test_support::{sample_robot, sample_run, sample_version};
use hub_core::{RobotId, RobotVersionId, SequentialIdGen, Worker, WorkerId, WorkerStatus};
use tempfile::tempdir;

type TestWatchdog = Watchdog<FakeClock, SequentialIdGen>;

struct Harness {
    watchdog: TestWatchdog,
    engine: Arc<RunEngine<FakeClock, SequentialIdGen>>,
    robot_id: RobotId,
    version_id: RobotVersionId,
    _dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let dir = tempdir().unwrap();
    let store = Arc::new(hub_storage::Store::open(dir.path()).unwrap());
    let robot = sample_robot("etl");
    let version = sample_version(robot.id);
    store.append(Event::RobotCreated { robot: robot.clone() }).unwrap();
    store
        .append(Event::RobotVersionPublished { version: version.clone() })
        .unwrap();

    let clock = FakeClock::new(Utc::now());
    let engine = Arc::new(RunEngine::new(
        store,
        clock,
        SequentialIdGen::new(),
        crate::config::EngineConfig::default(),
        Arc::new(crate::log_bus::LogBus::new()),
    ));
    let watchdog = Watchdog::new(engine.clone());
    Harness {
        watchdog,
        engine,
        robot_id: robot.id,
        version_id: version.id,
        _dir: dir,
    }
}

fn register_worker(h: &Harness, hostname: &str, last_heartbeat: DateTime<Utc>) -> WorkerId {
    let worker_id = WorkerId::new();
    h.engine
        .store()
        .append(Event::WorkerRegistered {
            worker: Worker {
                id: worker_id,
                hostname: hostname.to_string(),
                status: WorkerStatus::Running,
                last_heartbeat,
                version: "1.0.0".to_string(),
            },
        })
        .unwrap();
    worker_id
}

fn running_run(h: &Harness, host_name: Option<&str>, started_at: Option<DateTime<Utc>>, queued_at: DateTime<Utc>) -> RunId {
    let mut run = sample_run(h.robot_id, h.version_id);
    run.status = RunStatus::Running;
    run.queued_at = queued_at;
    run.started_at = started_at;
    run.host_name = host_name.map(str::to_string);
    let run_id = run.id;
    h.engine.store().append(Event::RunCreated { run }).unwrap();
    run_id
}

#[test]
fn reclaims_a_run_whose_reporting_worker_has_gone_stale() {
    let h = harness();
    let now = h.engine.clock().now();
    let margin = h.engine.config().watchdog_margin_seconds as i64;

    register_worker(&h, "worker-1", now - chrono::Duration::seconds(margin + 60));
    let run_id = running_run(
        &h,
        Some("worker-1"),
        Some(now - chrono::Duration::seconds(margin + 30)),
        now - chrono::Duration::seconds(margin + 40),
    );

    let reclaimed = h.watchdog.tick().unwrap();
    assert_eq!(reclaimed, 1);
    let run = h.engine.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.error_message.as_deref(), Some("worker lost"));
}

#[test]
fn leaves_a_run_alone_while_its_worker_is_still_heartbeating() {
    let h = harness();
    let now = h.engine.clock().now();
    let margin = h.engine.config().watchdog_margin_seconds as i64;

    register_worker(&h, "worker-1", now);
    let run_id = running_run(
        &h,
        Some("worker-1"),
        Some(now - chrono::Duration::seconds(margin + 30)),
        now - chrono::Duration::seconds(margin + 40),
    );

    let reclaimed = h.watchdog.tick().unwrap();
    assert_eq!(reclaimed, 0);
    assert_eq!(h.engine.get_run(run_id).unwrap().status, RunStatus::Running);
}

#[test]
fn reclaims_a_run_whose_worker_has_fully_deregistered() {
    let h = harness();
    let now = h.engine.clock().now();
    let margin = h.engine.config().watchdog_margin_seconds as i64;

    // No worker row at all for "worker-gone".
    let run_id = running_run(
        &h,
        Some("worker-gone"),
        Some(now - chrono::Duration::seconds(margin + 30)),
        now - chrono::Duration::seconds(margin + 40),
    );

    let reclaimed = h.watchdog.tick().unwrap();
    assert_eq!(reclaimed, 1);
    assert_eq!(h.engine.get_run(run_id).unwrap().status, RunStatus::Failed);
}

#[test]
fn reclaims_a_claimed_run_whose_worker_died_before_reporting_start() {
    let h = harness();
    let now = h.engine.clock().now();
    let margin = h.engine.config().watchdog_margin_seconds as i64;

    let run_id = running_run(&h, None, None, now - chrono::Duration::seconds(margin + 10));

    let reclaimed = h.watchdog.tick().unwrap();
    assert_eq!(reclaimed, 1);
    assert_eq!(h.engine.get_run(run_id).unwrap().status, RunStatus::Failed);
}

#[test]
fn leaves_a_freshly_claimed_run_with_no_start_report_alone() {
    let h = harness();
    let now = h.engine.clock().now();

    let run_id = running_run(&h, None, None, now - chrono::Duration::seconds(5));

    let reclaimed = h.watchdog.tick().unwrap();
    assert_eq!(reclaimed, 0);
    assert_eq!(h.engine.get_run(run_id).unwrap().status, RunStatus::Running);
}

#[test]
fn reclaims_a_run_past_its_timeout_even_with_a_live_worker() {
    let h = harness();
    let now = h.engine.clock().now();
    let default_timeout = h.engine.config().default_manual_timeout_seconds as i64;
    let margin = h.engine.config().watchdog_margin_seconds as i64;

    register_worker(&h, "worker-1", now);
    let run_id = running_run(
        &h,
        Some("worker-1"),
        Some(now - chrono::Duration::seconds(default_timeout + margin + 30)),
        now - chrono::Duration::seconds(default_timeout + margin + 40),
    );

    let reclaimed = h.watchdog.tick().unwrap();
    assert_eq!(reclaimed, 1);
    let run = h.engine.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.error_message.as_deref(), Some("TIMEOUT"));
}

#[test]
fn never_touches_a_terminal_run() {
    let h = harness();
    let now = h.engine.clock().now();
    let margin = h.engine.config().watchdog_margin_seconds as i64;

    let mut run = sample_run(h.robot_id, h.version_id);
    run.status = RunStatus::Success;
    run.queued_at = now - chrono::Duration::seconds(margin + 1000);
    run.started_at = Some(run.queued_at);
    run.finished_at = Some(now - chrono::Duration::seconds(margin + 900));
    let run_id = run.id;
    h.engine.store().append(Event::RunCreated { run }).unwrap();

    assert_eq!(h.watchdog.tick().unwrap(), 0);
    assert_eq!(h.engine.get_run(run_id).unwrap().status, RunStatus::Success);
}
