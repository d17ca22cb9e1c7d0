// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hub_clock::FakeClock;
use hub_core::test_support::{sample_robot, sample_version};
use hub_core::{RobotId, RobotVersionId, SequentialIdGen, SlaRuleId, Worker, WorkerId, WorkerStatus};
use tempfile::tempdir;

type TestMonitor = SlaMonitor<FakeClock, SequentialIdGen>;

struct Harness {
    monitor: TestMonitor,
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
    let monitor = SlaMonitor::new(engine.clone());
    Harness {
        monitor,
        engine,
        robot_id: robot.id,
        version_id: version.id,
        _dir: dir,
    }
}

fn rule(robot_id: RobotId) -> SlaRule {
    SlaRule {
        id: SlaRuleId::new(),
        robot_id,
        expected_every_minutes: Some(30),
        expected_daily_time: None,
        late_after_minutes: 10,
        alert_on_failure: true,
        alert_on_late: true,
        notify_channels: BTreeMap::new(),
    }
}

fn finished_run(
    robot_id: RobotId,
    version_id: RobotVersionId,
    status: RunStatus,
    finished_at: DateTime<Utc>,
) -> hub_core::Run {
    let mut run = hub_core::test_support::sample_run(robot_id, version_id);
    run.status = status;
    run.started_at = Some(finished_at - chrono::Duration::seconds(5));
    run.finished_at = Some(finished_at);
    run.queued_at = finished_at - chrono::Duration::seconds(10);
    run
}

#[test]
fn late_alert_raises_once_the_expected_interval_plus_grace_elapses() {
    let Harness { monitor, engine, robot_id, version_id, .. } = harness();
    let now = engine.clock().now();
    engine.store().append(Event::SlaUpserted { rule: rule(robot_id) }).unwrap();
    let last_success = finished_run(robot_id, version_id, RunStatus::Success, now - chrono::Duration::minutes(50));
    engine.store().append(Event::RunCreated { run: last_success }).unwrap();

    let changes = monitor.tick().unwrap();
    assert_eq!(changes, 1);
    let open = engine
        .store()
        .with_state(|s| s.open_alert(robot_id, AlertType::Late).cloned());
    assert!(open.is_some());
}

#[test]
fn late_alert_auto_resolves_once_a_fresh_success_lands() {
    let Harness { monitor, engine, robot_id, version_id, .. } = harness();
    let now = engine.clock().now();
    engine.store().append(Event::SlaUpserted { rule: rule(robot_id) }).unwrap();
    let stale = finished_run(robot_id, version_id, RunStatus::Success, now - chrono::Duration::minutes(50));
    engine.store().append(Event::RunCreated { run: stale }).unwrap();
    monitor.tick().unwrap();
    assert!(engine
        .store()
        .with_state(|s| s.open_alert(robot_id, AlertType::Late).is_some()));

    let fresh = finished_run(robot_id, version_id, RunStatus::Success, now);
    engine.store().append(Event::RunCreated { run: fresh }).unwrap();
    let changes = monitor.tick().unwrap();
    assert_eq!(changes, 1);
    assert!(engine
        .store()
        .with_state(|s| s.open_alert(robot_id, AlertType::Late).is_none()));
}

#[test]
fn failure_streak_raises_once_the_threshold_of_consecutive_failures_is_hit() {
    let Harness { monitor, engine, robot_id, version_id, .. } = harness();
    let now = engine.clock().now();
    let mut r = rule(robot_id);
    r.alert_on_late = false; // isolate the failure-streak path
    engine.store().append(Event::SlaUpserted { rule: r }).unwrap();

    for i in 0..3 {
        let run = finished_run(
            robot_id,
            version_id,
            RunStatus::Failed,
            now - chrono::Duration::minutes(3 - i),
        );
        engine.store().append(Event::RunCreated { run }).unwrap();
    }

    let changes = monitor.tick().unwrap();
    assert_eq!(changes, 1);
    assert!(engine
        .store()
        .with_state(|s| s.open_alert(robot_id, AlertType::FailureStreak).is_some()));
}

#[test]
fn failure_streak_does_not_raise_when_a_recent_run_succeeded() {
    let Harness { monitor, engine, robot_id, version_id, .. } = harness();
    let now = engine.clock().now();
    let mut r = rule(robot_id);
    r.alert_on_late = false;
    engine.store().append(Event::SlaUpserted { rule: r }).unwrap();

    let statuses = [RunStatus::Failed, RunStatus::Success, RunStatus::Failed];
    for (i, status) in statuses.into_iter().enumerate() {
        let run = finished_run(robot_id, version_id, status, now - chrono::Duration::minutes(3 - i as i64));
        engine.store().append(Event::RunCreated { run }).unwrap();
    }

    assert_eq!(monitor.tick().unwrap(), 0);
}

#[test]
fn worker_down_raises_for_a_stale_worker_and_resolves_after_a_heartbeat() {
    let Harness { monitor, engine, .. } = harness();
    let now = engine.clock().now();
    let worker_id = WorkerId::new();
    engine
        .store()
        .append(Event::WorkerRegistered {
            worker: Worker {
                id: worker_id,
                hostname: "worker-1".to_string(),
                status: WorkerStatus::Running,
                last_heartbeat: now - chrono::Duration::seconds(1000),
                version: "1.0.0".to_string(),
            },
        })
        .unwrap();

    let sentinel = hub_core::global_alert_robot_id();
    assert_eq!(monitor.tick().unwrap(), 1);
    assert!(engine
        .store()
        .with_state(|s| s.open_alert(sentinel, AlertType::WorkerDown).is_some()));

    engine
        .store()
        .append(Event::WorkerHeartbeat {
            worker_id,
            at: now,
        })
        .unwrap();
    assert_eq!(monitor.tick().unwrap(), 1);
    assert!(engine
        .store()
        .with_state(|s| s.open_alert(sentinel, AlertType::WorkerDown).is_none()));
}

#[test]
fn queue_backlog_raises_once_pending_depth_meets_the_threshold() {
    let Harness { monitor, engine, robot_id, version_id, .. } = harness();
    let mut config = crate::config::EngineConfig::default();
    config.queue_backlog_alert_threshold = 2;
    let engine = Arc::new(RunEngine::new(
        engine.store().clone(),
        engine.clock().clone(),
        SequentialIdGen::new(),
        config,
        engine.log_bus().clone(),
    ));
    let monitor = SlaMonitor::new(engine.clone());

    for _ in 0..2 {
        let run = hub_core::test_support::sample_run(robot_id, version_id);
        engine.store().append(Event::RunCreated { run }).unwrap();
    }
    // `sample_run` stamps `queued_at` with the real wall clock; nudge the
    // fake clock past it so the backlog scan sees both runs as due.
    engine.clock().advance(chrono::Duration::seconds(1));

    let sentinel = hub_core::global_alert_robot_id();
    assert_eq!(monitor.tick().unwrap(), 1);
    assert!(engine
        .store()
        .with_state(|s| s.open_alert(sentinel, AlertType::QueueBacklog).is_some()));
}

#[test]
fn a_steady_state_condition_does_not_re_raise_on_every_tick() {
    let Harness { monitor, engine, robot_id, version_id, .. } = harness();
    let now = engine.clock().now();
    engine.store().append(Event::SlaUpserted { rule: rule(robot_id) }).unwrap();
    let stale = finished_run(robot_id, version_id, RunStatus::Success, now - chrono::Duration::minutes(50));
    engine.store().append(Event::RunCreated { run: stale }).unwrap();

    assert_eq!(monitor.tick().unwrap(), 1);
    assert_eq!(monitor.tick().unwrap(), 0);
}
