// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use hub_core::test_support::{sample_robot, sample_run, sample_version};
use hub_core::{Event, LogLevel};
use std::sync::Arc;
use tempfile::tempdir;

fn log(run_id: RunId, sequence: u64, message: &str) -> RunLog {
    RunLog {
        run_id,
        sequence,
        timestamp: Utc::now(),
        level: LogLevel::Info,
        message: message.to_string(),
        post_terminal: false,
    }
}

#[tokio::test]
async fn subscribe_receives_a_published_log() {
    let bus = LogBus::new();
    let run_id = RunId::new();
    let mut rx = bus.subscribe(run_id);
    bus.publish(log(run_id, 1, "hello"));
    let received = rx.recv().await.unwrap();
    assert_eq!(received.message, "hello");
}

#[tokio::test]
async fn stream_since_replays_persisted_history_then_live_lines_in_order() {
    let dir = tempdir().unwrap();
    let store = Arc::new(Store::open(dir.path()).unwrap());
    let robot = sample_robot("etl");
    let version = sample_version(robot.id);
    let run = sample_run(robot.id, version.id);
    store.append(Event::RobotCreated { robot }).unwrap();
    store.append(Event::RobotVersionPublished { version }).unwrap();
    store.append(Event::RunCreated { run: run.clone() }).unwrap();
    store
        .append(Event::RunLogAppended {
            run_id: run.id,
            sequence: 1,
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: "persisted-1".to_string(),
            post_terminal: false,
        })
        .unwrap();

    let bus = Arc::new(LogBus::new());
    let mut rx = bus.stream_since(&store, run.id, 0);

    // Give the spawned forwarder a chance to drain catch-up before the live
    // publish, exercising the seamless handover.
    let first = rx.recv().await.unwrap();
    assert_eq!(first.sequence, 1);
    assert_eq!(first.message, "persisted-1");

    bus.publish(log(run.id, 2, "live-2"));
    let second = rx.recv().await.unwrap();
    assert_eq!(second.sequence, 2);
    assert_eq!(second.message, "live-2");
}

#[tokio::test]
async fn stream_since_skips_a_live_line_already_covered_by_catch_up() {
    let dir = tempdir().unwrap();
    let store = Arc::new(Store::open(dir.path()).unwrap());
    let robot = sample_robot("etl");
    let version = sample_version(robot.id);
    let run = sample_run(robot.id, version.id);
    store.append(Event::RobotCreated { robot }).unwrap();
    store.append(Event::RobotVersionPublished { version }).unwrap();
    store.append(Event::RunCreated { run: run.clone() }).unwrap();
    store
        .append(Event::RunLogAppended {
            run_id: run.id,
            sequence: 1,
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: "persisted-1".to_string(),
            post_terminal: false,
        })
        .unwrap();

    let bus = Arc::new(LogBus::new());
    let mut rx = bus.stream_since(&store, run.id, 0);
    // A live publish that duplicates the already-persisted sequence (a
    // worker occasionally re-announces a line crossing the catch-up/live
    // handover) must not reach the subscriber twice.
    bus.publish(log(run.id, 1, "persisted-1"));
    bus.publish(log(run.id, 2, "live-2"));

    let first = rx.recv().await.unwrap();
    assert_eq!(first.sequence, 1);
    let second = rx.recv().await.unwrap();
    assert_eq!(second.sequence, 2);
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::mpsc::error::TryRecvError::Empty)
    ));
}
