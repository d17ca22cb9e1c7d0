// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use hub_core::{LogLevel, TriggerType};

use crate::harness::harness;

#[tokio::test]
async fn a_late_subscriber_catches_up_then_sees_the_same_live_order_as_an_early_one() {
    let h = harness(|_| {});

    let run_id = h
        .engine
        .create_run(hub_engine::CreateRunParams {
            robot_id: h.robot_id,
            version_id: Some(h.version_id),
            env_name: hub_core::EnvName::Prod,
            runtime_payload: Default::default(),
            trigger_type: TriggerType::Manual,
            triggered_by: Some("operator".to_string()),
            attempt: 1,
            schedule_id: None,
            service_id: None,
            not_before: None,
        })
        .expect("create run");

    let mut early = h.engine.log_bus().stream_since(h.engine.store(), run_id, 0);

    h.engine.append_log(run_id, LogLevel::Info, "line one".to_string()).expect("log");
    h.engine.append_log(run_id, LogLevel::Info, "line two".to_string()).expect("log");

    let mut late = h.engine.log_bus().stream_since(h.engine.store(), run_id, 0);

    h.engine.append_log(run_id, LogLevel::Info, "line three".to_string()).expect("log");

    let expected = ["line one", "line two", "line three"];
    for expected_message in expected {
        let log = early.recv().await.expect("early subscriber line");
        assert_eq!(log.message, expected_message);
    }
    for expected_message in expected {
        let log = late.recv().await.expect("late subscriber line");
        assert_eq!(log.message, expected_message);
    }

    assert!(
        tokio::time::timeout(std::time::Duration::from_millis(50), early.recv())
            .await
            .is_err(),
        "no extra lines should be delivered to the early subscriber"
    );
}
