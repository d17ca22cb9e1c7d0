// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;

use chrono::Duration as ChronoDuration;
use hub_adapters::{ProcessOutput, ScriptedProcess};
use hub_core::{AlertType, Event, RunStatus, SlaRule, SlaRuleId, TriggerType};

use crate::harness::harness;

#[tokio::test]
async fn missed_heartbeat_raises_a_late_alert_and_a_fresh_success_resolves_it() {
    let h = harness(|_| {});
    h.publish_artifact(b"print('ok')").await;
    h.processes.script(
        "python3",
        ScriptedProcess {
            output: vec![ProcessOutput::Stdout("ok".to_string())],
            exit_code: 0,
            hang: false,
        },
    );

    let rule = SlaRule {
        id: SlaRuleId::new(),
        robot_id: h.robot_id,
        expected_every_minutes: Some(10),
        expected_daily_time: None,
        late_after_minutes: 5,
        alert_on_failure: false,
        alert_on_late: true,
        notify_channels: BTreeMap::new(),
    };
    h.engine
        .store()
        .append(Event::SlaUpserted { rule: rule.clone() })
        .expect("seed sla rule");

    let run_a = h
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
    assert_eq!(h.engine.claim_next(h.worker_id).expect("claim"), Some(run_a));
    h.worker.execute(run_a).await.expect("execute");
    assert_eq!(h.engine.get_run(run_a).expect("run").status, RunStatus::Success);

    let monitor = h.sla_monitor();
    assert_eq!(monitor.tick().expect("tick"), 0);

    h.clock.advance(ChronoDuration::minutes(16));
    assert_eq!(monitor.tick().expect("tick"), 1);
    let alert = h
        .engine
        .store()
        .with_state(|state| state.open_alert(h.robot_id, AlertType::Late).cloned())
        .expect("late alert raised");
    assert!(alert.resolved_at.is_none());
    assert_eq!(alert.severity, hub_core::Severity::Warn);

    let run_b = h
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
    assert_eq!(h.engine.claim_next(h.worker_id).expect("claim"), Some(run_b));
    h.worker.execute(run_b).await.expect("execute");
    assert_eq!(h.engine.get_run(run_b).expect("run").status, RunStatus::Success);

    assert_eq!(monitor.tick().expect("tick"), 1);
    let alert = h
        .engine
        .store()
        .with_state(|state| state.open_alert(h.robot_id, AlertType::Late).cloned());
    assert!(alert.is_none(), "alert should have auto-resolved");
}
