// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use chrono::Utc;
use hub_adapters::ScriptedProcess;
use hub_core::{Event, RunStatus, Schedule, ScheduleId, TriggerType};

use crate::harness::harness;

#[tokio::test(start_paused = true)]
async fn scheduled_run_past_its_timeout_is_failed_with_timeout_message() {
    let h = harness(|version| {
        version.entrypoint_kind = hub_core::EntrypointKind::Script;
    });
    h.publish_artifact(b"import time; time.sleep(10)").await;
    h.processes.script(
        "python3",
        ScriptedProcess {
            output: Vec::new(),
            exit_code: 0,
            hang: true,
        },
    );

    let schedule = Schedule {
        id: ScheduleId::new(),
        robot_id: h.robot_id,
        enabled: true,
        cron_expr: "0 12 * * *".to_string(),
        timezone: chrono_tz::UTC,
        window_start: None,
        window_end: None,
        max_concurrency: 1,
        timeout_seconds: 2,
        retry_count: 0,
        retry_backoff_seconds: 0,
        created_at: Utc::now(),
        last_tick_at: Utc::now(),
    };
    h.engine
        .store()
        .append(Event::ScheduleUpserted { schedule: schedule.clone() })
        .expect("seed schedule");

    let run_id = h
        .engine
        .create_run(hub_engine::CreateRunParams {
            robot_id: h.robot_id,
            version_id: Some(h.version_id),
            env_name: hub_core::EnvName::Prod,
            runtime_payload: Default::default(),
            trigger_type: TriggerType::Scheduled,
            triggered_by: None,
            attempt: 1,
            schedule_id: Some(schedule.id),
            service_id: None,
            not_before: None,
        })
        .expect("create scheduled run");
    assert_eq!(h.engine.claim_next(h.worker_id).expect("claim"), Some(run_id));

    let worker = h.worker.clone();
    let handle = tokio::spawn(async move { worker.execute(run_id).await });
    tokio::time::advance(Duration::from_secs(schedule.timeout_seconds) + Duration::from_secs(2)).await;
    handle.await.expect("join").expect("execute");

    let run = h.engine.get_run(run_id).expect("run");
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.error_message.as_deref(), Some("TIMEOUT"));
}
