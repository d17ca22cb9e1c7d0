// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{Duration as ChronoDuration, Utc};
use hub_adapters::ScriptedProcess;
use hub_core::{Event, RunStatus, Schedule, ScheduleId, TriggerType};

use crate::harness::harness;

#[tokio::test]
async fn failed_scheduled_run_is_retried_once_after_the_backoff() {
    let h = harness(|_| {});
    h.publish_artifact(b"raise SystemExit(2)").await;
    h.processes.script(
        "python3",
        ScriptedProcess {
            output: Vec::new(),
            exit_code: 2,
            hang: false,
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
        timeout_seconds: 60,
        retry_count: 1,
        retry_backoff_seconds: 5,
        created_at: Utc::now(),
        last_tick_at: Utc::now(),
    };
    h.engine
        .store()
        .append(Event::ScheduleUpserted { schedule: schedule.clone() })
        .expect("seed schedule");

    let first_run = h
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
    assert_eq!(h.engine.claim_next(h.worker_id).expect("claim"), Some(first_run));
    h.worker.execute(first_run).await.expect("execute");

    let run = h.engine.get_run(first_run).expect("run");
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.attempt, 1);

    let retry_run = h
        .engine
        .store()
        .with_state(|state| {
            state
                .runs_for_robot(h.robot_id)
                .into_iter()
                .find(|r| r.trigger_type == TriggerType::Retry)
                .cloned()
        })
        .expect("retry run scheduled");
    assert_eq!(retry_run.attempt, 2);
    assert_eq!(retry_run.robot_version_id, h.version_id);
    let finished_at = run.finished_at.expect("finished");
    assert!(retry_run.queued_at > finished_at);
    assert!(retry_run.queued_at <= finished_at + ChronoDuration::seconds(6));

    // Not eligible until the backoff has elapsed.
    assert_eq!(h.engine.claim_next(h.worker_id).expect("claim"), None);
    h.clock.advance(ChronoDuration::seconds(6));
    assert_eq!(h.engine.claim_next(h.worker_id).expect("claim"), Some(retry_run.id));
}
