// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use hub_adapters::{ProcessOutput, ScriptedProcess};
use hub_core::{RunId, RunStatus};

use crate::harness::harness;

#[tokio::test]
async fn manual_execute_runs_to_success_with_one_log_line() {
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

    let (status, body) = h
        .post_json(
            &format!("/api/v1/runs/{}/execute", h.robot_id),
            serde_json::json!({ "env_name": "PROD" }),
        )
        .await;
    assert_eq!(status, axum::http::StatusCode::CREATED);
    assert_eq!(body["status"], "PENDING");
    let run_id: RunId = serde_json::from_value(body["id"].clone()).expect("run id");

    let claimed = h.engine.claim_next(h.worker_id).expect("claim");
    assert_eq!(claimed, Some(run_id));
    h.worker.execute(run_id).await.expect("execute run");

    let (status, body) = h.get_json(&format!("/api/v1/runs/{run_id}")).await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(body["status"], "SUCCESS");
    assert!(body["duration_seconds"].as_f64().expect("duration") >= 0.0);
    assert!(body["error_message"].is_null());

    let run = h.engine.get_run(run_id).expect("run");
    assert_eq!(run.status, RunStatus::Success);

    let (status, body) = h.get_json(&format!("/api/v1/runs/{run_id}/logs")).await;
    assert_eq!(status, axum::http::StatusCode::OK);
    let logs = body.as_array().expect("logs array");
    assert!(logs.iter().any(|l| l["message"] == "ok"));
}
