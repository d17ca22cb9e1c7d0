// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use hub_adapters::ScriptedProcess;
use hub_core::RunId;

use crate::harness::harness;

#[tokio::test(start_paused = true)]
async fn cooperative_cancel_via_http_marks_run_canceled() {
    let h = harness(|_| {});
    h.publish_artifact(b"while True: pass").await;
    h.processes.script(
        "python3",
        ScriptedProcess {
            output: Vec::new(),
            exit_code: 0,
            hang: true,
        },
    );

    let (status, body) = h
        .post_json(
            &format!("/api/v1/runs/{}/execute", h.robot_id),
            serde_json::json!({ "env_name": "PROD" }),
        )
        .await;
    assert_eq!(status, axum::http::StatusCode::CREATED);
    let run_id: RunId = serde_json::from_value(body["id"].clone()).expect("run id");
    assert_eq!(h.engine.claim_next(h.worker_id).expect("claim"), Some(run_id));

    let worker = h.worker.clone();
    let handle = tokio::spawn(async move { worker.execute(run_id).await });
    tokio::time::advance(Duration::from_millis(50)).await;

    let (status, body) = h.post_json(&format!("/api/v1/runs/{run_id}/cancel"), serde_json::json!({})).await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(body["cancel_requested"], true);

    tokio::time::advance(h.engine.config().cancel_poll_interval() * 2).await;
    handle.await.expect("join").expect("execute");

    let (status, body) = h.get_json(&format!("/api/v1/runs/{run_id}")).await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(body["status"], "CANCELED");
    assert_eq!(body["canceled_by"], "system");
}
