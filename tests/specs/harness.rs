// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared scaffolding for the end-to-end scenario tests: a `RunEngine` plus
//! one `WorkerLoop` wired against fake adapters, and the real `axum` router
//! from `hub-daemon` mounted over the same engine so HTTP-facing assertions
//! and direct engine/worker calls can be mixed freely, the way a real
//! deployment's HTTP edge and worker process share one engine.

use std::sync::Arc;

use axum::Router;
use chrono::Utc;
use hub_adapters::{FakeArtifactStore, FakeCipher, FakeProcessRunner};
use hub_clock::FakeClock;
use hub_core::test_support::{sample_robot, sample_version};
use hub_core::{Event, RobotId, RobotVersionId, SequentialIdGen, WorkerId};
use hub_daemon::{http, AppState};
use hub_engine::{EngineConfig, LogBus, RunEngine, SlaMonitor, WorkerLoop};
use hub_storage::Store;
use tempfile::TempDir;

pub type TestEngine = RunEngine<FakeClock, SequentialIdGen>;
pub type TestWorker = WorkerLoop<FakeClock, SequentialIdGen, FakeProcessRunner, FakeArtifactStore, FakeCipher>;

/// Everything one scenario needs: the engine/worker pair, the fake
/// process/artifact adapters so tests can script child-process behavior,
/// the clock so tests can move time deterministically, and a ready-to-use
/// `axum::Router` for HTTP-facing assertions.
pub struct Harness {
    pub engine: Arc<TestEngine>,
    pub worker: Arc<TestWorker>,
    pub worker_id: WorkerId,
    pub processes: Arc<FakeProcessRunner>,
    pub artifacts: Arc<FakeArtifactStore>,
    pub clock: FakeClock,
    pub robot_id: RobotId,
    pub version_id: RobotVersionId,
    pub router: Router,
    _data_dir: TempDir,
    _scratch_dir: TempDir,
}

/// Builds a harness seeded with one robot and one active version, so each
/// scenario only needs to script the process outcome and schedule/SLA rows
/// it actually exercises.
pub fn harness(customize: impl FnOnce(&mut hub_core::RobotVersion)) -> Harness {
    let data_dir = tempfile::tempdir().expect("tempdir");
    let scratch_dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(Store::open(data_dir.path()).expect("open store"));

    let robot = sample_robot("invoice-sync");
    let mut version = sample_version(robot.id);
    customize(&mut version);
    store.append(Event::RobotCreated { robot: robot.clone() }).expect("seed robot");
    store
        .append(Event::RobotVersionPublished { version: version.clone() })
        .expect("seed version");

    let clock = FakeClock::new(Utc::now());
    let engine = Arc::new(RunEngine::new(
        store,
        clock.clone(),
        SequentialIdGen::new(),
        EngineConfig::default(),
        Arc::new(LogBus::new()),
    ));

    let worker_id = WorkerId::new();
    let processes = Arc::new(FakeProcessRunner::new());
    let artifacts = Arc::new(FakeArtifactStore::new());
    let cipher = Arc::new(FakeCipher);
    let worker = Arc::new(WorkerLoop::new(
        engine.clone(),
        worker_id,
        "test-host",
        processes.clone(),
        artifacts.clone(),
        cipher.clone(),
        scratch_dir.path(),
    ));
    worker.register("1.0.0".to_string()).expect("register worker");

    let state = AppState {
        engine: engine.clone(),
        artifacts: artifacts.clone(),
        cipher,
        deploy_token: "test-deploy-token".to_string(),
        started_at: Utc::now(),
    };
    let router = http::router(state);

    Harness {
        engine,
        worker,
        worker_id,
        processes,
        artifacts,
        clock,
        robot_id: robot.id,
        version_id: version.id,
        router,
        _data_dir: data_dir,
        _scratch_dir: scratch_dir,
    }
}

impl Harness {
    /// Stores `bytes` as the published artifact for the harness's robot
    /// version, digest-matched the way a real publish upload would be.
    pub async fn publish_artifact(&self, bytes: &[u8]) {
        self.artifacts
            .store_version_artifact(self.robot_id, self.version_id, bytes, &hub_adapters::sha256_hex(bytes))
            .await
            .expect("store artifact");
    }

    pub fn sla_monitor(&self) -> SlaMonitor<FakeClock, SequentialIdGen> {
        SlaMonitor::new(self.engine.clone())
    }

    /// Sends `body` as a JSON POST against the in-process router and
    /// returns the status plus the parsed JSON response.
    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> (axum::http::StatusCode, serde_json::Value) {
        self.request(axum::http::Method::POST, path, Some(body)).await
    }

    pub async fn get_json(&self, path: &str) -> (axum::http::StatusCode, serde_json::Value) {
        self.request(axum::http::Method::GET, path, None).await
    }

    async fn request(
        &self,
        method: axum::http::Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> (axum::http::StatusCode, serde_json::Value) {
        use tower::ServiceExt;

        let request_body = match &body {
            Some(value) => axum::body::Body::from(serde_json::to_vec(value).expect("serialize body")),
            None => axum::body::Body::empty(),
        };
        let request = axum::http::Request::builder()
            .method(method)
            .uri(path)
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(request_body)
            .expect("build request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("read body");
        let payload = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse json body")
        };
        (status, payload)
    }
}
