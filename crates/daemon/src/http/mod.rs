// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The HTTP edge. Handlers are kept thin: parse and validate the request,
//! call into `RunEngine` (or a direct `Store` read/append for the
//! registry/schedule/SLA/env/worker/alert surfaces `RunEngine` itself
//! doesn't own), and map the `Result` to a response via [`crate::error::ApiError`].

mod alerts;
mod env;
mod helpers;
mod ops;
mod registry;
mod runs;
mod schedule;
mod sla;
mod workers;
mod ws;

use axum::extract::State;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use hub_clock::Clock;
use hub_core::IdGen;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

async fn health<C: Clock, G: IdGen>(State(_state): State<AppState<C, G>>) -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the full route tree. `C`/`G` are the clock/id-gen pair `RunEngine`
/// was constructed with — production wires `SystemClock`/`UuidIdGen`; tests
/// can wire `FakeClock`/`SequentialIdGen` the same way `hub-engine`'s own
/// harnesses do.
pub fn router<C: Clock, G: IdGen>(state: AppState<C, G>) -> Router {
    let api = Router::new()
        .route("/runs/{robot_id}/execute", post(runs::execute))
        .route("/runs", get(runs::list))
        .route("/runs/{run_id}", get(runs::get))
        .route("/runs/{run_id}/logs", get(runs::logs))
        .route("/runs/{run_id}/artifacts/{artifact_id}/download", get(runs::download_artifact))
        .route("/runs/{run_id}/cancel", post(runs::cancel))
        .route("/robots/{robot_id}/versions/publish", post(registry::publish))
        .route("/robots/{robot_id}/versions/{version_id}/activate", post(registry::activate))
        .route(
            "/robots/{robot_id}/schedule",
            post(schedule::upsert).get(schedule::get).patch(schedule::patch).delete(schedule::delete),
        )
        .route("/robots/{robot_id}/sla", post(sla::upsert).get(sla::get).patch(sla::patch))
        .route("/robots/{robot_id}/env", get(env::get).put(env::put))
        .route("/robots/{robot_id}/env/{key}", delete(env::delete))
        .route("/workers", get(workers::list))
        .route("/workers/{worker_id}/pause", post(workers::pause))
        .route("/workers/{worker_id}/resume", post(workers::resume))
        .route("/ops/status", get(ops::status))
        .route("/alerts", get(alerts::list))
        .route("/alerts/{alert_id}/resolve", post(alerts::resolve))
        .route("/ws/runs/{run_id}/logs", get(ws::stream_logs));

    // Accepts a different authentication scheme (x-deploy-token rather than
    // the caller-identity seam), mounted alongside the user-facing publish
    // route rather than nested under it.
    let deploy = Router::new().route("/deploy/robots/{robot_id}/versions/publish", post(registry::deploy_publish));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api.merge(deploy))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
