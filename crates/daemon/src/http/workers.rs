// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker inventory and pause/resume control.

use axum::extract::{Path, State};
use axum::Json;
use hub_clock::Clock;
use hub_core::{Event, IdGen, Worker, WorkerId, WorkerStatus};

use crate::error::ApiError;
use crate::http::helpers::parse_id;
use crate::state::AppState;

pub async fn list<C: Clock, G: IdGen>(State(state): State<AppState<C, G>>) -> Json<Vec<Worker>> {
    let workers = state.engine.store().with_state(|s| {
        let mut workers: Vec<Worker> = s.workers.values().cloned().collect();
        workers.sort_by_key(|w| w.hostname.clone());
        workers
    });
    Json(workers)
}

async fn set_status<C: Clock, G: IdGen>(
    state: &AppState<C, G>,
    worker_id: WorkerId,
    status: WorkerStatus,
) -> Result<Worker, ApiError> {
    if state.engine.store().with_state(|s| s.workers.get(&worker_id).is_none()) {
        return Err(ApiError::not_found(format!("worker {worker_id}")));
    }
    state
        .engine
        .store()
        .append(Event::WorkerStatusChanged { worker_id, status })
        .map_err(|e| ApiError::new("INTERNAL_ERROR", e.to_string()))?;
    state
        .engine
        .store()
        .with_state(|s| s.workers.get(&worker_id).cloned())
        .ok_or_else(|| ApiError::not_found(format!("worker {worker_id}")))
}

pub async fn pause<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(worker_id): Path<String>,
) -> Result<Json<Worker>, ApiError> {
    let worker_id: WorkerId = parse_id(&worker_id, "worker_id")?;
    set_status(&state, worker_id, WorkerStatus::Paused).await.map(Json)
}

pub async fn resume<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(worker_id): Path<String>,
) -> Result<Json<Worker>, ApiError> {
    let worker_id: WorkerId = parse_id(&worker_id, "worker_id")?;
    set_status(&state, worker_id, WorkerStatus::Running).await.map(Json)
}
