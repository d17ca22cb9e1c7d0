// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operational snapshot of the hub.

use axum::extract::State;
use axum::Json;
use hub_clock::Clock;
use hub_core::{IdGen, RunStatus, WorkerStatus};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OpsStatus {
    pub total_workers: usize,
    pub workers_running: usize,
    pub workers_paused: usize,
    pub queue_depth: usize,
    pub runs_running: usize,
    pub runs_failed_last_hour: usize,
    pub uptime_seconds: u64,
}

pub async fn status<C: Clock, G: IdGen>(State(state): State<AppState<C, G>>) -> Json<OpsStatus> {
    let now = state.engine.clock().now();
    let started_at = state.started_at;

    let status = state.engine.store().with_state(|s| {
        let total_workers = s.workers.len();
        let workers_running = s.workers.values().filter(|w| w.status == WorkerStatus::Running).count();
        let workers_paused = s.workers.values().filter(|w| w.status == WorkerStatus::Paused).count();
        let runs_running = s.runs.values().filter(|r| r.status == RunStatus::Running).count();
        let runs_failed_last_hour = s
            .runs
            .values()
            .filter(|r| r.status == RunStatus::Failed)
            .filter(|r| r.finished_at.is_some_and(|t| (now - t).num_seconds() <= 3600))
            .count();
        OpsStatus {
            total_workers,
            workers_running,
            workers_paused,
            queue_depth: state.engine.queue().depth(s, now),
            runs_running,
            runs_failed_last_hour,
            uptime_seconds: (now - started_at).num_seconds().max(0) as u64,
        }
    });
    Json(status)
}
