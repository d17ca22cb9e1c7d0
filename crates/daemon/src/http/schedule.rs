// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-robot cron schedule CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono_tz::Tz;
use hub_clock::Clock;
use hub_core::{Event, HubError, IdGen, RobotId, Schedule, ScheduleId, WallClock};
use serde::Deserialize;

use crate::error::ApiError;
use crate::http::helpers::parse_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub enabled: bool,
    pub cron_expr: String,
    pub timezone: String,
    #[serde(default)]
    pub window_start: Option<String>,
    #[serde(default)]
    pub window_end: Option<String>,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: u32,
    pub timeout_seconds: u64,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub retry_backoff_seconds: u64,
}

fn default_max_concurrency() -> u32 {
    hub_engine::DEFAULT_MAX_CONCURRENCY
}

fn parse_wall_clock(raw: &Option<String>) -> Result<Option<WallClock>, ApiError> {
    raw.as_deref()
        .map(|s| s.parse::<WallClock>().map_err(ApiError::validation))
        .transpose()
}

pub async fn upsert<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(robot_id): Path<String>,
    Json(body): Json<ScheduleRequest>,
) -> Result<(StatusCode, Json<Schedule>), ApiError> {
    let robot_id: RobotId = parse_id(&robot_id, "robot_id")?;
    if state.engine.store().with_state(|s| s.robots.get(&robot_id).is_none()) {
        return Err(HubError::not_found(format!("robot {robot_id}")).into());
    }

    let timezone: Tz = body.timezone.parse().map_err(|_| ApiError::validation(format!("unknown timezone: {}", body.timezone)))?;
    let window_start = parse_wall_clock(&body.window_start)?;
    let window_end = parse_wall_clock(&body.window_end)?;

    let existing = state.engine.store().with_state(|s| s.schedule_for(robot_id).cloned());
    let now = state.engine.clock().now();
    let schedule = Schedule {
        id: existing.as_ref().map(|s| s.id).unwrap_or_else(ScheduleId::new),
        robot_id,
        enabled: body.enabled,
        cron_expr: body.cron_expr,
        timezone,
        window_start,
        window_end,
        max_concurrency: body.max_concurrency,
        timeout_seconds: body.timeout_seconds,
        retry_count: body.retry_count,
        retry_backoff_seconds: body.retry_backoff_seconds,
        created_at: existing.as_ref().map(|s| s.created_at).unwrap_or(now),
        last_tick_at: existing.map(|s| s.last_tick_at).unwrap_or(now),
    };

    state
        .engine
        .store()
        .append(Event::ScheduleUpserted { schedule: schedule.clone() })
        .map_err(|e| ApiError::new("INTERNAL_ERROR", e.to_string()))?;

    Ok((StatusCode::OK, Json(schedule)))
}

pub async fn get<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(robot_id): Path<String>,
) -> Result<Json<Schedule>, ApiError> {
    let robot_id: RobotId = parse_id(&robot_id, "robot_id")?;
    state
        .engine
        .store()
        .with_state(|s| s.schedule_for(robot_id).cloned())
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no schedule for robot {robot_id}")))
}

#[derive(Debug, Deserialize, Default)]
pub struct SchedulePatch {
    pub enabled: Option<bool>,
    pub cron_expr: Option<String>,
    pub timezone: Option<String>,
    pub window_start: Option<Option<String>>,
    pub window_end: Option<Option<String>>,
    pub max_concurrency: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub retry_count: Option<u32>,
    pub retry_backoff_seconds: Option<u64>,
}

pub async fn patch<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(robot_id): Path<String>,
    Json(body): Json<SchedulePatch>,
) -> Result<Json<Schedule>, ApiError> {
    let robot_id: RobotId = parse_id(&robot_id, "robot_id")?;
    let mut schedule = state
        .engine
        .store()
        .with_state(|s| s.schedule_for(robot_id).cloned())
        .ok_or_else(|| ApiError::not_found(format!("no schedule for robot {robot_id}")))?;

    if let Some(enabled) = body.enabled {
        schedule.enabled = enabled;
    }
    if let Some(cron_expr) = body.cron_expr {
        schedule.cron_expr = cron_expr;
    }
    if let Some(tz_raw) = body.timezone {
        schedule.timezone = tz_raw.parse().map_err(|_| ApiError::validation(format!("unknown timezone: {tz_raw}")))?;
    }
    if let Some(window_start) = body.window_start {
        schedule.window_start = parse_wall_clock(&window_start)?;
    }
    if let Some(window_end) = body.window_end {
        schedule.window_end = parse_wall_clock(&window_end)?;
    }
    if let Some(max_concurrency) = body.max_concurrency {
        schedule.max_concurrency = max_concurrency;
    }
    if let Some(timeout_seconds) = body.timeout_seconds {
        schedule.timeout_seconds = timeout_seconds;
    }
    if let Some(retry_count) = body.retry_count {
        schedule.retry_count = retry_count;
    }
    if let Some(retry_backoff_seconds) = body.retry_backoff_seconds {
        schedule.retry_backoff_seconds = retry_backoff_seconds;
    }

    state
        .engine
        .store()
        .append(Event::ScheduleUpserted { schedule: schedule.clone() })
        .map_err(|e| ApiError::new("INTERNAL_ERROR", e.to_string()))?;
    Ok(Json(schedule))
}

pub async fn delete<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(robot_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let robot_id: RobotId = parse_id(&robot_id, "robot_id")?;
    state
        .engine
        .store()
        .append(Event::ScheduleDeleted { robot_id })
        .map_err(|e| ApiError::new("INTERNAL_ERROR", e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}
