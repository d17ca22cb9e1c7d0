// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-robot SLA rule CRUD.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hub_clock::Clock;
use hub_core::{Event, HubError, IdGen, RobotId, SlaRule, SlaRuleId, WallClock};
use serde::Deserialize;

use crate::error::ApiError;
use crate::http::helpers::parse_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SlaRuleRequest {
    #[serde(default)]
    pub expected_every_minutes: Option<u32>,
    #[serde(default)]
    pub expected_daily_time: Option<String>,
    pub late_after_minutes: u32,
    #[serde(default)]
    pub alert_on_failure: bool,
    #[serde(default)]
    pub alert_on_late: bool,
    #[serde(default)]
    pub notify_channels: BTreeMap<String, String>,
}

fn parse_daily_time(raw: &Option<String>) -> Result<Option<WallClock>, ApiError> {
    raw.as_deref()
        .map(|s| s.parse::<WallClock>().map_err(ApiError::validation))
        .transpose()
}

pub async fn upsert<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(robot_id): Path<String>,
    Json(body): Json<SlaRuleRequest>,
) -> Result<(StatusCode, Json<SlaRule>), ApiError> {
    let robot_id: RobotId = parse_id(&robot_id, "robot_id")?;
    if state.engine.store().with_state(|s| s.robots.get(&robot_id).is_none()) {
        return Err(HubError::not_found(format!("robot {robot_id}")).into());
    }
    let expected_daily_time = parse_daily_time(&body.expected_daily_time)?;

    let existing_id = state.engine.store().with_state(|s| s.sla_rule_for(robot_id).map(|r| r.id));
    let rule = SlaRule {
        id: existing_id.unwrap_or_else(SlaRuleId::new),
        robot_id,
        expected_every_minutes: body.expected_every_minutes,
        expected_daily_time,
        late_after_minutes: body.late_after_minutes,
        alert_on_failure: body.alert_on_failure,
        alert_on_late: body.alert_on_late,
        notify_channels: body.notify_channels,
    };

    state
        .engine
        .store()
        .append(Event::SlaUpserted { rule: rule.clone() })
        .map_err(|e| ApiError::new("INTERNAL_ERROR", e.to_string()))?;
    Ok((StatusCode::OK, Json(rule)))
}

pub async fn get<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(robot_id): Path<String>,
) -> Result<Json<SlaRule>, ApiError> {
    let robot_id: RobotId = parse_id(&robot_id, "robot_id")?;
    state
        .engine
        .store()
        .with_state(|s| s.sla_rule_for(robot_id).cloned())
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no SLA rule for robot {robot_id}")))
}

#[derive(Debug, Deserialize, Default)]
pub struct SlaRulePatch {
    pub expected_every_minutes: Option<Option<u32>>,
    pub expected_daily_time: Option<Option<String>>,
    pub late_after_minutes: Option<u32>,
    pub alert_on_failure: Option<bool>,
    pub alert_on_late: Option<bool>,
    pub notify_channels: Option<BTreeMap<String, String>>,
}

pub async fn patch<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(robot_id): Path<String>,
    Json(body): Json<SlaRulePatch>,
) -> Result<Json<SlaRule>, ApiError> {
    let robot_id: RobotId = parse_id(&robot_id, "robot_id")?;
    let mut rule = state
        .engine
        .store()
        .with_state(|s| s.sla_rule_for(robot_id).cloned())
        .ok_or_else(|| ApiError::not_found(format!("no SLA rule for robot {robot_id}")))?;

    if let Some(v) = body.expected_every_minutes {
        rule.expected_every_minutes = v;
    }
    if let Some(v) = body.expected_daily_time {
        rule.expected_daily_time = parse_daily_time(&v)?;
    }
    if let Some(v) = body.late_after_minutes {
        rule.late_after_minutes = v;
    }
    if let Some(v) = body.alert_on_failure {
        rule.alert_on_failure = v;
    }
    if let Some(v) = body.alert_on_late {
        rule.alert_on_late = v;
    }
    if let Some(v) = body.notify_channels {
        rule.notify_channels = v;
    }

    state
        .engine
        .store()
        .append(Event::SlaUpserted { rule: rule.clone() })
        .map_err(|e| ApiError::new("INTERNAL_ERROR", e.to_string()))?;
    Ok(Json(rule))
}
