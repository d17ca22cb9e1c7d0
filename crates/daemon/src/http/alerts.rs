// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Open/resolved SLA alert listing and manual resolution.

use axum::extract::{Path, Query, State};
use axum::Json;
use hub_clock::Clock;
use hub_core::{AlertEvent, AlertId, AlertType, Event, IdGen};
use serde::Deserialize;

use crate::error::ApiError;
use crate::http::helpers::parse_id;
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct AlertsQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub alert_type: Option<String>,
}

fn parse_alert_type(raw: &str) -> Result<AlertType, ApiError> {
    match raw {
        "LATE" => Ok(AlertType::Late),
        "FAILURE_STREAK" => Ok(AlertType::FailureStreak),
        "WORKER_DOWN" => Ok(AlertType::WorkerDown),
        "QUEUE_BACKLOG" => Ok(AlertType::QueueBacklog),
        other => Err(ApiError::validation(format!("unknown alert type: {other}"))),
    }
}

pub async fn list<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<Vec<AlertEvent>>, ApiError> {
    let alert_type = query.alert_type.as_deref().map(parse_alert_type).transpose()?;
    let open_only = match query.status.as_deref() {
        Some("open") | None => Some(true),
        Some("resolved") => Some(false),
        Some(other) => return Err(ApiError::validation(format!("unknown status filter: {other}"))),
    };

    let alerts = state.engine.store().with_state(|s| {
        let mut alerts: Vec<AlertEvent> = s
            .alerts
            .values()
            .filter(|a| alert_type.map_or(true, |t| a.alert_type == t))
            .filter(|a| open_only.map_or(true, |open| a.is_open() == open))
            .cloned()
            .collect();
        alerts.sort_by_key(|a| a.created_at);
        alerts
    });
    Ok(Json(alerts))
}

pub async fn resolve<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(alert_id): Path<String>,
) -> Result<Json<AlertEvent>, ApiError> {
    let alert_id: AlertId = parse_id(&alert_id, "alert_id")?;
    if state.engine.store().with_state(|s| s.alerts.get(&alert_id).is_none()) {
        return Err(ApiError::not_found(format!("alert {alert_id}")));
    }
    let now = state.engine.clock().now();
    state
        .engine
        .store()
        .append(Event::AlertResolved { alert_id, resolved_at: now })
        .map_err(|e| ApiError::new("INTERNAL_ERROR", e.to_string()))?;
    state
        .engine
        .store()
        .with_state(|s| s.alerts.get(&alert_id).cloned())
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("alert {alert_id}")))
}
