// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-robot, per-environment config and secret bindings. `GET` never
//! returns plaintext for a binding marked secret; `PUT` accepts plaintext
//! and encrypts it before it ever reaches the store.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use hub_clock::Clock;
use hub_core::{EnvName, Event, HubError, IdGen, RedactedEnvBinding, RobotEnvBinding, RobotId};
use serde::Deserialize;

use crate::error::ApiError;
use crate::http::helpers::parse_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EnvQuery {
    pub env: String,
}

fn parse_env_name(raw: &str) -> Result<EnvName, ApiError> {
    raw.parse().map_err(ApiError::validation)
}

pub async fn get<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(robot_id): Path<String>,
    Query(query): Query<EnvQuery>,
) -> Result<Json<Vec<RedactedEnvBinding>>, ApiError> {
    let robot_id: RobotId = parse_id(&robot_id, "robot_id")?;
    let env_name = parse_env_name(&query.env)?;
    let bindings = state
        .engine
        .store()
        .with_state(|s| s.env_bindings_for(robot_id, env_name).map(RedactedEnvBinding::from).collect());
    Ok(Json(bindings))
}

#[derive(Debug, Deserialize)]
pub struct EnvItem {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub is_secret: bool,
}

#[derive(Debug, Deserialize)]
pub struct PutEnvRequest {
    pub items: Vec<EnvItem>,
}

pub async fn put<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(robot_id): Path<String>,
    Query(query): Query<EnvQuery>,
    Json(body): Json<PutEnvRequest>,
) -> Result<StatusCode, ApiError> {
    let robot_id: RobotId = parse_id(&robot_id, "robot_id")?;
    let env_name = parse_env_name(&query.env)?;
    if state.engine.store().with_state(|s| s.robots.get(&robot_id).is_none()) {
        return Err(HubError::not_found(format!("robot {robot_id}")).into());
    }

    for item in body.items {
        let value = if item.is_secret {
            state
                .cipher
                .encrypt(&item.value)
                .map_err(|e| ApiError::new("INTERNAL_ERROR", e.to_string()))?
        } else {
            item.value
        };
        state
            .engine
            .store()
            .append(Event::EnvSet {
                binding: RobotEnvBinding {
                    robot_id,
                    env_name,
                    key: item.key,
                    value,
                    is_secret: item.is_secret,
                },
            })
            .map_err(|e| ApiError::new("INTERNAL_ERROR", e.to_string()))?;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path((robot_id, key)): Path<(String, String)>,
    Query(query): Query<EnvQuery>,
) -> Result<StatusCode, ApiError> {
    let robot_id: RobotId = parse_id(&robot_id, "robot_id")?;
    let env_name = parse_env_name(&query.env)?;
    state
        .engine
        .store()
        .append(Event::EnvDeleted { robot_id, env_name, key })
        .map_err(|e| ApiError::new("INTERNAL_ERROR", e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}
