// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The run surface: execute, list, inspect, stream logs, download
//! artifacts, cancel.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use hub_clock::Clock;
use hub_core::{EnvName, IdGen, RobotId, RobotVersionId, Run, RunId, RunStatus, RuntimePayload, TriggerType};
use hub_engine::CreateRunParams;
use serde::{Deserialize, Serialize};

use crate::auth::CallerIdentity;
use crate::error::ApiError;
use crate::http::helpers::parse_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub version_id: Option<RobotVersionId>,
    /// Alias accepted for clients that name it the long way; rejected as
    /// `Validation` if both this and `version_id` are present and differ.
    pub robot_version_id: Option<RobotVersionId>,
    #[serde(default)]
    pub runtime_arguments: Vec<String>,
    #[serde(default)]
    pub runtime_env: BTreeMap<String, String>,
    pub env_name: EnvName,
}

impl ExecuteRequest {
    fn resolved_version_id(&self) -> Result<Option<RobotVersionId>, ApiError> {
        match (self.version_id, self.robot_version_id) {
            (Some(a), Some(b)) if a != b => {
                Err(ApiError::validation("version_id and robot_version_id disagree"))
            }
            (Some(a), _) => Ok(Some(a)),
            (None, b) => Ok(b),
        }
    }
}

pub async fn execute<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    caller: CallerIdentity,
    Path(robot_id): Path<String>,
    Json(body): Json<ExecuteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let robot_id: RobotId = parse_id(&robot_id, "robot_id")?;
    let version_id = body.resolved_version_id()?;
    let run_id = state.engine.create_run(CreateRunParams {
        robot_id,
        version_id,
        env_name: body.env_name,
        runtime_payload: RuntimePayload {
            runtime_arguments: body.runtime_arguments,
            runtime_env: body.runtime_env,
        },
        trigger_type: TriggerType::Manual,
        triggered_by: Some(caller.subject),
        attempt: 1,
        schedule_id: None,
        service_id: None,
        not_before: None,
    })?;
    let run = state.engine.get_run(run_id).ok_or_else(|| ApiError::not_found("run vanished after create"))?;
    Ok((axum::http::StatusCode::CREATED, Json(run)))
}

#[derive(Debug, Deserialize)]
pub struct ListRunsQuery {
    pub robot_id: Option<String>,
    pub service_id: Option<String>,
    pub trigger_type: Option<String>,
    pub status: Option<String>,
}

pub async fn list<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Query(query): Query<ListRunsQuery>,
) -> Result<Json<Vec<Run>>, ApiError> {
    let robot_id = query.robot_id.as_deref().map(|s| parse_id::<RobotId>(s, "robot_id")).transpose()?;
    let trigger_type = query
        .trigger_type
        .as_deref()
        .map(|s| s.parse::<TriggerType>().map_err(ApiError::validation))
        .transpose()?;
    let status = query
        .status
        .as_deref()
        .map(|s| s.parse::<RunStatus>().map_err(ApiError::validation))
        .transpose()?;

    let runs = state.engine.store().with_state(|s| {
        let mut runs: Vec<Run> = s
            .runs
            .values()
            .filter(|r| robot_id.map_or(true, |id| r.robot_id == id))
            .filter(|r| query.service_id.is_none() || r.service_id == query.service_id)
            .filter(|r| trigger_type.map_or(true, |t| r.trigger_type == t))
            .filter(|r| status.map_or(true, |st| r.status == st))
            .cloned()
            .collect();
        runs.sort_by_key(|r| r.queued_at);
        runs
    });
    Ok(Json(runs))
}

pub async fn get<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(run_id): Path<String>,
) -> Result<Json<Run>, ApiError> {
    let run_id: RunId = parse_id(&run_id, "run_id")?;
    state
        .engine
        .get_run(run_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("run {run_id}")))
}

#[derive(Debug, Serialize)]
pub struct LogLine {
    pub id: u64,
    pub run_id: RunId,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: hub_core::LogLevel,
    pub message: String,
}

impl From<hub_core::RunLog> for LogLine {
    fn from(log: hub_core::RunLog) -> Self {
        Self {
            id: log.sequence,
            run_id: log.run_id,
            timestamp: log.timestamp,
            level: log.level,
            message: log.message,
        }
    }
}

pub async fn logs<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(run_id): Path<String>,
) -> Result<Json<Vec<LogLine>>, ApiError> {
    let run_id: RunId = parse_id(&run_id, "run_id")?;
    let logs = state.engine.get_logs_since(run_id, 0)?;
    Ok(Json(logs.into_iter().map(LogLine::from).collect()))
}

pub async fn download_artifact<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path((run_id, artifact_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let run_id: RunId = parse_id(&run_id, "run_id")?;
    let artifact_id: hub_core::ArtifactId = parse_id(&artifact_id, "artifact_id")?;

    let artifact = state
        .engine
        .store()
        .with_state(|s| s.artifacts.get(&run_id).and_then(|list| list.iter().find(|a| a.id == artifact_id).cloned()))
        .ok_or_else(|| ApiError::not_found(format!("artifact {artifact_id}")))?;

    let bytes = state
        .artifacts
        .load_run_artifact(run_id, &artifact.name)
        .await
        .map_err(|e| ApiError::not_found(e.to_string()))?;

    let content_type = artifact.content_type.clone().unwrap_or_else(|| "application/octet-stream".to_string());
    let headers = [
        (axum::http::header::CONTENT_TYPE, content_type),
        (
            axum::http::header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifact.name),
        ),
    ];
    Ok((headers, bytes))
}

pub async fn cancel<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    caller: CallerIdentity,
    Path(run_id): Path<String>,
) -> Result<Json<Run>, ApiError> {
    let run_id: RunId = parse_id(&run_id, "run_id")?;
    state.engine.request_cancel(run_id, caller.subject)?;
    state
        .engine
        .get_run(run_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("run {run_id}")))
}
