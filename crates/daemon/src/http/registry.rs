// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Robot version publishing: the user-facing multipart route and its
//! CI-authenticated twin, plus manual activation.

use std::collections::{BTreeMap, BTreeSet};

use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use hub_adapters::sha256_hex;
use hub_clock::Clock;
use hub_core::{
    ArtifactKind, Channel, CreatedSource, EntrypointKind, Event, HubError, IdGen, RobotId,
    RobotVersion, RobotVersionId, SourceMeta,
};

use crate::error::ApiError;
use crate::http::helpers::parse_id;
use crate::state::AppState;

struct PublishFields {
    version: Option<String>,
    channel: Option<String>,
    changelog: String,
    entrypoint_path: Option<String>,
    entrypoint_type: Option<String>,
    activate: bool,
    artifact_name: Option<String>,
    artifact_bytes: Option<Vec<u8>>,
    commit_sha: Option<String>,
    branch: Option<String>,
    build_url: Option<String>,
}

async fn read_multipart(mut multipart: Multipart) -> Result<PublishFields, ApiError> {
    let mut fields = PublishFields {
        version: None,
        channel: None,
        changelog: String::new(),
        entrypoint_path: None,
        entrypoint_type: None,
        activate: false,
        artifact_name: None,
        artifact_bytes: None,
        commit_sha: None,
        branch: None,
        build_url: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "artifact" => {
                fields.artifact_name = field.file_name().map(str::to_string);
                fields.artifact_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::validation(e.to_string()))?
                        .to_vec(),
                );
            }
            other => {
                let text = field.text().await.map_err(|e| ApiError::validation(e.to_string()))?;
                match other {
                    "version" => fields.version = Some(text),
                    "channel" => fields.channel = Some(text),
                    "changelog" => fields.changelog = text,
                    "entrypoint_path" => fields.entrypoint_path = Some(text),
                    "entrypoint_type" => fields.entrypoint_type = Some(text),
                    "activate" => fields.activate = text == "true" || text == "1",
                    "commit_sha" => fields.commit_sha = Some(text),
                    "branch" => fields.branch = Some(text),
                    "build_url" => fields.build_url = Some(text),
                    _ => {}
                }
            }
        }
    }
    Ok(fields)
}

fn parse_channel(raw: &str) -> Result<Channel, ApiError> {
    match raw {
        "stable" => Ok(Channel::Stable),
        "beta" => Ok(Channel::Beta),
        "hotfix" => Ok(Channel::Hotfix),
        other => Err(ApiError::validation(format!("unknown channel: {other}"))),
    }
}

fn parse_entrypoint_kind(raw: &str) -> Result<EntrypointKind, ApiError> {
    match raw {
        "script" => Ok(EntrypointKind::Script),
        "binary" => Ok(EntrypointKind::Binary),
        other => Err(ApiError::validation(format!("unknown entrypoint_type: {other}"))),
    }
}

fn infer_artifact_kind(file_name: &str) -> ArtifactKind {
    if file_name.to_ascii_lowercase().ends_with(".zip") {
        ArtifactKind::Zip
    } else {
        ArtifactKind::Exe
    }
}

async fn publish_version<C: Clock, G: IdGen>(
    state: &AppState<C, G>,
    robot_id: RobotId,
    fields: PublishFields,
    source_meta: SourceMeta,
) -> Result<RobotVersion, ApiError> {
    let version = fields.version.ok_or_else(|| ApiError::validation("version is required"))?;
    let channel = parse_channel(&fields.channel.ok_or_else(|| ApiError::validation("channel is required"))?)?;
    let entrypoint_path = fields
        .entrypoint_path
        .ok_or_else(|| ApiError::validation("entrypoint_path is required"))?;
    let entrypoint_kind = parse_entrypoint_kind(
        &fields
            .entrypoint_type
            .ok_or_else(|| ApiError::validation("entrypoint_type is required"))?,
    )?;
    let artifact_name = fields.artifact_name.ok_or_else(|| ApiError::validation("artifact file is required"))?;
    let artifact_bytes = fields.artifact_bytes.ok_or_else(|| ApiError::validation("artifact file is required"))?;

    if state.engine.store().with_state(|s| s.robots.get(&robot_id).is_none()) {
        return Err(HubError::not_found(format!("robot {robot_id}")).into());
    }

    let digest = sha256_hex(&artifact_bytes);
    let version_id = RobotVersionId::new();
    state
        .artifacts
        .store_version_artifact(robot_id, version_id, &artifact_bytes, &digest)
        .await
        .map_err(|e| ApiError::new("INTERNAL_ERROR", e.to_string()))?;

    let robot_version = RobotVersion {
        id: version_id,
        robot_id,
        version,
        channel,
        changelog: fields.changelog,
        artifact_kind: infer_artifact_kind(&artifact_name),
        artifact_digest: digest,
        entrypoint_kind,
        entrypoint_path,
        default_arguments: Vec::new(),
        default_env: BTreeMap::new(),
        working_dir: None,
        required_env_keys: BTreeSet::new(),
        source_meta,
        is_active: fields.activate,
        created_at: Utc::now(),
    };

    state
        .engine
        .store()
        .append(Event::RobotVersionPublished {
            version: robot_version.clone(),
        })
        .map_err(|e| ApiError::new("INTERNAL_ERROR", e.to_string()))?;

    if fields.activate {
        state
            .engine
            .store()
            .append(Event::RobotVersionActivated { robot_id, version_id })
            .map_err(|e| ApiError::new("INTERNAL_ERROR", e.to_string()))?;
    }

    Ok(robot_version)
}

pub async fn publish<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(robot_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<RobotVersion>, ApiError> {
    let robot_id: RobotId = parse_id(&robot_id, "robot_id")?;
    let fields = read_multipart(multipart).await?;
    let version = publish_version(&state, robot_id, fields, SourceMeta::user()).await?;
    Ok(Json(version))
}

pub async fn deploy_publish<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(robot_id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<RobotVersion>, ApiError> {
    let token = headers.get("x-deploy-token").and_then(|v| v.to_str().ok());
    if !crate::auth::deploy_token_matches(token, &state.deploy_token) {
        return Err(ApiError::unauthorized("invalid or missing x-deploy-token"));
    }

    let robot_id: RobotId = parse_id(&robot_id, "robot_id")?;
    let fields = read_multipart(multipart).await?;
    let source_meta = SourceMeta {
        commit: fields.commit_sha.clone(),
        branch: fields.branch.clone(),
        build_url: fields.build_url.clone(),
        created_source: CreatedSource::Ci,
    };
    let version = publish_version(&state, robot_id, fields, source_meta).await?;
    Ok(Json(version))
}

pub async fn activate<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path((robot_id, version_id)): Path<(String, String)>,
) -> Result<Json<RobotVersion>, ApiError> {
    let robot_id: RobotId = parse_id(&robot_id, "robot_id")?;
    let version_id: RobotVersionId = parse_id(&version_id, "version_id")?;

    let version = state
        .engine
        .store()
        .with_state(|s| s.robot_versions.get(&version_id).cloned())
        .ok_or_else(|| ApiError::not_found(format!("robot version {version_id}")))?;
    if version.robot_id != robot_id {
        return Err(ApiError::validation(format!("version {version_id} does not belong to robot {robot_id}")));
    }

    state
        .engine
        .store()
        .append(Event::RobotVersionActivated { robot_id, version_id })
        .map_err(|e| ApiError::new("INTERNAL_ERROR", e.to_string()))?;

    let activated = state
        .engine
        .store()
        .with_state(|s| s.robot_versions.get(&version_id).cloned())
        .ok_or_else(|| ApiError::not_found(format!("robot version {version_id}")))?;
    Ok(Json(activated))
}
