// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Robots and their published versions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::define_id;

define_id! {
    /// Identifies a registered robot.
    pub struct RobotId;
}

define_id! {
    /// Identifies one published version of a robot.
    pub struct RobotVersionId;
}

/// A named, versioned automation unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    pub id: RobotId,
    pub name: String,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Robot {
    pub fn new(id: RobotId, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            tags: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Release channel a version was published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Stable,
    Beta,
    Hotfix,
}

/// Shape of the published artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Zip,
    Exe,
}

/// How the entrypoint is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrypointKind {
    Script,
    Binary,
}

/// Who produced the published artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatedSource {
    User,
    Ci,
}

/// Provenance metadata recorded for CI-originated publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_url: Option<String>,
    pub created_source: CreatedSource,
}

impl SourceMeta {
    pub fn user() -> Self {
        Self {
            commit: None,
            branch: None,
            build_url: None,
            created_source: CreatedSource::User,
        }
    }

    pub fn ci(commit: String, branch: String, build_url: String) -> Self {
        Self {
            commit: Some(commit),
            branch: Some(branch),
            build_url: Some(build_url),
            created_source: CreatedSource::Ci,
        }
    }
}

/// One immutable, published revision of a [`Robot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotVersion {
    pub id: RobotVersionId,
    pub robot_id: RobotId,
    /// SemVer string, e.g. "1.4.2".
    pub version: String,
    pub channel: Channel,
    #[serde(default)]
    pub changelog: String,
    pub artifact_kind: ArtifactKind,
    /// SHA-256 digest of the artifact bytes, hex-encoded.
    pub artifact_digest: String,
    pub entrypoint_kind: EntrypointKind,
    pub entrypoint_path: String,
    pub default_arguments: Vec<String>,
    pub default_env: BTreeMap<String, String>,
    pub working_dir: Option<String>,
    pub required_env_keys: BTreeSet<String>,
    pub source_meta: SourceMeta,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl RobotVersion {
    /// Build arguments for a run: defaults followed by runtime overrides.
    pub fn assemble_arguments(&self, runtime_arguments: &[String]) -> Vec<String> {
        let mut args = self.default_arguments.clone();
        args.extend(runtime_arguments.iter().cloned());
        args
    }

    /// Names of required env keys missing from an assembled environment.
    pub fn missing_required_env(&self, assembled: &BTreeMap<String, String>) -> Vec<String> {
        self.required_env_keys
            .iter()
            .filter(|k| !assembled.contains_key(*k))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "robot_tests.rs"]
mod tests;
