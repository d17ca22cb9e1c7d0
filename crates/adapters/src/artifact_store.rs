// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem storage for published robot version artifacts and run output
//! artifacts, with SHA-256 digest verification for the former.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hub_core::{RobotId, RobotVersionId, RunId};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },
    #[error("artifact not found: {0}")]
    NotFound(String),
}

/// Hex-encoded SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Storage for published artifacts (robot version code) and run-produced
/// output artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync + 'static {
    /// Store a published version's artifact bytes, verifying the digest
    /// matches what the registry recorded.
    async fn store_version_artifact(
        &self,
        robot_id: RobotId,
        version_id: RobotVersionId,
        bytes: &[u8],
        expected_digest: &str,
    ) -> Result<PathBuf, ArtifactStoreError>;

    /// Path to a previously stored version artifact.
    async fn version_artifact_path(
        &self,
        robot_id: RobotId,
        version_id: RobotVersionId,
    ) -> Result<PathBuf, ArtifactStoreError>;

    /// Read back a previously stored version artifact's bytes, for a worker
    /// materializing it into a scratch directory.
    async fn load_version_artifact(
        &self,
        robot_id: RobotId,
        version_id: RobotVersionId,
    ) -> Result<Vec<u8>, ArtifactStoreError>;

    /// Store a run's output artifact, returning its path on disk.
    async fn store_run_artifact(
        &self,
        run_id: RunId,
        name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, ArtifactStoreError>;

    /// Read back a run's output artifact.
    async fn load_run_artifact(&self, run_id: RunId, name: &str) -> Result<Vec<u8>, ArtifactStoreError>;
}

/// Filesystem-backed [`ArtifactStore`] rooted at a single directory.
#[derive(Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn version_path(&self, robot_id: RobotId, version_id: RobotVersionId) -> PathBuf {
        self.root
            .join("versions")
            .join(robot_id.to_string())
            .join(version_id.to_string())
    }

    fn run_artifact_path(&self, run_id: RunId, name: &str) -> PathBuf {
        self.root.join("runs").join(run_id.to_string()).join(name)
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ArtifactStoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn store_version_artifact(
        &self,
        robot_id: RobotId,
        version_id: RobotVersionId,
        bytes: &[u8],
        expected_digest: &str,
    ) -> Result<PathBuf, ArtifactStoreError> {
        let actual = sha256_hex(bytes);
        if actual != expected_digest {
            return Err(ArtifactStoreError::DigestMismatch {
                expected: expected_digest.to_string(),
                actual,
            });
        }
        let path = self.version_path(robot_id, version_id);
        write_atomic(&path, bytes).await?;
        Ok(path)
    }

    async fn version_artifact_path(
        &self,
        robot_id: RobotId,
        version_id: RobotVersionId,
    ) -> Result<PathBuf, ArtifactStoreError> {
        let path = self.version_path(robot_id, version_id);
        if !path.exists() {
            return Err(ArtifactStoreError::NotFound(path.display().to_string()));
        }
        Ok(path)
    }

    async fn load_version_artifact(
        &self,
        robot_id: RobotId,
        version_id: RobotVersionId,
    ) -> Result<Vec<u8>, ArtifactStoreError> {
        let path = self.version_path(robot_id, version_id);
        tokio::fs::read(&path)
            .await
            .map_err(|_| ArtifactStoreError::NotFound(path.display().to_string()))
    }

    async fn store_run_artifact(
        &self,
        run_id: RunId,
        name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, ArtifactStoreError> {
        let path = self.run_artifact_path(run_id, name);
        write_atomic(&path, bytes).await?;
        Ok(path)
    }

    async fn load_run_artifact(&self, run_id: RunId, name: &str) -> Result<Vec<u8>, ArtifactStoreError> {
        let path = self.run_artifact_path(run_id, name);
        tokio::fs::read(&path)
            .await
            .map_err(|_| ArtifactStoreError::NotFound(path.display().to_string()))
    }
}

#[cfg(test)]
#[path = "artifact_store_tests.rs"]
mod tests;
