// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake adapters for deterministic tests in downstream crates.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::artifact_store::{sha256_hex, ArtifactStore, ArtifactStoreError};
use crate::cipher::{Cipher, CipherError};
use crate::process::{ProcessError, ProcessOutput, ProcessRunner, ProcessSpec, RunningProcess};
use hub_core::{RobotId, RobotVersionId, RunId};

/// Fake cipher that just prefixes the plaintext. Never use outside tests.
#[derive(Clone, Default)]
pub struct FakeCipher;

impl Cipher for FakeCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        Ok(format!("fake:{plaintext}"))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        ciphertext
            .strip_prefix("fake:")
            .map(str::to_string)
            .ok_or_else(|| CipherError::Malformed("missing fake: prefix".to_string()))
    }
}

/// In-memory [`ArtifactStore`] for tests.
#[derive(Clone, Default)]
pub struct FakeArtifactStore {
    versions: Arc<Mutex<HashMap<(RobotId, RobotVersionId), Vec<u8>>>>,
    runs: Arc<Mutex<HashMap<(RunId, String), Vec<u8>>>>,
}

impl FakeArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for FakeArtifactStore {
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
        self.versions
            .lock()
            .insert((robot_id, version_id), bytes.to_vec());
        Ok(PathBuf::from(format!("fake://versions/{robot_id}/{version_id}")))
    }

    async fn version_artifact_path(
        &self,
        robot_id: RobotId,
        version_id: RobotVersionId,
    ) -> Result<PathBuf, ArtifactStoreError> {
        if self.versions.lock().contains_key(&(robot_id, version_id)) {
            Ok(PathBuf::from(format!("fake://versions/{robot_id}/{version_id}")))
        } else {
            Err(ArtifactStoreError::NotFound(version_id.to_string()))
        }
    }

    async fn load_version_artifact(
        &self,
        robot_id: RobotId,
        version_id: RobotVersionId,
    ) -> Result<Vec<u8>, ArtifactStoreError> {
        self.versions
            .lock()
            .get(&(robot_id, version_id))
            .cloned()
            .ok_or_else(|| ArtifactStoreError::NotFound(version_id.to_string()))
    }

    async fn store_run_artifact(
        &self,
        run_id: RunId,
        name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, ArtifactStoreError> {
        self.runs.lock().insert((run_id, name.to_string()), bytes.to_vec());
        Ok(PathBuf::from(format!("fake://runs/{run_id}/{name}")))
    }

    async fn load_run_artifact(&self, run_id: RunId, name: &str) -> Result<Vec<u8>, ArtifactStoreError> {
        self.runs
            .lock()
            .get(&(run_id, name.to_string()))
            .cloned()
            .ok_or_else(|| ArtifactStoreError::NotFound(name.to_string()))
    }
}

/// Scripted output for one [`FakeProcessRunner`] spawn.
#[derive(Clone, Default)]
pub struct ScriptedProcess {
    pub output: Vec<ProcessOutput>,
    pub exit_code: i32,
    /// Once `output` is drained, block forever instead of exiting — for
    /// simulating a long-running process under cancellation/timeout tests.
    /// Only `terminate`/`terminate_with_grace`/`kill` unblock it.
    pub hang: bool,
}

/// [`ProcessRunner`] that replays a scripted output/exit sequence instead of
/// spawning a real subprocess.
#[derive(Clone, Default)]
pub struct FakeProcessRunner {
    scripts: Arc<Mutex<HashMap<String, ScriptedProcess>>>,
    spawned: Arc<Mutex<Vec<ProcessSpec>>>,
}

impl FakeProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the output a spawn of `program` should produce.
    pub fn script(&self, program: &str, script: ScriptedProcess) {
        self.scripts.lock().insert(program.to_string(), script);
    }

    pub fn spawned_specs(&self) -> Vec<ProcessSpec> {
        self.spawned.lock().clone()
    }
}

#[async_trait]
impl ProcessRunner for FakeProcessRunner {
    async fn spawn(&self, spec: ProcessSpec) -> Result<Box<dyn RunningProcess>, ProcessError> {
        self.spawned.lock().push(spec.clone());
        let script = self
            .scripts
            .lock()
            .get(&spec.program)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(FakeRunningProcess {
            pid: 1,
            remaining: script.output.into_iter().collect(),
            exit_code: script.exit_code,
            hang: script.hang,
            terminated: false,
        }))
    }
}

struct FakeRunningProcess {
    pid: u32,
    remaining: std::collections::VecDeque<ProcessOutput>,
    exit_code: i32,
    hang: bool,
    terminated: bool,
}

#[async_trait]
impl RunningProcess for FakeRunningProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    async fn next_output(&mut self) -> Option<ProcessOutput> {
        if let Some(out) = self.remaining.pop_front() {
            return Some(out);
        }
        if self.hang && !self.terminated {
            std::future::pending::<()>().await;
        }
        None
    }

    async fn wait(&mut self) -> Result<i32, ProcessError> {
        Ok(if self.terminated { 143 } else { self.exit_code })
    }

    fn terminate(&self) -> Result<(), ProcessError> {
        Ok(())
    }

    fn kill(&self) -> Result<(), ProcessError> {
        Ok(())
    }

    async fn terminate_with_grace(&mut self, _grace: Duration) -> Result<i32, ProcessError> {
        self.terminated = true;
        Ok(143)
    }
}
