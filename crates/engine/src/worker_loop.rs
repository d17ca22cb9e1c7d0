// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Worker side of a claimed run: materialize the artifact and
//! environment, spawn the child process, forward its output into
//! `AppendLog`, poll for cooperative cancellation, enforce the timeout, and
//! report the terminal outcome. One worker executes at most one run at a
//! time — a host that wants more concurrency runs more worker processes.
//!
//! `[AMBIENT]` child process spawning and line forwarding are grounded on
//! the adapter's `ProcessRunner`/`RunningProcess` pair; `ArtifactStore` and
//! `Cipher` are the two external collaborators the worker is built against
//! so this module is unit-testable with fakes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use hub_adapters::{ArtifactStore, Cipher, ProcessOutput, ProcessRunner, ProcessSpec};
use hub_clock::Clock;
use hub_core::{
    EntrypointKind, Event, HubError, HubResult, IdGen, LogLevel, RobotVersion, Run, RunId,
    RunStatus, Worker, WorkerId, WorkerStatus,
};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{store_fault, EngineError};
use crate::run_engine::{artifact_store_error_kind, ArtifactInput, RunEngine};

/// Output files a finished run declares are discovered under this
/// subdirectory of its scratch working directory.
const ARTIFACT_MANIFEST_DIR: &str = "artifacts";

pub struct WorkerLoop<C: Clock, G: IdGen, P: ProcessRunner, A: ArtifactStore, K: Cipher> {
    engine: Arc<RunEngine<C, G>>,
    worker_id: WorkerId,
    hostname: String,
    processes: Arc<P>,
    artifacts: Arc<A>,
    cipher: Arc<K>,
    scratch_root: PathBuf,
}

impl<C: Clock, G: IdGen, P: ProcessRunner, A: ArtifactStore, K: Cipher> WorkerLoop<C, G, P, A, K> {
    pub fn new(
        engine: Arc<RunEngine<C, G>>,
        worker_id: WorkerId,
        hostname: impl Into<String>,
        processes: Arc<P>,
        artifacts: Arc<A>,
        cipher: Arc<K>,
        scratch_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            worker_id,
            hostname: hostname.into(),
            processes,
            artifacts,
            cipher,
            scratch_root: scratch_root.into(),
        }
    }

    /// Register or refresh this worker's row with status RUNNING, as every
    /// worker does once on startup.
    pub fn register(&self, version: String) -> HubResult<()> {
        let now = self.engine.clock().now();
        self.engine
            .store()
            .append(Event::WorkerRegistered {
                worker: Worker {
                    id: self.worker_id,
                    hostname: self.hostname.clone(),
                    status: WorkerStatus::Running,
                    last_heartbeat: now,
                    version,
                },
            })
            .map_err(store_fault)
    }

    pub fn heartbeat(&self) -> HubResult<()> {
        let now = self.engine.clock().now();
        self.engine
            .store()
            .append(Event::WorkerHeartbeat {
                worker_id: self.worker_id,
                at: now,
            })
            .map_err(store_fault)
    }

    pub fn set_status(&self, status: WorkerStatus) -> HubResult<()> {
        self.engine
            .store()
            .append(Event::WorkerStatusChanged {
                worker_id: self.worker_id,
                status,
            })
            .map_err(store_fault)
    }

    fn accepts_claims(&self) -> bool {
        self.engine
            .store()
            .with_state(|state| state.workers.get(&self.worker_id).is_some_and(Worker::accepts_claims))
    }

    /// The worker's three cooperative loops — heartbeat, claim, shutdown
    /// drain — run as independent tasks sharing one `shutdown` signal.
    pub async fn run(self: Arc<Self>, shutdown: watch::Receiver<bool>) {
        let heartbeat = tokio::spawn(self.clone().heartbeat_loop(shutdown.clone()));
        let claim = tokio::spawn(self.clone().claim_loop(shutdown));
        let _ = tokio::join!(heartbeat, claim);
        info!(worker_id = %self.worker_id, "worker shut down");
    }

    async fn heartbeat_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.engine.config().heartbeat_interval());
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.heartbeat() {
                        warn!(error = %err, "worker heartbeat failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }

    /// While RUNNING, claims and executes one run at a time. On shutdown,
    /// stops claiming; a run already in flight gets up to
    /// `drain_timeout_seconds` to finish before this loop returns.
    async fn claim_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                return;
            }
            if !self.accepts_claims() {
                self.wait_or_shutdown(&mut shutdown).await;
                continue;
            }

            let claimed = match self.engine.claim_next(self.worker_id) {
                Ok(claimed) => claimed,
                Err(err) => {
                    warn!(error = %err, "claim_next failed");
                    None
                }
            };

            match claimed {
                Some(run_id) => {
                    let drain_timeout = Duration::from_secs(self.engine.config().drain_timeout_seconds);
                    tokio::select! {
                        result = self.execute(run_id) => {
                            if let Err(err) = result {
                                warn!(%run_id, error = %err, "run execution failed");
                            }
                        }
                        _ = tokio::time::sleep(drain_timeout), if *shutdown.borrow() => {
                            warn!(%run_id, "drain timeout elapsed with a run still in flight");
                        }
                    }
                }
                None => self.wait_or_shutdown(&mut shutdown).await,
            }
        }
    }

    async fn wait_or_shutdown(&self, shutdown: &mut watch::Receiver<bool>) {
        tokio::select! {
            _ = tokio::time::sleep(self.engine.config().claim_poll_interval()) => {}
            _ = shutdown.changed() => {}
        }
    }

    /// Materialize and run a freshly claimed `RUNNING` run end to end,
    /// always leaving it in a terminal state.
    pub async fn execute(&self, run_id: RunId) -> HubResult<()> {
        let run = self
            .engine
            .get_run(run_id)
            .ok_or_else(|| HubError::not_found(format!("run {run_id}")))?;

        match self.materialize_and_spawn(&run).await {
            Ok((spec, scratch_dir)) => self.drive(&run, spec, scratch_dir).await,
            Err(err) => self
                .engine
                .force_finish(run_id, RunStatus::Failed, Some(err.to_string())),
        }
    }

    async fn materialize_and_spawn(
        &self,
        run: &Run,
    ) -> Result<(ProcessSpec, PathBuf), EngineError> {
        let version = self
            .engine
            .store()
            .with_state(|state| state.robot_versions.get(&run.robot_version_id).cloned())
            .ok_or_else(|| HubError::not_found(format!("robot version {}", run.robot_version_id)))?;

        let artifact_bytes = self
            .artifacts
            .load_version_artifact(run.robot_id, run.robot_version_id)
            .await
            .map_err(|err| EngineError::Hub(artifact_store_error_kind(&err)))?;
        let actual_digest = hub_adapters::sha256_hex(&artifact_bytes);
        if actual_digest != version.artifact_digest {
            return Err(EngineError::Hub(artifact_store_error_kind(
                &hub_adapters::ArtifactStoreError::DigestMismatch {
                    expected: version.artifact_digest.clone(),
                    actual: actual_digest,
                },
            )));
        }

        let scratch_dir = self.scratch_root.join(run.id.to_string());
        tokio::fs::create_dir_all(&scratch_dir)
            .await
            .map_err(hub_adapters::ArtifactStoreError::Io)?;
        extract_artifact(&version, &artifact_bytes, &scratch_dir)?;

        let env = self.assemble_env(&version, run)?;
        let (program, mut arguments) = entrypoint(&version, &scratch_dir);
        arguments.extend(run.runtime_payload.runtime_arguments.clone());

        Ok((
            ProcessSpec {
                program,
                arguments,
                working_dir: Some(version.working_dir.as_ref().map_or_else(
                    || scratch_dir.clone(),
                    |dir| scratch_dir.join(dir),
                )),
                env,
            },
            scratch_dir,
        ))
    }

    fn assemble_env(
        &self,
        version: &RobotVersion,
        run: &Run,
    ) -> Result<HashMap<String, String>, EngineError> {
        let mut env: HashMap<String, String> = version.default_env.clone().into_iter().collect();

        let bindings = self
            .engine
            .store()
            .with_state(|state| state.env_bindings_for(run.robot_id, run.env_name).cloned().collect::<Vec<_>>());
        for binding in bindings {
            let value = if binding.is_secret {
                self.cipher.decrypt(&binding.value)?
            } else {
                binding.value
            };
            env.insert(binding.key, value);
        }

        env.extend(run.runtime_payload.runtime_env.clone());

        let missing: Vec<&str> = version
            .required_env_keys
            .iter()
            .filter(|key| !env.contains_key(*key))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::Hub(HubError::precondition_failed(format!(
                "MissingRequiredEnv: {}",
                missing.join(", ")
            ))));
        }

        Ok(env)
    }

    async fn drive(
        &self,
        run: &Run,
        spec: ProcessSpec,
        scratch_dir: PathBuf,
    ) -> HubResult<()> {
        let run_id = run.id;
        let mut process = self
            .processes
            .spawn(spec)
            .await
            .map_err(|err| HubError::transient(err.to_string()))?;
        self.engine
            .report_start(run_id, self.hostname.clone(), process.pid())?;

        let timeout = self.run_timeout(run);
        let cancel_poll = self.engine.config().cancel_poll_interval();
        let cancel_grace = self.engine.config().cancel_grace();
        let mut cancel_ticker = tokio::time::interval(cancel_poll);
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                output = process.next_output() => {
                    match output {
                        Some(ProcessOutput::Stdout(line)) => {
                            let _ = self.engine.append_log(run_id, LogLevel::Info, line);
                        }
                        Some(ProcessOutput::Stderr(line)) => {
                            let _ = self.engine.append_log(run_id, LogLevel::Error, line);
                        }
                        None => {
                            let code = process.wait().await.map_err(|err| HubError::transient(err.to_string()))?;
                            return self.finish(run_id, &scratch_dir, code).await;
                        }
                    }
                }
                _ = cancel_ticker.tick() => {
                    if self.engine.get_run(run_id).is_some_and(|r| r.cancel_requested) {
                        let _ = process.terminate_with_grace(cancel_grace).await;
                        return self.engine.force_finish(run_id, RunStatus::Canceled, None);
                    }
                }
                _ = &mut deadline => {
                    let _ = process.terminate_with_grace(cancel_grace).await;
                    return self
                        .engine
                        .force_finish(run_id, RunStatus::Failed, Some("TIMEOUT".to_string()));
                }
            }
        }
    }

    fn run_timeout(&self, run: &Run) -> Duration {
        let seconds = run
            .schedule_id
            .and_then(|_| self.engine.store().with_state(|state| state.schedule_for(run.robot_id).map(|s| s.timeout_seconds)))
            .unwrap_or(self.engine.config().default_manual_timeout_seconds);
        Duration::from_secs(seconds)
    }

    async fn finish(&self, run_id: RunId, scratch_dir: &Path, exit_code: i32) -> HubResult<()> {
        let artifacts = collect_artifacts(scratch_dir)
            .await
            .map_err(|err| artifact_store_error_kind(&err))?;
        let mut uploaded = Vec::with_capacity(artifacts.len());
        for (name, bytes) in artifacts {
            let path = self
                .artifacts
                .store_run_artifact(run_id, &name, &bytes)
                .await
                .map_err(|err| artifact_store_error_kind(&err))?;
            uploaded.push(ArtifactInput {
                size_bytes: bytes.len() as u64,
                content_type: None,
                name,
                path: path.display().to_string(),
            });
        }

        if exit_code == 0 {
            self.engine.report_finish(run_id, RunStatus::Success, None, uploaded)
        } else {
            self.engine.report_finish(
                run_id,
                RunStatus::Failed,
                Some(format!("exit code {exit_code}")),
                uploaded,
            )
        }
    }
}

fn entrypoint(version: &RobotVersion, scratch_dir: &Path) -> (String, Vec<String>) {
    let path = scratch_dir.join(&version.entrypoint_path).display().to_string();
    match version.entrypoint_kind {
        EntrypointKind::Binary => (path, version.default_arguments.clone()),
        EntrypointKind::Script => {
            let mut arguments = vec![path];
            arguments.extend(version.default_arguments.clone());
            ("python3".to_string(), arguments)
        }
    }
}

fn extract_artifact(
    version: &RobotVersion,
    artifact_bytes: &[u8],
    scratch_dir: &Path,
) -> Result<(), hub_adapters::ArtifactStoreError> {
    match version.artifact_kind {
        hub_core::ArtifactKind::Exe => {
            let dest = scratch_dir.join(&version.entrypoint_path);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&dest, artifact_bytes)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mut perms = std::fs::metadata(&dest)?.permissions();
                perms.set_mode(0o755);
                std::fs::set_permissions(&dest, perms)?;
            }
            Ok(())
        }
        hub_core::ArtifactKind::Zip => {
            let cursor = std::io::Cursor::new(artifact_bytes);
            let mut archive = zip::ZipArchive::new(cursor)
                .map_err(|e| hub_adapters::ArtifactStoreError::NotFound(e.to_string()))?;
            archive
                .extract(scratch_dir)
                .map_err(|e| hub_adapters::ArtifactStoreError::NotFound(e.to_string()))
        }
    }
}

async fn collect_artifacts(
    scratch_dir: &Path,
) -> Result<Vec<(String, Vec<u8>)>, hub_adapters::ArtifactStoreError> {
    let manifest_dir = scratch_dir.join(ARTIFACT_MANIFEST_DIR);
    if !manifest_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    let mut entries = tokio::fs::read_dir(&manifest_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let bytes = tokio::fs::read(entry.path()).await?;
            out.push((name, bytes));
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "worker_loop_tests.rs"]
mod tests;
