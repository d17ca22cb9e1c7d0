// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The authoritative state machine for every run. Every public operation
//! here computes zero or more `Event`s, appends them to the WAL via `Store`,
//! and applies them to the in-memory `MaterializedState` under its mutex —
//! the same split the teacher draws between `oj-storage` and its runtime.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hub_adapters::ArtifactStoreError;
use hub_clock::Clock;
use hub_core::{
    Artifact, ArtifactId, CreateRunInput, EnvName, Event, HubError, HubResult, IdGen, LogLevel,
    Run, RunId, RunLog, RunStatus, RuntimePayload, ScheduleId, TriggerType, WorkerId,
};
use hub_storage::Store;

use crate::config::EngineConfig;
use crate::error::store_fault;
use crate::log_bus::LogBus;
use crate::queue::Queue;

/// Maximum length an `error_message` is truncated to before persisting
/// (§7: "truncated to 1 KiB").
const ERROR_MESSAGE_LIMIT: usize = 1024;

/// Parameters accepted by [`RunEngine::create_run`].
pub struct CreateRunParams {
    pub robot_id: hub_core::RobotId,
    /// Explicit version, or `None` to use the robot's active version.
    pub version_id: Option<hub_core::RobotVersionId>,
    pub env_name: EnvName,
    pub runtime_payload: RuntimePayload,
    pub trigger_type: TriggerType,
    pub triggered_by: Option<String>,
    pub attempt: u32,
    pub schedule_id: Option<ScheduleId>,
    pub service_id: Option<String>,
    /// Overrides `queued_at`; used by the retry path to apply
    /// `retry_backoff_seconds` as a not-before timestamp.
    pub not_before: Option<DateTime<Utc>>,
}

/// An output artifact a finishing run declares, before an id is assigned.
#[derive(Debug, Clone)]
pub struct ArtifactInput {
    pub name: String,
    pub path: String,
    pub size_bytes: u64,
    pub content_type: Option<String>,
}

pub struct RunEngine<C: Clock, G: IdGen> {
    store: Arc<Store>,
    clock: C,
    ids: G,
    config: EngineConfig,
    queue: Queue,
    log_bus: Arc<LogBus>,
}

impl<C: Clock, G: IdGen> RunEngine<C, G> {
    pub fn new(store: Arc<Store>, clock: C, ids: G, config: EngineConfig, log_bus: Arc<LogBus>) -> Self {
        Self {
            store,
            clock,
            ids,
            config,
            queue: Queue::new(),
            log_bus,
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn log_bus(&self) -> &Arc<LogBus> {
        &self.log_bus
    }

    pub fn ids(&self) -> &G {
        &self.ids
    }

    /// `CreateRun`: resolve the version, validate the trigger, persist a
    /// `PENDING` run, and emit its initial `"enqueued"` log line.
    pub fn create_run(&self, params: CreateRunParams) -> HubResult<RunId> {
        let now = self.clock.now();

        let robot_version_id = self.store.with_state(|state| -> HubResult<_> {
            if state.robots.get(&params.robot_id).is_none() {
                return Err(HubError::not_found(format!("robot {}", params.robot_id)));
            }
            match params.version_id {
                Some(version_id) => {
                    let version = state
                        .robot_versions
                        .get(&version_id)
                        .ok_or_else(|| HubError::not_found(format!("robot version {version_id}")))?;
                    if version.robot_id != params.robot_id {
                        return Err(HubError::validation(format!(
                            "version {version_id} does not belong to robot {}",
                            params.robot_id
                        )));
                    }
                    Ok(version_id)
                }
                None => state
                    .active_version(params.robot_id)
                    .map(|v| v.id)
                    .ok_or_else(|| HubError::precondition_failed("no active version for robot")),
            }
        })?;

        match params.trigger_type {
            TriggerType::Scheduled if params.schedule_id.is_none() => {
                return Err(HubError::validation("SCHEDULED trigger requires schedule_id"));
            }
            TriggerType::Retry if params.attempt < 2 => {
                return Err(HubError::validation("RETRY trigger requires attempt >= 2"));
            }
            _ => {}
        }

        let run_id = RunId::from_uuid(self.ids.next());
        let queued_at = params.not_before.unwrap_or(now);
        let run = Run::new(
            run_id,
            CreateRunInput {
                robot_id: params.robot_id,
                robot_version_id,
                env_name: params.env_name,
                runtime_payload: params.runtime_payload,
                trigger_type: params.trigger_type,
                triggered_by: params.triggered_by,
                attempt: params.attempt,
                schedule_id: params.schedule_id,
                service_id: params.service_id,
            },
            queued_at,
        );

        self.store
            .append(Event::RunCreated { run })
            .map_err(store_fault)?;
        self.emit_log(run_id, LogLevel::Info, "enqueued".to_string(), now)
            .map_err(store_fault)?;

        Ok(run_id)
    }

    /// `ClaimNext`: pop the next eligible `PENDING` run for `worker_id` and
    /// transition it to `RUNNING`. The single atomic PENDING→RUNNING gate.
    pub fn claim_next(&self, worker_id: WorkerId) -> HubResult<Option<RunId>> {
        let now = self.clock.now();

        let accepts = self
            .store
            .with_state(|state| state.workers.get(&worker_id).map(|w| w.accepts_claims()));
        match accepts {
            None => return Err(HubError::not_found(format!("worker {worker_id}"))),
            Some(false) => return Ok(None),
            Some(true) => {}
        }

        let claimed = self
            .store
            .with_state(|state| self.queue.next_eligible(state, now, &self.config).map(|run| run.id));

        let Some(run_id) = claimed else {
            return Ok(None);
        };

        self.store
            .append(Event::RunClaimed {
                run_id,
                worker_id,
                claimed_at: now,
            })
            .map_err(store_fault)?;
        self.queue.forget(run_id);
        Ok(Some(run_id))
    }

    /// `ReportStart`: record where and under which pid a claimed run began
    /// executing.
    pub fn report_start(&self, run_id: RunId, host_name: String, process_id: u32) -> HubResult<()> {
        let now = self.clock.now();
        let run = self.require_run(run_id)?;
        if run.status != RunStatus::Running {
            return Err(HubError::precondition_failed(format!(
                "run {run_id} is not RUNNING"
            )));
        }
        if run.host_name.as_deref() == Some(host_name.as_str()) && run.process_id == Some(process_id) {
            return Ok(()); // idempotent resend of the same start
        }
        self.store
            .append(Event::RunStarted {
                run_id,
                host_name,
                process_id,
                started_at: now,
            })
            .map_err(store_fault)
    }

    /// `AppendLog`: append a line, tagging it `post_terminal` if the run has
    /// already reached a terminal state. Returns the assigned sequence.
    pub fn append_log(&self, run_id: RunId, level: LogLevel, message: String) -> HubResult<u64> {
        self.require_run(run_id)?;
        let now = self.clock.now();
        self.emit_log(run_id, level, message, now).map_err(store_fault)
    }

    fn emit_log(
        &self,
        run_id: RunId,
        level: LogLevel,
        message: String,
        now: DateTime<Utc>,
    ) -> Result<u64, hub_storage::StoreError> {
        let (sequence, post_terminal) = self.store.with_state(|state| {
            let sequence = state
                .run_logs
                .get(&run_id)
                .and_then(|logs| logs.last())
                .map(|l| l.sequence + 1)
                .unwrap_or(1);
            let post_terminal = state
                .runs
                .get(&run_id)
                .map(|r| r.status.is_terminal())
                .unwrap_or(false);
            (sequence, post_terminal)
        });

        self.store.append(Event::RunLogAppended {
            run_id,
            sequence,
            timestamp: now,
            level,
            message: message.clone(),
            post_terminal,
        })?;

        self.log_bus.publish(RunLog {
            run_id,
            sequence,
            timestamp: now,
            level,
            message,
            post_terminal,
        });

        Ok(sequence)
    }

    /// `ReportFinish`: the worker's terminal report for a `RUNNING` run.
    /// Evaluates the retry policy on `FAILED`.
    pub fn report_finish(
        &self,
        run_id: RunId,
        outcome: RunStatus,
        error_message: Option<String>,
        artifacts: Vec<ArtifactInput>,
    ) -> HubResult<()> {
        let run = self.require_run(run_id)?;
        if run.status != RunStatus::Running {
            return Err(HubError::precondition_failed(format!(
                "run {run_id} is not RUNNING"
            )));
        }
        self.finish_run(&run, outcome, error_message, artifacts)
    }

    /// Force a `RUNNING` run to a terminal state without worker cooperation:
    /// used by the watchdog (stale worker, timeout) and the cancel-grace
    /// timeout path. Silently a no-op if the run already reached a terminal
    /// state (idempotent by construction).
    pub fn force_finish(
        &self,
        run_id: RunId,
        outcome: RunStatus,
        error_message: Option<String>,
    ) -> HubResult<()> {
        let run = self.require_run(run_id)?;
        if run.status.is_terminal() {
            return Ok(());
        }
        self.finish_run(&run, outcome, error_message, Vec::new())
    }

    fn finish_run(
        &self,
        run: &Run,
        outcome: RunStatus,
        error_message: Option<String>,
        artifacts: Vec<ArtifactInput>,
    ) -> HubResult<()> {
        let now = self.clock.now();
        let started_at = run.started_at.unwrap_or(run.queued_at);
        let duration_seconds = (now - started_at).num_milliseconds().max(0) as f64 / 1000.0;
        let error_message = error_message.map(|m| truncate(&m, ERROR_MESSAGE_LIMIT));

        let artifacts: Vec<Artifact> = artifacts
            .into_iter()
            .map(|a| Artifact {
                id: ArtifactId::from_uuid(self.ids.next()),
                run_id: run.id,
                name: a.name,
                path: a.path,
                size_bytes: a.size_bytes,
                content_type: a.content_type,
            })
            .collect();

        self.store
            .append(Event::RunFinished {
                run_id: run.id,
                status: outcome,
                finished_at: now,
                duration_seconds,
                error_message,
                artifacts,
            })
            .map_err(store_fault)?;

        if outcome == RunStatus::Failed {
            self.maybe_retry(run, now)?;
        }
        Ok(())
    }

    fn maybe_retry(&self, run: &Run, now: DateTime<Utc>) -> HubResult<()> {
        if run.trigger_type == TriggerType::Manual {
            return Ok(());
        }
        let Some(schedule) = self.store.with_state(|state| state.schedule_for(run.robot_id).cloned())
        else {
            return Ok(());
        };
        if schedule.retry_count == 0 || run.attempt > schedule.retry_count {
            return Ok(());
        }

        self.create_run(CreateRunParams {
            robot_id: run.robot_id,
            version_id: Some(run.robot_version_id),
            env_name: run.env_name,
            runtime_payload: run.runtime_payload.clone(),
            trigger_type: TriggerType::Retry,
            triggered_by: run.triggered_by.clone(),
            attempt: run.attempt + 1,
            schedule_id: run.schedule_id,
            service_id: run.service_id.clone(),
            not_before: Some(now + chrono::Duration::seconds(schedule.retry_backoff_seconds as i64)),
        })?;
        Ok(())
    }

    /// `RequestCancel`: idempotent. `PENDING` runs cancel immediately;
    /// `RUNNING` runs only have the flag set, the Worker observes it.
    pub fn request_cancel(&self, run_id: RunId, user: String) -> HubResult<()> {
        let run = self.require_run(run_id)?;
        if run.status.is_terminal() {
            return Ok(()); // re-cancel of a terminal run is a no-op
        }
        let now = self.clock.now();
        self.store
            .append(Event::RunCancelRequested {
                run_id,
                requested_by: user,
                requested_at: now,
            })
            .map_err(store_fault)?;

        if run.status == RunStatus::Pending {
            self.queue.forget(run_id);
            self.finish_run(&run, RunStatus::Canceled, None, Vec::new())?;
        }
        Ok(())
    }

    /// `GetLogsSince`: ordered logs with sequence strictly greater than `seq`.
    pub fn get_logs_since(&self, run_id: RunId, seq: u64) -> HubResult<Vec<RunLog>> {
        self.require_run(run_id)?;
        Ok(self.store.with_state(|state| state.logs_since(run_id, seq).to_vec()))
    }

    pub fn get_run(&self, run_id: RunId) -> Option<Run> {
        self.store.with_state(|state| state.runs.get(&run_id).cloned())
    }

    fn require_run(&self, run_id: RunId) -> HubResult<Run> {
        self.get_run(run_id)
            .ok_or_else(|| HubError::not_found(format!("run {run_id}")))
    }
}

fn truncate(message: &str, limit: usize) -> String {
    if message.len() <= limit {
        message.to_string()
    } else {
        message.chars().take(limit).collect()
    }
}

/// Wraps an [`ArtifactStoreError`] surfaced while a worker uploads a
/// declared output artifact into the `Fatal`/`Transient` taxonomy.
pub fn artifact_store_error_kind(err: &ArtifactStoreError) -> HubError {
    match err {
        ArtifactStoreError::Io(_) => HubError::transient(err.to_string()),
        ArtifactStoreError::DigestMismatch { .. } => HubError::validation(err.to_string()),
        ArtifactStoreError::NotFound(_) => HubError::not_found(err.to_string()),
    }
}

#[cfg(test)]
#[path = "run_engine_tests.rs"]
mod tests;
