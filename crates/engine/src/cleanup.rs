// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic retention purge, against three independent windows
//! (`run_retention_days`, `log_retention_days`, `artifact_retention_days`):
//!
//! - A terminal run's row is only ever fully deleted (`CleanupPurged`, which
//!   cascades its logs and artifacts away with it) once it has cleared the
//!   longest of all three windows — deleting the row earlier would destroy
//!   logs or artifacts still inside their own retention.
//! - Independently, a terminal run whose logs or artifacts have individually
//!   outlived their own (shorter) window are dropped on their own cutoff via
//!   `RunLogsPurged`/`RunArtifactsPurged`, leaving the run row itself intact
//!   until its own `run_retention_days` — and the longest window overall —
//!   catches up.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hub_clock::Clock;
use hub_core::{Event, HubResult, IdGen, Run, RunId};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::store_fault;
use crate::run_engine::RunEngine;

pub struct Cleanup<C: Clock, G: IdGen> {
    engine: Arc<RunEngine<C, G>>,
}

impl<C: Clock, G: IdGen> Cleanup<C, G> {
    pub fn new(engine: Arc<RunEngine<C, G>>) -> Self {
        Self { engine }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(
            self.engine.config().cleanup_interval_seconds,
        ));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.tick() {
                        warn!(error = %err, "cleanup tick failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("cleanup shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// Purge every terminal run past its full retention window, plus any
    /// logs or artifacts that have individually outlived their own shorter
    /// window. Returns the total number of runs/logs/artifacts purged.
    pub fn tick(&self) -> HubResult<usize> {
        let now = self.engine.clock().now();
        let config = self.engine.config();
        let full_cutoff = now
            - chrono::Duration::days(
                config
                    .run_retention_days
                    .max(config.log_retention_days)
                    .max(config.artifact_retention_days),
            );
        let log_cutoff = now - chrono::Duration::days(config.log_retention_days);
        let artifact_cutoff = now - chrono::Duration::days(config.artifact_retention_days);

        let (expired_runs, expired_logs, expired_artifacts) = self.engine.store().with_state(|state| {
            let terminal: Vec<&Run> = state.runs.values().filter(|run| run.status.is_terminal()).collect();

            let expired_runs: Vec<RunId> = terminal
                .iter()
                .filter(|run| is_expired(run.finished_at, full_cutoff))
                .map(|run| run.id)
                .collect();

            let expired_logs: Vec<RunId> = terminal
                .iter()
                .filter(|run| !expired_runs.contains(&run.id))
                .filter(|run| is_expired(run.finished_at, log_cutoff))
                .filter(|run| state.run_logs.get(&run.id).is_some_and(|logs| !logs.is_empty()))
                .map(|run| run.id)
                .collect();

            let expired_artifacts: Vec<RunId> = terminal
                .iter()
                .filter(|run| !expired_runs.contains(&run.id))
                .filter(|run| is_expired(run.finished_at, artifact_cutoff))
                .filter(|run| state.artifacts.get(&run.id).is_some_and(|artifacts| !artifacts.is_empty()))
                .map(|run| run.id)
                .collect();

            (expired_runs, expired_logs, expired_artifacts)
        });

        let count = expired_runs.len() + expired_logs.len() + expired_artifacts.len();

        if !expired_runs.is_empty() {
            self.engine
                .store()
                .append(Event::CleanupPurged {
                    run_ids: expired_runs,
                    purged_at: now,
                })
                .map_err(store_fault)?;
        }
        if !expired_logs.is_empty() {
            self.engine
                .store()
                .append(Event::RunLogsPurged {
                    run_ids: expired_logs,
                    purged_at: now,
                })
                .map_err(store_fault)?;
        }
        if !expired_artifacts.is_empty() {
            self.engine
                .store()
                .append(Event::RunArtifactsPurged {
                    run_ids: expired_artifacts,
                    purged_at: now,
                })
                .map_err(store_fault)?;
        }

        Ok(count)
    }
}

fn is_expired(finished_at: Option<DateTime<Utc>>, cutoff: DateTime<Utc>) -> bool {
    finished_at.is_some_and(|t| t < cutoff)
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod tests;
