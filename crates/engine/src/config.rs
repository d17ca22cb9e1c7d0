// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tunables for the engine's periodic loops and timeouts, with defaults
//! matching the run lifecycle spec and overrides read from the environment.

use std::time::Duration;

/// Engine-wide configuration. All intervals are seconds unless noted.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub scheduler_interval_seconds: u64,
    pub sla_monitor_interval_seconds: u64,
    pub cleanup_interval_seconds: u64,
    pub queue_backlog_alert_threshold: u64,
    pub worker_stale_seconds: i64,
    pub failure_streak_threshold: usize,
    pub default_manual_timeout_seconds: u64,
    pub cancel_grace_seconds: u64,
    pub cancel_poll_interval_seconds: u64,
    /// How often an idle worker retries `ClaimNext` when the queue was
    /// empty on its last sweep.
    pub claim_poll_interval_seconds: u64,
    pub heartbeat_interval_seconds: u64,
    pub drain_timeout_seconds: u64,
    /// Consecutive failed-eligibility visits before a run is held out of
    /// the claim rotation (§4.1 ClaimNext).
    pub claim_ineligible_max_attempts: u32,
    /// Backoff applied when no schedule-specific `retry_backoff_seconds`
    /// is available to hold an ineligible run out of rotation.
    pub default_requeue_backoff_seconds: u64,
    /// Multiplier on `worker_stale_seconds` after which a stale worker's
    /// `RUNNING` runs are forcibly reclaimed (§9 design notes).
    pub watchdog_margin_seconds: u64,
    pub run_retention_days: i64,
    pub log_retention_days: i64,
    pub artifact_retention_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler_interval_seconds: 30,
            sla_monitor_interval_seconds: 60,
            cleanup_interval_seconds: 3600,
            queue_backlog_alert_threshold: 100,
            worker_stale_seconds: 180,
            failure_streak_threshold: 3,
            default_manual_timeout_seconds: 3600,
            cancel_grace_seconds: 30,
            cancel_poll_interval_seconds: 2,
            claim_poll_interval_seconds: 2,
            heartbeat_interval_seconds: 15,
            drain_timeout_seconds: 30,
            claim_ineligible_max_attempts: 3,
            default_requeue_backoff_seconds: 5,
            watchdog_margin_seconds: 180,
            run_retention_days: 90,
            log_retention_days: 30,
            artifact_retention_days: 30,
        }
    }
}

impl EngineConfig {
    /// Overlay process environment variables on top of the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_u64("SCHEDULER_INTERVAL_SECONDS") {
            config.scheduler_interval_seconds = v;
        }
        if let Some(v) = env_u64("SLA_MONITOR_INTERVAL_SECONDS") {
            config.sla_monitor_interval_seconds = v;
        }
        if let Some(v) = env_u64("QUEUE_BACKLOG_ALERT_THRESHOLD") {
            config.queue_backlog_alert_threshold = v;
        }
        if let Some(v) = env_u64("WORKER_STALE_SECONDS") {
            config.worker_stale_seconds = v as i64;
        }
        if let Some(v) = env_u64("FAILURE_STREAK_THRESHOLD") {
            config.failure_streak_threshold = v as usize;
        }
        config
    }

    pub fn cancel_grace(&self) -> Duration {
        Duration::from_secs(self.cancel_grace_seconds)
    }

    pub fn cancel_poll_interval(&self) -> Duration {
        Duration::from_secs(self.cancel_poll_interval_seconds)
    }

    pub fn claim_poll_interval(&self) -> Duration {
        Duration::from_secs(self.claim_poll_interval_seconds)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_seconds)
    }

    pub fn watchdog_margin(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.watchdog_margin_seconds as i64)
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
