// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-level configuration: where state lives, what address to bind,
//! and the secrets the HTTP edge itself needs (the deploy token and the
//! encryption key for secret env bindings). Engine-internal tunables
//! (`SCHEDULER_INTERVAL_SECONDS` and friends) are read by
//! [`hub_engine::EngineConfig::from_env`] instead; this config only covers
//! what the edge owns.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("ENCRYPTION_KEY must decode to exactly 32 bytes, got {0}")]
    BadKeyLength(usize),
    #[error("ENCRYPTION_KEY is not valid base64: {0}")]
    BadKeyEncoding(String),
}

/// Daemon configuration, resolved once at startup from the environment.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Root directory for the WAL, snapshots and artifact storage.
    pub data_dir: PathBuf,
    /// Address the HTTP listener binds to.
    pub bind_address: String,
    /// IANA timezone name used to interpret schedule/SLA wall-clock values
    /// that don't carry their own timezone. Schedules record their own
    /// `Tz`, so this is only a fallback.
    pub app_timezone: String,
    /// Bearer token the CI deploy-publish route requires in `x-deploy-token`.
    pub deploy_token: String,
    /// 32-byte AES-256-GCM key (base64-encoded in the environment) used to
    /// encrypt secret env binding values at rest.
    pub encryption_key: [u8; 32],
}

impl DaemonConfig {
    /// Load from the environment. `OJHUB_STATE_DIR` controls where state
    /// lives, falling back to `$XDG_STATE_HOME/ojhub` or `~/.local/state/ojhub`
    /// — the same resolution order the teacher daemon uses for its own
    /// state directory.
    pub fn load() -> Result<Self, ConfigError> {
        let data_dir = state_dir();
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let app_timezone = std::env::var("APP_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let deploy_token =
            std::env::var("DEPLOY_TOKEN").map_err(|_| ConfigError::Missing("DEPLOY_TOKEN"))?;
        let encryption_key = load_encryption_key()?;

        Ok(Self {
            data_dir,
            bind_address,
            app_timezone,
            deploy_token,
            encryption_key,
        })
    }
}

fn load_encryption_key() -> Result<[u8; 32], ConfigError> {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    let raw = std::env::var("ENCRYPTION_KEY").map_err(|_| ConfigError::Missing("ENCRYPTION_KEY"))?;
    let bytes = BASE64
        .decode(raw)
        .map_err(|e| ConfigError::BadKeyEncoding(e.to_string()))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| ConfigError::BadKeyLength(len))
}

fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("OJHUB_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("ojhub");
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".local/state/ojhub")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
