// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-robot, per-environment configuration and secret values.

use serde::{Deserialize, Serialize};

use crate::robot::RobotId;
use crate::run::EnvName;

/// A (robot, env_name, key) config or secret value. Secret values are stored
/// as ciphertext; plaintext exists only transiently inside a worker's
/// spawned environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotEnvBinding {
    pub robot_id: RobotId,
    pub env_name: EnvName,
    pub key: String,
    /// Ciphertext (base64) if `is_secret`, plaintext otherwise.
    pub value: String,
    pub is_secret: bool,
}

/// Redacted view of a binding returned over HTTP. Secret values never leave
/// the process in plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactedEnvBinding {
    pub key: String,
    pub value: Option<String>,
    pub is_secret: bool,
    pub is_set: bool,
}

impl From<&RobotEnvBinding> for RedactedEnvBinding {
    fn from(binding: &RobotEnvBinding) -> Self {
        Self {
            key: binding.key.clone(),
            value: if binding.is_secret {
                None
            } else {
                Some(binding.value.clone())
            },
            is_secret: binding.is_secret,
            is_set: true,
        }
    }
}

#[cfg(test)]
#[path = "env_binding_tests.rs"]
mod tests;
