// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared state every HTTP handler closes over.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hub_adapters::{ArtifactStore, Cipher};
use hub_clock::Clock;
use hub_core::IdGen;
use hub_engine::RunEngine;

/// State shared across every route. Generic over the clock/id-gen pair so
/// integration tests can wire in `FakeClock`/`SequentialIdGen` the same way
/// `hub-engine`'s own test harnesses do.
pub struct AppState<C: Clock, G: IdGen> {
    pub engine: Arc<RunEngine<C, G>>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub cipher: Arc<dyn Cipher>,
    pub deploy_token: String,
    /// When the daemon process came up, for `GET /ops/status`'s uptime field.
    pub started_at: DateTime<Utc>,
}

impl<C: Clock, G: IdGen> Clone for AppState<C, G> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            artifacts: self.artifacts.clone(),
            cipher: self.cipher.clone(),
            deploy_token: self.deploy_token.clone(),
            started_at: self.started_at,
        }
    }
}
