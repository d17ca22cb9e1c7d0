// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error plumbing for the engine crate.
//!
//! Public `RunEngine` operations return [`hub_core::HubError`] directly, per
//! the error taxonomy in the run lifecycle spec: Store failures are never
//! swallowed, they become component faults. [`EngineError`] additionally
//! covers the adapter-level failures (`ProcessError`, `ArtifactStoreError`,
//! `CipherError`) seen inside the Worker loop, which are caught there and
//! turned into a `FAILED` run rather than propagated.

use hub_adapters::{ArtifactStoreError, CipherError, ProcessError};
use hub_core::HubError;
use hub_storage::StoreError;
use thiserror::Error;

/// Errors surfaced inside the Worker loop while materializing and running a
/// claimed run. Never propagated to callers of `RunEngine`; translated into
/// `ReportFinish(FAILED, error_message)`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Hub(#[from] HubError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Artifact(#[from] ArtifactStoreError),
    #[error(transparent)]
    Cipher(#[from] CipherError),
}

/// Store failures are infrastructure faults, never validation errors:
/// surface them as `HubError::Fatal` so the daemon edge maps them to 5xx.
pub fn store_fault(err: StoreError) -> HubError {
    HubError::fatal(err.to_string())
}
