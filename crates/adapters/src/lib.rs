// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: worker subprocess execution, artifact
//! storage, and at-rest encryption of secret env binding values.

pub mod artifact_store;
pub mod cipher;
pub mod process;

pub use artifact_store::{sha256_hex, ArtifactStore, ArtifactStoreError, LocalArtifactStore};
pub use cipher::{AesGcmCipher, Cipher, CipherError};
pub use process::{
    ProcessError, ProcessOutput, ProcessRunner, ProcessSpec, RunningProcess, TokioProcessRunner,
    TERMINATE_GRACE,
};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeArtifactStore, FakeCipher, FakeProcessRunner, ScriptedProcess};
