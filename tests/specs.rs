// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenario coverage for the run lifecycle: each module below is
//! one scenario driven against a real engine/worker/router triple wired over
//! fake process and artifact adapters, per `tests/specs/harness.rs`.

#[path = "specs/harness.rs"]
mod harness;
#[path = "specs/s1_manual_success.rs"]
mod s1_manual_success;
#[path = "specs/s2_timeout.rs"]
mod s2_timeout;
#[path = "specs/s3_retry.rs"]
mod s3_retry;
#[path = "specs/s4_cancel.rs"]
mod s4_cancel;
#[path = "specs/s5_sla.rs"]
mod s5_sla;
#[path = "specs/s6_log_fanout.rs"]
mod s6_log_fanout;
