// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hub-clock: wall-clock/monotonic time abstraction plus cron evaluation.
//!
//! Every component that needs "now" (the RunEngine's timeouts, the
//! Scheduler's fire-time walk, the SLAMonitor's lateness checks) takes a
//! `Clock` rather than calling `Utc::now()` directly, so tests can drive
//! time deterministically with `FakeClock`.

pub mod cron;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// Source of wall-clock and monotonic time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
    fn monotonic(&self) -> Instant;
}

/// Production clock backed by the OS.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn monotonic(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock for tests. Wall-clock time is set explicitly and only
/// advances when `advance`/`set` is called; monotonic time tracks an
/// `Instant` captured at construction plus the same elapsed wall-clock delta,
/// so duration-based assertions (timeouts, heartbeat staleness) hold without
/// sleeping real time.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<FakeClockState>>,
}

struct FakeClockState {
    now: DateTime<Utc>,
    monotonic_origin: Instant,
    wall_origin: DateTime<Utc>,
}

impl FakeClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeClockState {
                now: start,
                monotonic_origin: Instant::now(),
                wall_origin: start,
            })),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.inner.lock().now = at;
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut state = self.inner.lock();
        state.now += delta;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        self.inner.lock().now
    }

    fn monotonic(&self) -> Instant {
        let state = self.inner.lock();
        let elapsed = state.now - state.wall_origin;
        state.monotonic_origin
            + elapsed
                .to_std()
                .unwrap_or(std::time::Duration::from_secs(0))
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
