// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn fake_clock_starts_at_configured_time() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let clock = FakeClock::new(start);
    assert_eq!(clock.now(), start);
}

#[test]
fn fake_clock_advance_moves_wall_and_monotonic_together() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let clock = FakeClock::new(start);
    let before = clock.monotonic();
    clock.advance(chrono::Duration::seconds(30));
    assert_eq!(clock.now(), start + chrono::Duration::seconds(30));
    assert!(clock.monotonic() >= before + std::time::Duration::from_secs(30));
}

#[test]
fn fake_clock_set_overrides_time() {
    let clock = FakeClock::new(Utc::now());
    let target = Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap();
    clock.set(target);
    assert_eq!(clock.now(), target);
}

#[test]
fn system_clock_now_is_recent() {
    let clock = SystemClock;
    let delta = Utc::now() - clock.now();
    assert!(delta.num_seconds().abs() < 5);
}
