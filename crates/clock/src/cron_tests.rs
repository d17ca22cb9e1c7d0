// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn rejects_wrong_field_count() {
    assert!(CronSchedule::parse("* * *").is_err());
}

#[test]
fn rejects_out_of_range_values() {
    assert!(CronSchedule::parse("60 * * * *").is_err());
    assert!(CronSchedule::parse("* 24 * * *").is_err());
}

#[test]
fn every_five_minutes_fires_on_the_five_boundaries() {
    let cron = CronSchedule::parse("*/5 * * * *").unwrap();
    let after = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let through = Utc.with_ymd_and_hms(2026, 1, 1, 0, 20, 0).unwrap();
    let fires = cron.fire_times_between(chrono_tz::UTC, after, through);
    let minutes: Vec<u32> = fires.iter().map(|f| f.minute()).collect();
    assert_eq!(minutes, vec![5, 10, 15, 20]);
}

#[test]
fn daily_at_noon_fires_once_per_day() {
    let cron = CronSchedule::parse("0 12 * * *").unwrap();
    let after = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let through = Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap();
    let fires = cron.fire_times_between(chrono_tz::UTC, after, through);
    assert_eq!(fires.len(), 2);
    assert_eq!(fires[0].day(), 1);
    assert_eq!(fires[1].day(), 2);
}

#[test]
fn dom_or_dow_union_when_both_restricted() {
    // Fires on the 1st of the month OR on Mondays.
    let cron = CronSchedule::parse("0 0 1 * 1").unwrap();
    let after = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    let through = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
    let fires = cron.fire_times_between(chrono_tz::UTC, after, through);
    // 2026-03-02 is a Monday; 2026-03-09 is the next Monday.
    let days: Vec<u32> = fires.iter().map(|f| f.day()).collect();
    assert_eq!(days, vec![2, 9]);
}

#[test]
fn spring_forward_gap_never_fires() {
    // America/Sao_Paulo abolished DST in 2019; use a classic US zone for the
    // gap instead: 2023-03-12 02:00 America/New_York springs forward to 03:00.
    let cron = CronSchedule::parse("30 2 * * *").unwrap();
    let tz: Tz = chrono_tz::America::New_York;
    let after = Utc.with_ymd_and_hms(2023, 3, 11, 0, 0, 0).unwrap();
    let through = Utc.with_ymd_and_hms(2023, 3, 13, 0, 0, 0).unwrap();
    let fires = cron.fire_times_between(tz, after, through);
    for f in &fires {
        let local = f.with_timezone(&tz);
        assert_ne!((local.day(), local.hour()), (12, 2));
    }
}

#[test]
fn fall_back_ambiguous_hour_fires_once() {
    // 2023-11-05 01:30 America/New_York occurs twice (fall back at 02:00->01:00).
    let cron = CronSchedule::parse("30 1 * * *").unwrap();
    let tz: Tz = chrono_tz::America::New_York;
    let after = Utc.with_ymd_and_hms(2023, 11, 4, 0, 0, 0).unwrap();
    let through = Utc.with_ymd_and_hms(2023, 11, 6, 0, 0, 0).unwrap();
    let fires = cron.fire_times_between(tz, after, through);
    let on_fallback_day: Vec<_> = fires
        .iter()
        .filter(|f| f.with_timezone(&tz).day() == 5)
        .collect();
    assert_eq!(on_fallback_day.len(), 1);
}

#[test]
fn next_fire_after_returns_the_soonest_instant() {
    let cron = CronSchedule::parse("0 * * * *").unwrap();
    let after = Utc.with_ymd_and_hms(2026, 1, 1, 0, 10, 0).unwrap();
    let next = cron.next_fire_after(chrono_tz::UTC, after).unwrap();
    assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 1, 1, 0, 0).unwrap());
}
