// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Standard 5-field cron expressions (minute hour day-of-month month
//! day-of-week), evaluated by walking fire times in local time so DST
//! transitions behave the way an operator expects: ambiguous local times
//! during fall-back fire once, at the earliest instant; local times that
//! don't exist during spring-forward are skipped entirely.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use thiserror::Error;

const MAX_WALK_MINUTES: i64 = 366 * 24 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CronError {
    #[error("cron expression must have exactly 5 fields, got {0}")]
    WrongFieldCount(usize),
    #[error("invalid cron field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldSet {
    allowed: Vec<bool>,
    min: u32,
}

impl FieldSet {
    fn parse(spec: &str, min: u32, max: u32) -> Result<Self, CronError> {
        let size = (max - min + 1) as usize;
        let mut allowed = vec![false; size];
        for part in spec.split(',') {
            Self::parse_part(part, min, max, &mut allowed)?;
        }
        Ok(Self { allowed, min })
    }

    fn parse_part(part: &str, min: u32, max: u32, allowed: &mut [bool]) -> Result<(), CronError> {
        let invalid = |reason: &str| CronError::InvalidField {
            field: part.to_string(),
            reason: reason.to_string(),
        };

        let (range_spec, step) = match part.split_once('/') {
            Some((r, s)) => {
                let step: u32 = s.parse().map_err(|_| invalid("step must be a number"))?;
                if step == 0 {
                    return Err(invalid("step must be > 0"));
                }
                (r, step)
            }
            None => (part, 1),
        };

        let (start, end) = if range_spec == "*" {
            (min, max)
        } else if let Some((a, b)) = range_spec.split_once('-') {
            let a: u32 = a.parse().map_err(|_| invalid("invalid range start"))?;
            let b: u32 = b.parse().map_err(|_| invalid("invalid range end"))?;
            if a > b || a < min || b > max {
                return Err(invalid("range out of bounds"));
            }
            (a, b)
        } else {
            let v: u32 = range_spec.parse().map_err(|_| invalid("not a number"))?;
            if v < min || v > max {
                return Err(invalid("value out of bounds"));
            }
            (v, v)
        };

        let mut v = start;
        while v <= end {
            allowed[(v - min) as usize] = true;
            v += step;
        }
        Ok(())
    }

    fn contains(&self, value: u32) -> bool {
        self.allowed
            .get((value.saturating_sub(self.min)) as usize)
            .copied()
            .unwrap_or(false)
    }

    fn is_wildcard(&self) -> bool {
        self.allowed.iter().all(|&b| b)
    }
}

/// A parsed 5-field cron expression, ready to be evaluated against a
/// timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    minute: FieldSet,
    hour: FieldSet,
    day_of_month: FieldSet,
    month: FieldSet,
    day_of_week: FieldSet,
    restricts_dom: bool,
    restricts_dow: bool,
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self, CronError> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(CronError::WrongFieldCount(fields.len()));
        }
        let minute = FieldSet::parse(fields[0], 0, 59)?;
        let hour = FieldSet::parse(fields[1], 0, 23)?;
        let day_of_month = FieldSet::parse(fields[2], 1, 31)?;
        let month = FieldSet::parse(fields[3], 1, 12)?;
        let day_of_week = FieldSet::parse(fields[4], 0, 6)?;
        Ok(Self {
            restricts_dom: !day_of_month.is_wildcard(),
            restricts_dow: !day_of_week.is_wildcard(),
            minute,
            hour,
            day_of_month,
            month,
            day_of_week,
        })
    }

    /// Whether this local naive minute satisfies the expression. Per
    /// standard cron semantics, when both day-of-month and day-of-week are
    /// restricted, a match on either is sufficient.
    fn matches_naive(&self, dt: &NaiveDateTime) -> bool {
        if !self.minute.contains(dt.minute()) || !self.hour.contains(dt.hour()) {
            return false;
        }
        if !self.month.contains(dt.month()) {
            return false;
        }
        let dom_match = self.day_of_month.contains(dt.day());
        // chrono's weekday: Mon=0..Sun=6; cron's day-of-week: Sun=0..Sat=6.
        let dow_match = self.day_of_week.contains(dt.weekday().num_days_from_sunday());

        match (self.restricts_dom, self.restricts_dow) {
            (true, true) => dom_match || dow_match,
            (true, false) => dom_match,
            (false, true) => dow_match,
            (false, false) => true,
        }
    }

    /// All fire instants in `(after, through]`, walking local time in `tz`
    /// minute by minute. Ambiguous local times during a DST fall-back fire
    /// once, at the earliest of the two possible UTC instants; local times
    /// skipped by a spring-forward gap never fire.
    pub fn fire_times_between(
        &self,
        tz: Tz,
        after: DateTime<Utc>,
        through: DateTime<Utc>,
    ) -> Vec<DateTime<Utc>> {
        let mut fires = Vec::new();
        if after >= through {
            return fires;
        }

        let mut cursor = after.with_timezone(&tz).naive_local();
        // Start from the next whole minute strictly after `after`.
        cursor += Duration::minutes(1);
        cursor = cursor
            .date()
            .and_hms_opt(cursor.hour(), cursor.minute(), 0)
            .unwrap_or(cursor);

        let mut steps = 0;
        loop {
            if steps > MAX_WALK_MINUTES {
                break;
            }
            steps += 1;

            let candidate_utc = match tz.from_local_datetime(&cursor) {
                LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
                LocalResult::Ambiguous(a, b) => {
                    let a_utc = a.with_timezone(&Utc);
                    let b_utc = b.with_timezone(&Utc);
                    Some(a_utc.min(b_utc))
                }
                LocalResult::None => None,
            };

            if let Some(utc) = candidate_utc {
                if utc > through {
                    break;
                }
                if utc > after && self.matches_naive(&cursor) {
                    fires.push(utc);
                }
            }
            // LocalResult::None (spring-forward gap): no instant exists for
            // this local minute, so it can never fire. Keep walking.

            cursor += Duration::minutes(1);
        }

        fires
    }

    /// The next single fire instant strictly after `after`, if the walk
    /// finds one within a year.
    pub fn next_fire_after(&self, tz: Tz, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.fire_times_between(tz, after, after + Duration::days(366))
            .into_iter()
            .next()
    }
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
