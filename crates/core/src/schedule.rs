// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-robot cron schedule.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::define_id;
use crate::robot::RobotId;

define_id! {
    /// Identifies a robot's schedule. One schedule per robot.
    pub struct ScheduleId;
}

/// `HH:MM` local-time wall clock value, used for schedule windows and SLA
/// daily-expectation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallClock {
    pub hour: u8,
    pub minute: u8,
}

impl WallClock {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }
}

impl std::fmt::Display for WallClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl std::str::FromStr for WallClock {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid HH:MM value: {s}"))?;
        let hour: u8 = h.parse().map_err(|_| format!("invalid hour in {s}"))?;
        let minute: u8 = m.parse().map_err(|_| format!("invalid minute in {s}"))?;
        WallClock::new(hour, minute).ok_or_else(|| format!("out of range HH:MM: {s}"))
    }
}

/// The cron-driven execution policy for a robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub robot_id: RobotId,
    pub enabled: bool,
    /// Standard 5-field cron expression (minute hour day-of-month month day-of-week).
    pub cron_expr: String,
    pub timezone: Tz,
    pub window_start: Option<WallClock>,
    pub window_end: Option<WallClock>,
    pub max_concurrency: u32,
    pub timeout_seconds: u64,
    pub retry_count: u32,
    pub retry_backoff_seconds: u64,
    pub created_at: DateTime<Utc>,
    /// Last instant the Scheduler successfully advanced this schedule.
    pub last_tick_at: DateTime<Utc>,
}

impl Schedule {
    /// Whether `local_time` falls inside the configured window. A schedule
    /// with no window is always open.
    pub fn in_window(&self, local: WallClock) -> bool {
        match (self.window_start, self.window_end) {
            (Some(start), Some(end)) => local >= start && local <= end,
            _ => true,
        }
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
