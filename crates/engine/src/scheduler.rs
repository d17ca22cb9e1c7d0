// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic cron tick: for every enabled `Schedule`, fires every cron
//! instant in `(last_tick_at, now]` into exactly one `SCHEDULED` run,
//! skipping fires outside the schedule's window or past its
//! `max_concurrency`. Idempotent under crash-recovery: `(robot_id,
//! fire_time)` uniqueness is enforced by `MaterializedState::fired_schedules`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use hub_clock::Clock;
use hub_core::{Event, HubResult, IdGen, RuntimePayload, Schedule, TriggerType, WallClock};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::store_fault;
use crate::run_engine::{CreateRunParams, RunEngine};

pub struct Scheduler<C: Clock, G: IdGen> {
    engine: Arc<RunEngine<C, G>>,
}

impl<C: Clock, G: IdGen> Scheduler<C, G> {
    pub fn new(engine: Arc<RunEngine<C, G>>) -> Self {
        Self { engine }
    }

    /// Run the periodic loop until `shutdown` reports `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(
            self.engine.config().scheduler_interval_seconds,
        ));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.tick() {
                        warn!(error = %err, "scheduler tick failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// One sweep over every enabled schedule. Returns the number of
    /// `SCHEDULED` runs created, for tests to assert against.
    pub fn tick(&self) -> HubResult<usize> {
        let now = self.engine.clock().now();
        let schedules = self
            .engine
            .store()
            .with_state(|state| state.schedules.values().cloned().collect::<Vec<_>>());

        let mut created = 0;
        for schedule in schedules {
            if !schedule.enabled {
                continue;
            }
            created += self.tick_schedule(&schedule, now)?;
        }
        Ok(created)
    }

    fn tick_schedule(&self, schedule: &Schedule, now: DateTime<Utc>) -> HubResult<usize> {
        let cron = match hub_clock::cron::CronSchedule::parse(&schedule.cron_expr) {
            Ok(cron) => cron,
            Err(err) => {
                warn!(robot_id = %schedule.robot_id, error = %err, "invalid cron expression, skipping schedule");
                return Ok(0);
            }
        };

        let fires = cron.fire_times_between(schedule.timezone, schedule.last_tick_at, now);
        let mut created = 0;
        for fire_time in fires {
            if !window_allows(schedule, fire_time) {
                continue;
            }
            let already_fired = self.engine.store().with_state(|state| {
                state.fired_schedules.contains(&(schedule.robot_id, fire_time))
            });
            if already_fired {
                continue;
            }
            if self.saturated(schedule) {
                info!(robot_id = %schedule.robot_id, %fire_time, "schedule fire skipped: max_concurrency saturated");
                continue;
            }

            let run_id = self.engine.create_run(CreateRunParams {
                robot_id: schedule.robot_id,
                version_id: None,
                env_name: hub_core::EnvName::Prod,
                runtime_payload: RuntimePayload::default(),
                trigger_type: TriggerType::Scheduled,
                triggered_by: None,
                attempt: 1,
                schedule_id: Some(schedule.id),
                service_id: None,
                not_before: Some(fire_time),
            })?;

            self.engine
                .store()
                .append(Event::ScheduleFired {
                    robot_id: schedule.robot_id,
                    fire_time,
                    run_id,
                })
                .map_err(store_fault)?;
            created += 1;
        }

        self.engine
            .store()
            .append(Event::ScheduleTicked {
                robot_id: schedule.robot_id,
                last_tick_at: now,
            })
            .map_err(store_fault)?;

        Ok(created)
    }

    fn saturated(&self, schedule: &Schedule) -> bool {
        self.engine.store().with_state(|state| {
            let active = state
                .runs_for_robot(schedule.robot_id)
                .into_iter()
                .filter(|r| r.schedule_id == Some(schedule.id) && !r.status.is_terminal())
                .count() as u32;
            active >= schedule.max_concurrency
        })
    }
}

fn window_allows(schedule: &Schedule, fire_time: DateTime<Utc>) -> bool {
    if schedule.window_start.is_none() && schedule.window_end.is_none() {
        return true;
    }
    let local = fire_time.with_timezone(&schedule.timezone);
    match WallClock::new(local.hour() as u8, local.minute() as u8) {
        Some(wall) => schedule.in_window(wall),
        None => true,
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
