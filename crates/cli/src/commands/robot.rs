// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Robot registry command handlers: version publish/activate, schedule and
//! SLA rule CRUD.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::client::{HubClient, PublishArgs, ScheduleRequest, SlaRuleRequest};
use crate::output::print_json;

#[derive(Args)]
pub struct RobotArgs {
    #[command(subcommand)]
    pub command: RobotCommand,
}

#[derive(Subcommand)]
pub enum RobotCommand {
    /// Publish a new robot version
    Publish {
        robot_id: Uuid,
        #[arg(long)]
        version: String,
        #[arg(long, default_value = "stable")]
        channel: String,
        #[arg(long, default_value = "")]
        changelog: String,
        #[arg(long)]
        entrypoint_path: String,
        #[arg(long, default_value = "script")]
        entrypoint_type: String,
        #[arg(long)]
        activate: bool,
        /// Path to the artifact file (zip or native executable) to upload
        artifact: PathBuf,
    },
    /// Activate an already-published version
    Activate { robot_id: Uuid, version_id: Uuid },
    /// Show the robot's schedule
    ScheduleGet { robot_id: Uuid },
    /// Create or replace the robot's schedule
    ScheduleSet {
        robot_id: Uuid,
        #[arg(long)]
        cron: String,
        #[arg(long, default_value = "UTC")]
        timezone: String,
        #[arg(long)]
        disabled: bool,
        #[arg(long)]
        window_start: Option<String>,
        #[arg(long)]
        window_end: Option<String>,
        #[arg(long, default_value_t = 1)]
        max_concurrency: u32,
        #[arg(long, default_value_t = 3600)]
        timeout_seconds: u64,
        #[arg(long, default_value_t = 0)]
        retry_count: u32,
        #[arg(long, default_value_t = 0)]
        retry_backoff_seconds: u64,
    },
    /// Show the robot's SLA rule
    SlaGet { robot_id: Uuid },
    /// Create or replace the robot's SLA rule
    SlaSet {
        robot_id: Uuid,
        #[arg(long)]
        expected_every_minutes: Option<u32>,
        #[arg(long)]
        expected_daily_time: Option<String>,
        #[arg(long)]
        late_after_minutes: u32,
        #[arg(long)]
        alert_on_failure: bool,
        #[arg(long)]
        alert_on_late: bool,
    },
}

pub async fn handle(command: RobotCommand, client: &HubClient) -> Result<()> {
    match command {
        RobotCommand::Publish {
            robot_id,
            version,
            channel,
            changelog,
            entrypoint_path,
            entrypoint_type,
            activate,
            artifact,
        } => {
            client
                .publish_version(
                    robot_id,
                    PublishArgs { version, channel, changelog, entrypoint_path, entrypoint_type, activate },
                    &artifact,
                )
                .await?;
            println!("published version of robot {robot_id}");
        }
        RobotCommand::Activate { robot_id, version_id } => {
            client.activate_version(robot_id, version_id).await?;
            println!("activated version {version_id} for robot {robot_id}");
        }
        RobotCommand::ScheduleGet { robot_id } => {
            let schedule = client.get_schedule(robot_id).await?;
            print_json(&schedule)?;
        }
        RobotCommand::ScheduleSet {
            robot_id,
            cron,
            timezone,
            disabled,
            window_start,
            window_end,
            max_concurrency,
            timeout_seconds,
            retry_count,
            retry_backoff_seconds,
        } => {
            let req = ScheduleRequest {
                enabled: !disabled,
                cron_expr: cron,
                timezone,
                window_start,
                window_end,
                max_concurrency,
                timeout_seconds,
                retry_count,
                retry_backoff_seconds,
            };
            let schedule = client.upsert_schedule(robot_id, &req).await?;
            print_json(&schedule)?;
        }
        RobotCommand::SlaGet { robot_id } => {
            let rule = client.get_sla(robot_id).await?;
            print_json(&rule)?;
        }
        RobotCommand::SlaSet { robot_id, expected_every_minutes, expected_daily_time, late_after_minutes, alert_on_failure, alert_on_late } => {
            let req = SlaRuleRequest {
                expected_every_minutes,
                expected_daily_time,
                late_after_minutes,
                alert_on_failure,
                alert_on_late,
                notify_channels: BTreeMap::new(),
            };
            let rule = client.upsert_sla(robot_id, &req).await?;
            print_json(&rule)?;
        }
    }
    Ok(())
}
