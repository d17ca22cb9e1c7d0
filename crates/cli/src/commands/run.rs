// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run command handlers: execute, list, inspect, logs, cancel.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::client::{ExecuteRunRequest, HubClient};
use crate::output::{print_json, OutputFormat};
use crate::table::{print_table, Column};

#[derive(Args)]
pub struct RunArgs {
    #[command(subcommand)]
    pub command: RunCommand,
}

#[derive(Subcommand)]
pub enum RunCommand {
    /// Execute a robot manually
    Execute {
        robot_id: Uuid,
        #[arg(long)]
        version_id: Option<Uuid>,
        #[arg(long, default_value = "PROD")]
        env: String,
        /// Repeatable `key=value` runtime argument
        #[arg(long = "arg")]
        args: Vec<String>,
        /// Repeatable `KEY=value` runtime environment override
        #[arg(long = "env-var")]
        env_vars: Vec<String>,
    },
    /// List runs, optionally filtered
    List {
        #[arg(long)]
        robot_id: Option<Uuid>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one run
    Get { run_id: Uuid },
    /// Show one run's logs
    Logs { run_id: Uuid },
    /// Request cooperative cancellation
    Cancel { run_id: Uuid },
}

pub async fn handle(command: RunCommand, client: &HubClient, format: OutputFormat) -> Result<()> {
    match command {
        RunCommand::Execute { robot_id, version_id, env, args, env_vars } => {
            let runtime_env = env_vars
                .into_iter()
                .filter_map(|kv| kv.split_once('=').map(|(k, v)| (k.to_string(), v.to_string())))
                .collect::<BTreeMap<_, _>>();
            let req = ExecuteRunRequest {
                version_id,
                env_name: env,
                runtime_arguments: args,
                runtime_env,
            };
            let run = client.execute_run(robot_id, &req).await?;
            match format {
                OutputFormat::Json => print_json(&run)?,
                OutputFormat::Text => println!("run {} queued ({})", run.id, run.status),
            }
        }
        RunCommand::List { robot_id, status } => {
            let runs = client.list_runs(robot_id, status.as_deref()).await?;
            match format {
                OutputFormat::Json => print_json(&runs)?,
                OutputFormat::Text => {
                    let columns = [Column::new("ID"), Column::new("ROBOT"), Column::new("STATUS"), Column::new("QUEUED")];
                    let rows = runs
                        .iter()
                        .map(|r| vec![r.id.short(8), r.robot_id.short(8), r.status.to_string(), r.queued_at.to_rfc3339()])
                        .collect::<Vec<_>>();
                    print_table(&columns, &rows);
                }
            }
        }
        RunCommand::Get { run_id } => {
            let run = client.get_run(run_id).await?;
            print_json(&run)?;
        }
        RunCommand::Logs { run_id } => {
            let logs = client.get_logs(run_id).await?;
            match format {
                OutputFormat::Json => print_json(&logs)?,
                OutputFormat::Text => {
                    for log in logs {
                        println!("[{}] {} {}", log.timestamp.to_rfc3339(), log.level, log.message);
                    }
                }
            }
        }
        RunCommand::Cancel { run_id } => {
            let run = client.cancel_run(run_id).await?;
            println!("run {} cancel requested (status: {})", run.id, run.status);
        }
    }
    Ok(())
}
