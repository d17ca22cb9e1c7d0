// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker inventory and pause/resume control.

use anyhow::Result;
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::client::HubClient;
use crate::output::{print_json, OutputFormat};
use crate::table::{print_table, Column};

#[derive(Args)]
pub struct WorkerArgs {
    #[command(subcommand)]
    pub command: WorkerCommand,
}

#[derive(Subcommand)]
pub enum WorkerCommand {
    /// List known workers
    List,
    /// Stop dispatching new runs to a worker
    Pause { worker_id: Uuid },
    /// Resume dispatching runs to a worker
    Resume { worker_id: Uuid },
}

pub async fn handle(command: WorkerCommand, client: &HubClient, format: OutputFormat) -> Result<()> {
    match command {
        WorkerCommand::List => {
            let workers = client.list_workers().await?;
            match format {
                OutputFormat::Json => print_json(&workers)?,
                OutputFormat::Text => {
                    let columns = [Column::new("ID"), Column::new("HOSTNAME"), Column::new("STATUS"), Column::new("LAST HEARTBEAT")];
                    let rows = workers
                        .iter()
                        .map(|w| vec![w.id.short(8), w.hostname.clone(), format!("{:?}", w.status), w.last_heartbeat.to_rfc3339()])
                        .collect::<Vec<_>>();
                    print_table(&columns, &rows);
                }
            }
        }
        WorkerCommand::Pause { worker_id } => {
            client.pause_worker(worker_id).await?;
            println!("worker {worker_id} paused");
        }
        WorkerCommand::Resume { worker_id } => {
            client.resume_worker(worker_id).await?;
            println!("worker {worker_id} resumed");
        }
    }
    Ok(())
}
