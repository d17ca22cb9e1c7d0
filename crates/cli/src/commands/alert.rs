// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SLA alert listing and manual resolution.

use anyhow::Result;
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::client::HubClient;
use crate::output::{print_json, OutputFormat};
use crate::table::{print_table, Column};

#[derive(Args)]
pub struct AlertArgs {
    #[command(subcommand)]
    pub command: AlertCommand,
}

#[derive(Subcommand)]
pub enum AlertCommand {
    /// List alerts
    List {
        /// "open" (default) or "resolved"
        #[arg(long)]
        status: Option<String>,
    },
    /// Mark an alert resolved
    Resolve { alert_id: Uuid },
}

pub async fn handle(command: AlertCommand, client: &HubClient, format: OutputFormat) -> Result<()> {
    match command {
        AlertCommand::List { status } => {
            let alerts = client.list_alerts(status.as_deref()).await?;
            match format {
                OutputFormat::Json => print_json(&alerts)?,
                OutputFormat::Text => {
                    let columns = [Column::new("ID"), Column::new("ROBOT"), Column::new("TYPE"), Column::new("SEVERITY"), Column::new("CREATED")];
                    let rows = alerts
                        .iter()
                        .map(|a| {
                            vec![
                                a.id.short(8),
                                a.robot_id.short(8),
                                format!("{:?}", a.alert_type),
                                format!("{:?}", a.severity),
                                a.created_at.to_rfc3339(),
                            ]
                        })
                        .collect::<Vec<_>>();
                    print_table(&columns, &rows);
                }
            }
        }
        AlertCommand::Resolve { alert_id } => {
            let alert = client.resolve_alert(alert_id).await?;
            println!("alert {} resolved", alert.id);
        }
    }
    Ok(())
}
