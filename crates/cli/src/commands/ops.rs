// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operational snapshot.

use anyhow::Result;

use crate::client::HubClient;
use crate::output::{print_json, OutputFormat};

pub async fn status(client: &HubClient, format: OutputFormat) -> Result<()> {
    let status = client.ops_status().await?;
    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Text => {
            println!("workers:      {} running, {} paused, {} total", status.workers_running, status.workers_paused, status.total_workers);
            println!("queue depth:  {}", status.queue_depth);
            println!("runs running: {}", status.runs_running);
            println!("failed (1h):  {}", status.runs_failed_last_hour);
            println!("uptime:       {}s", status.uptime_seconds);
        }
    }
    Ok(())
}
