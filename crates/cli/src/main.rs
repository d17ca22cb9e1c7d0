// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hub` — admin CLI for the run lifecycle engine's HTTP API.

mod client;
mod commands;
mod output;
mod table;

use anyhow::Result;
use clap::{Parser, Subcommand};

use client::HubClient;
use commands::{alert, ops, robot, run, worker};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "hub", version, about = "Admin CLI for the run lifecycle engine")]
struct Cli {
    /// Base URL of the hub API
    #[arg(long, env = "HUB_API_URL", default_value = "http://127.0.0.1:8080", global = true)]
    api_url: String,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run execution, inspection, logs, cancellation
    Run(run::RunArgs),
    /// Robot version publishing, schedules and SLA rules
    Robot(robot::RobotArgs),
    /// Worker inventory and pause/resume
    Worker(worker::WorkerArgs),
    /// SLA alert listing and resolution
    Alert(alert::AlertArgs),
    /// Operational snapshot of the hub
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = HubClient::new(cli.api_url);

    match cli.command {
        Commands::Run(args) => run::handle(args.command, &client, cli.output).await,
        Commands::Robot(args) => robot::handle(args.command, &client).await,
        Commands::Worker(args) => worker::handle(args.command, &client, cli.output).await,
        Commands::Alert(args) => alert::handle(args.command, &client, cli.output).await,
        Commands::Status => ops::status(&client, cli.output).await,
    }
}
