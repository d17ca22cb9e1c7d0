// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hubd` — the run lifecycle engine's HTTP edge and background loops in
//! one process. Owns the WAL-backed store, the `RunEngine`, one local
//! `WorkerLoop`, and the scheduler/SLA-monitor/cleanup/watchdog sweeps; all
//! of them share a single shutdown signal so SIGINT/SIGTERM drain in-flight
//! runs before the process exits.

use std::sync::Arc;

use chrono::Utc;
use hub_adapters::{AesGcmCipher, LocalArtifactStore, TokioProcessRunner};
use hub_clock::SystemClock;
use hub_core::{UuidIdGen, WorkerId};
use hub_daemon::{http, AppState, DaemonConfig};
use hub_engine::{Cleanup, EngineConfig, LogBus, RunEngine, Scheduler, SlaMonitor, Watchdog, WorkerLoop};
use hub_storage::Store;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = DaemonConfig::load()?;

    let log_guard = hub_daemon::logging::setup_logging(&config.data_dir.join("logs"))?;
    info!(bind_address = %config.bind_address, data_dir = %config.data_dir.display(), "starting hubd");

    let store = Arc::new(Store::open(&config.data_dir)?);
    let engine = Arc::new(RunEngine::new(
        store,
        SystemClock,
        UuidIdGen::new(),
        EngineConfig::from_env(),
        Arc::new(LogBus::new()),
    ));

    let artifacts = Arc::new(LocalArtifactStore::new(config.data_dir.join("artifacts")));
    let cipher = Arc::new(AesGcmCipher::new(&config.encryption_key));
    let processes = Arc::new(TokioProcessRunner::new());

    let worker = Arc::new(WorkerLoop::new(
        engine.clone(),
        WorkerId::new(),
        hostname(),
        processes,
        artifacts.clone(),
        cipher.clone(),
        config.data_dir.join("scratch"),
    ));
    worker.register(env!("CARGO_PKG_VERSION").to_string())?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = Scheduler::new(engine.clone());
    let sla_monitor = SlaMonitor::new(engine.clone());
    let cleanup = Cleanup::new(engine.clone());
    let watchdog = Watchdog::new(engine.clone());

    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx.clone()));
    let sla_task = tokio::spawn(sla_monitor.run(shutdown_rx.clone()));
    let cleanup_task = tokio::spawn(cleanup.run(shutdown_rx.clone()));
    let watchdog_task = tokio::spawn(watchdog.run(shutdown_rx.clone()));
    let worker_task = tokio::spawn(worker.clone().run(shutdown_rx.clone()));

    let state = AppState {
        engine: engine.clone(),
        artifacts,
        cipher,
        deploy_token: config.deploy_token.clone(),
        started_at: Utc::now(),
    };
    let router = http::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;

    info!("HTTP edge stopped, draining background loops");
    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(scheduler_task, sla_task, cleanup_task, watchdog_task, worker_task);

    info!("hubd stopped");
    drop(log_guard);
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(err) => {
            error!(error = %err, "failed to install SIGTERM handler");
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(err) => {
            error!(error = %err, "failed to install SIGINT handler");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
    }
}

fn hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}
