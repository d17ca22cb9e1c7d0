// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process execution adapter for running a robot version as a worker-local
//! subprocess, with streamed stdout/stderr and cooperative termination.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

/// Grace period between SIGTERM and SIGKILL when a run is canceled or
/// exceeds its timeout.
pub const TERMINATE_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn process: {0}")]
    Spawn(String),
    #[error("failed to signal process: {0}")]
    Signal(String),
    #[error("failed to wait on process: {0}")]
    Wait(String),
}

/// What to execute and with what environment.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub program: String,
    pub arguments: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: HashMap<String, String>,
}

/// A single line of output from a running process, tagged by stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutput {
    Stdout(String),
    Stderr(String),
}

/// Adapter for spawning and managing subprocesses. Implemented by
/// [`TokioProcessRunner`] in production.
#[async_trait]
pub trait ProcessRunner: Send + Sync + 'static {
    async fn spawn(&self, spec: ProcessSpec) -> Result<Box<dyn RunningProcess>, ProcessError>;
}

/// Handle to a spawned process: streamed output and lifecycle control.
#[async_trait]
pub trait RunningProcess: Send {
    fn pid(&self) -> u32;

    /// Next line of stdout or stderr, in the order it was produced. Returns
    /// `None` once both streams are closed.
    async fn next_output(&mut self) -> Option<ProcessOutput>;

    /// Wait for the process to exit, returning its exit code.
    async fn wait(&mut self) -> Result<i32, ProcessError>;

    /// Send SIGTERM.
    fn terminate(&self) -> Result<(), ProcessError>;

    /// Send SIGKILL.
    fn kill(&self) -> Result<(), ProcessError>;

    /// Cooperative shutdown: SIGTERM, then SIGKILL if the process hasn't
    /// exited within `grace`.
    async fn terminate_with_grace(&mut self, grace: Duration) -> Result<i32, ProcessError> {
        self.terminate()?;
        match tokio::time::timeout(grace, self.wait()).await {
            Ok(result) => result,
            Err(_) => {
                self.kill()?;
                self.wait().await
            }
        }
    }
}

/// Production [`ProcessRunner`] backed by `tokio::process`.
#[derive(Clone, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn spawn(&self, spec: ProcessSpec) -> Result<Box<dyn RunningProcess>, ProcessError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.arguments)
            .envs(&spec.env)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());
        if let Some(dir) = &spec.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| ProcessError::Spawn(e.to_string()))?;
        let pid = child.id().ok_or_else(|| {
            ProcessError::Spawn("process exited before pid could be read".to_string())
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProcessError::Spawn("stdout pipe missing".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProcessError::Spawn("stderr pipe missing".into()))?;

        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(pump_lines(stdout, tx.clone(), ProcessOutput::Stdout as fn(String) -> ProcessOutput));
        tokio::spawn(pump_lines(stderr, tx, ProcessOutput::Stderr as fn(String) -> ProcessOutput));

        Ok(Box::new(TokioRunningProcess {
            pid,
            child,
            output_rx: rx,
        }))
    }
}

async fn pump_lines<R: tokio::io::AsyncRead + Unpin>(
    reader: R,
    tx: mpsc::Sender<ProcessOutput>,
    wrap: fn(String) -> ProcessOutput,
) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(wrap(line)).await.is_err() {
            return;
        }
    }
}

struct TokioRunningProcess {
    pid: u32,
    child: Child,
    output_rx: mpsc::Receiver<ProcessOutput>,
}

#[async_trait]
impl RunningProcess for TokioRunningProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    async fn next_output(&mut self) -> Option<ProcessOutput> {
        self.output_rx.recv().await
    }

    async fn wait(&mut self) -> Result<i32, ProcessError> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| ProcessError::Wait(e.to_string()))?;
        Ok(status.code().unwrap_or(-1))
    }

    fn terminate(&self) -> Result<(), ProcessError> {
        signal::kill(Pid::from_raw(self.pid as i32), Signal::SIGTERM)
            .map_err(|e| ProcessError::Signal(e.to_string()))
    }

    fn kill(&self) -> Result<(), ProcessError> {
        signal::kill(Pid::from_raw(self.pid as i32), Signal::SIGKILL)
            .map_err(|e| ProcessError::Signal(e.to_string()))
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
