// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin `reqwest` wrapper over the hub's HTTP API. One method per route;
//! callers in `commands/` own presentation, this owns the wire shape.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Result};
use hub_core::{AlertEvent, Run, RunLog, Schedule, SlaRule, Worker};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub struct HubClient {
    http: reqwest::Client,
    base_url: String,
}

impl HubClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url.trim_end_matches('/'))
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("request failed: {status}: {body}");
    }

    pub async fn execute_run(&self, robot_id: Uuid, req: &ExecuteRunRequest) -> Result<Run> {
        let resp = self.http.post(self.url(&format!("/runs/{robot_id}/execute"))).json(req).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn list_runs(&self, robot_id: Option<Uuid>, status: Option<&str>) -> Result<Vec<Run>> {
        let mut query = Vec::new();
        if let Some(id) = robot_id {
            query.push(("robot_id".to_string(), id.to_string()));
        }
        if let Some(status) = status {
            query.push(("status".to_string(), status.to_string()));
        }
        let resp = self.http.get(self.url("/runs")).query(&query).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn get_run(&self, run_id: Uuid) -> Result<Run> {
        let resp = self.http.get(self.url(&format!("/runs/{run_id}"))).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn get_logs(&self, run_id: Uuid) -> Result<Vec<RunLog>> {
        let resp = self.http.get(self.url(&format!("/runs/{run_id}/logs"))).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn cancel_run(&self, run_id: Uuid) -> Result<Run> {
        let resp = self.http.post(self.url(&format!("/runs/{run_id}/cancel"))).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn publish_version(&self, robot_id: Uuid, fields: PublishArgs, artifact_path: &Path) -> Result<()> {
        let bytes = tokio::fs::read(artifact_path).await?;
        let file_name = artifact_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "artifact".to_string());

        let mut form = reqwest::multipart::Form::new()
            .text("version", fields.version)
            .text("channel", fields.channel)
            .text("changelog", fields.changelog)
            .text("entrypoint_path", fields.entrypoint_path)
            .text("entrypoint_type", fields.entrypoint_type)
            .part("artifact", reqwest::multipart::Part::bytes(bytes).file_name(file_name));
        if fields.activate {
            form = form.text("activate", "true");
        }

        let resp = self
            .http
            .post(self.url(&format!("/robots/{robot_id}/versions/publish")))
            .multipart(form)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn activate_version(&self, robot_id: Uuid, version_id: Uuid) -> Result<()> {
        let resp = self
            .http
            .post(self.url(&format!("/robots/{robot_id}/versions/{version_id}/activate")))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn get_schedule(&self, robot_id: Uuid) -> Result<Schedule> {
        let resp = self.http.get(self.url(&format!("/robots/{robot_id}/schedule"))).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn upsert_schedule(&self, robot_id: Uuid, req: &ScheduleRequest) -> Result<Schedule> {
        let resp = self.http.post(self.url(&format!("/robots/{robot_id}/schedule"))).json(req).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn delete_schedule(&self, robot_id: Uuid) -> Result<()> {
        let resp = self.http.delete(self.url(&format!("/robots/{robot_id}/schedule"))).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn get_sla(&self, robot_id: Uuid) -> Result<SlaRule> {
        let resp = self.http.get(self.url(&format!("/robots/{robot_id}/sla"))).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn upsert_sla(&self, robot_id: Uuid, req: &SlaRuleRequest) -> Result<SlaRule> {
        let resp = self.http.post(self.url(&format!("/robots/{robot_id}/sla"))).json(req).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn list_workers(&self) -> Result<Vec<Worker>> {
        let resp = self.http.get(self.url("/workers")).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn pause_worker(&self, worker_id: Uuid) -> Result<()> {
        let resp = self.http.post(self.url(&format!("/workers/{worker_id}/pause"))).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn resume_worker(&self, worker_id: Uuid) -> Result<()> {
        let resp = self.http.post(self.url(&format!("/workers/{worker_id}/resume"))).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn ops_status(&self) -> Result<OpsStatus> {
        let resp = self.http.get(self.url("/ops/status")).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn list_alerts(&self, status: Option<&str>) -> Result<Vec<AlertEvent>> {
        let mut query = Vec::new();
        if let Some(status) = status {
            query.push(("status".to_string(), status.to_string()));
        }
        let resp = self.http.get(self.url("/alerts")).query(&query).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn resolve_alert(&self, alert_id: Uuid) -> Result<AlertEvent> {
        let resp = self.http.post(self.url(&format!("/alerts/{alert_id}/resolve"))).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }
}

#[derive(Debug, Serialize)]
pub struct ExecuteRunRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<Uuid>,
    pub env_name: String,
    #[serde(default)]
    pub runtime_arguments: Vec<String>,
    #[serde(default)]
    pub runtime_env: BTreeMap<String, String>,
}

pub struct PublishArgs {
    pub version: String,
    pub channel: String,
    pub changelog: String,
    pub entrypoint_path: String,
    pub entrypoint_type: String,
    pub activate: bool,
}

#[derive(Debug, Serialize)]
pub struct ScheduleRequest {
    pub enabled: bool,
    pub cron_expr: String,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_end: Option<String>,
    pub max_concurrency: u32,
    pub timeout_seconds: u64,
    pub retry_count: u32,
    pub retry_backoff_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct SlaRuleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_every_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_daily_time: Option<String>,
    pub late_after_minutes: u32,
    pub alert_on_failure: bool,
    pub alert_on_late: bool,
    #[serde(default)]
    pub notify_channels: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct OpsStatus {
    pub total_workers: usize,
    pub workers_running: usize,
    pub workers_paused: usize,
    pub queue_depth: usize,
    pub runs_running: usize,
    pub runs_failed_last_hour: usize,
    pub uptime_seconds: u64,
}
