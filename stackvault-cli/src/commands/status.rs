//! `stackvault status`: query a running service's `/api/status`.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Deserialize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Base URL of the running service.
    #[arg(long, env = "STACKVAULT_URL", default_value = "http://127.0.0.1:5000")]
    pub url: String,

    /// Print the raw JSON payload.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Deserialize)]
struct ScheduleView {
    cron: Option<String>,
    interval_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SuccessView {
    source: String,
    updated: Vec<String>,
    removed: Vec<String>,
    commit_message: Option<String>,
    finished_at: DateTime<Utc>,
    duration_ms: u64,
}

#[derive(Debug, Deserialize)]
struct FailureView {
    source: String,
    error: String,
    failed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct StatusView {
    started_at: DateTime<Utc>,
    schedule: ScheduleView,
    cycles_succeeded: u64,
    cycles_failed: u64,
    last_success: Option<SuccessView>,
    last_failure: Option<FailureView>,
}

#[derive(Tabled)]
struct CycleRow {
    #[tabled(rename = "cycle")]
    kind: String,
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "at")]
    at: String,
    #[tabled(rename = "detail")]
    detail: String,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let url = format!("{}/api/status", self.url.trim_end_matches('/'));
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .build();
        let payload: serde_json::Value = agent
            .get(&url)
            .call()
            .with_context(|| format!("failed to reach {url}"))?
            .into_json()
            .with_context(|| format!("unexpected response from {url}"))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        let status: StatusView =
            serde_json::from_value(payload).with_context(|| format!("unexpected response from {url}"))?;
        print_status(&self.url, status);
        Ok(())
    }
}

fn schedule_label(schedule: &ScheduleView) -> String {
    let mut parts = Vec::new();
    if let Some(cron) = &schedule.cron {
        parts.push(format!("cron '{cron}'"));
    }
    if let Some(secs) = schedule.interval_seconds {
        parts.push(format!("every {secs}s"));
    }
    if parts.is_empty() {
        "manual only".to_string()
    } else {
        parts.join(" + ")
    }
}

fn print_status(base: &str, status: StatusView) {
    println!(
        "Stackvault v{} | {} | up since {} | {} ok, {} failed",
        env!("CARGO_PKG_VERSION"),
        base,
        status.started_at.to_rfc3339(),
        status.cycles_succeeded.to_string().green().bold(),
        status.cycles_failed.to_string().red().bold(),
    );
    println!("Schedule: {}", schedule_label(&status.schedule));

    let mut rows = Vec::new();
    if let Some(s) = status.last_success {
        let mut detail = s
            .commit_message
            .unwrap_or_else(|| "nothing to commit".to_string());
        if !s.removed.is_empty() {
            detail.push_str(&format!(" (removed: {})", s.removed.join(", ")));
        }
        rows.push(CycleRow {
            kind: "last success".to_string(),
            source: s.source,
            at: s.finished_at.to_rfc3339(),
            detail: format!("{detail} [{} names, {} ms]", s.updated.len(), s.duration_ms),
        });
    }
    if let Some(f) = status.last_failure {
        rows.push(CycleRow {
            kind: "last failure".to_string(),
            source: f.source,
            at: f.failed_at.to_rfc3339(),
            detail: f.error,
        });
    }

    if rows.is_empty() {
        println!("No sync cycle has run yet.");
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
