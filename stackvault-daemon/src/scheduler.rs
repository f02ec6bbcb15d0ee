//! Recurring triggers for the sync job.
//!
//! Zero, one or two triggers run side by side: a cron expression and a fixed
//! interval. Each fires independently and hands its job to the sync queue, so
//! overlapping fires run one after the other rather than concurrently.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use cron::Schedule;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use stackvault_core::ScheduleConfig;

use crate::error::DaemonError;
use crate::runtime::SyncQueue;

#[derive(Debug, Clone)]
pub enum Trigger {
    Cron { expr: String, schedule: Schedule },
    Interval(Duration),
}

impl Trigger {
    pub fn source(&self) -> &'static str {
        match self {
            Trigger::Cron { .. } => "cron",
            Trigger::Interval(_) => "interval",
        }
    }
}

/// Parse a crontab expression.
///
/// Classic five-field expressions (`min hour dom month dow`) get a leading
/// seconds field of `0`; six and seven field expressions are used as given.
pub fn parse_cron(expr: &str) -> Result<Schedule, DaemonError> {
    let fields = expr.split_whitespace().count();
    let normalized = match fields {
        5 => format!("0 {}", expr.trim()),
        6 | 7 => expr.trim().to_string(),
        n => {
            return Err(DaemonError::Schedule {
                expr: expr.to_string(),
                reason: format!("expected 5 fields, found {n}"),
            })
        }
    };
    Schedule::from_str(&normalized).map_err(|err| DaemonError::Schedule {
        expr: expr.to_string(),
        reason: err.to_string(),
    })
}

/// Triggers configured by `schedule`, cron first.
pub fn triggers_from_config(schedule: &ScheduleConfig) -> Result<Vec<Trigger>, DaemonError> {
    let mut triggers = Vec::new();
    if let Some(expr) = &schedule.cron {
        triggers.push(Trigger::Cron {
            expr: expr.clone(),
            schedule: parse_cron(expr)?,
        });
    }
    if let Some(secs) = schedule.interval_seconds {
        triggers.push(Trigger::Interval(Duration::from_secs(secs)));
    }
    Ok(triggers)
}

/// Time from `now` until the next fire of `schedule`, or `None` when the
/// schedule has no future fire time.
pub fn next_delay<Tz: TimeZone>(schedule: &Schedule, now: &DateTime<Tz>) -> Option<Duration> {
    let next = schedule.after(now).next()?;
    (next - now.clone()).to_std().ok()
}

/// Fire `trigger` until shutdown. Each fire waits for its cycle to finish.
pub async fn trigger_task(
    trigger: Trigger,
    queue: SyncQueue,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let source = trigger.source();
    match trigger {
        Trigger::Cron { expr, schedule } => {
            tracing::info!(cron = %expr, "cron trigger registered");
            loop {
                let Some(delay) = next_delay(&schedule, &Local::now()) else {
                    tracing::warn!(cron = %expr, "cron expression has no future fire time");
                    return Ok(());
                };
                tokio::select! {
                    _ = shutdown_rx.recv() => return Ok(()),
                    _ = tokio::time::sleep(delay) => fire(&queue, source).await,
                }
            }
        }
        Trigger::Interval(period) => {
            tracing::info!(seconds = period.as_secs(), "interval trigger registered");
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => return Ok(()),
                    _ = ticker.tick() => fire(&queue, source).await,
                }
            }
        }
    }
}

/// Failures are logged and the cycle abandoned until the next fire.
async fn fire(queue: &SyncQueue, source: &'static str) {
    match queue.request(source).await {
        Ok(summary) => tracing::info!(
            source,
            written = summary.written,
            unchanged = summary.unchanged,
            duration_ms = summary.duration_ms,
            "scheduled sync completed",
        ),
        Err(err) => tracing::error!(source, error = %err, "scheduled sync failed"),
    }
}
