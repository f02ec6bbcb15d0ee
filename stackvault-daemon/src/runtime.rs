use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use stackvault_client::{Orchestrator, PortainerClient};
use stackvault_core::{BackupConfig, ScheduleConfig};
use stackvault_renderer::Renderer;
use stackvault_sync::{pipeline, synchronizer::acquire_repository, SyncError, SyncOutcome};

use crate::error::{io_err, DaemonError};
use crate::scheduler::{trigger_task, triggers_from_config};
use crate::web::{self, AppState};

/// One full sync cycle, run on a blocking thread by the queue processor.
pub trait SyncRunner: Send + Sync + 'static {
    fn run_cycle(&self) -> Result<SyncOutcome, SyncError>;
}

/// Production runner: platform query plus repository reconciliation.
pub struct PipelineRunner {
    config: Arc<BackupConfig>,
    api: Arc<dyn Orchestrator>,
    renderer: Arc<Renderer>,
}

impl PipelineRunner {
    pub fn new(config: Arc<BackupConfig>, api: Arc<dyn Orchestrator>, renderer: Arc<Renderer>) -> Self {
        Self {
            config,
            api,
            renderer,
        }
    }
}

impl SyncRunner for PipelineRunner {
    fn run_cycle(&self) -> Result<SyncOutcome, SyncError> {
        pipeline::run(&self.config, self.api.as_ref(), &self.renderer)
    }
}

struct SyncJob {
    source: &'static str,
    respond_to: oneshot::Sender<Result<SyncSummary, String>>,
}

/// Handle for submitting sync jobs. Jobs run one at a time, in arrival order.
#[derive(Clone)]
pub struct SyncQueue {
    tx: mpsc::Sender<SyncJob>,
}

impl SyncQueue {
    /// Enqueue a cycle and wait for its result.
    pub async fn request(&self, source: &'static str) -> Result<SyncSummary, DaemonError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(SyncJob {
                source,
                respond_to: tx,
            })
            .await
            .map_err(|_| DaemonError::ChannelClosed("sync queue"))?;

        let outcome = rx
            .await
            .map_err(|_| DaemonError::ChannelClosed("sync response"))?;
        outcome.map_err(DaemonError::CycleFailed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub source: String,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    pub skipped: Vec<String>,
    pub written: usize,
    pub unchanged: usize,
    pub commit_message: Option<String>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    pub source: String,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

/// Snapshot served on `/api/status` and summarized on the status page.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeStatus {
    pub started_at: DateTime<Utc>,
    pub schedule: ScheduleConfig,
    pub cycles_succeeded: u64,
    pub cycles_failed: u64,
    pub last_success: Option<SyncSummary>,
    pub last_failure: Option<SyncFailure>,
}

pub type SharedStatus = Arc<RwLock<RuntimeStatus>>;

impl RuntimeStatus {
    pub fn new(schedule: ScheduleConfig) -> Self {
        Self {
            started_at: Utc::now(),
            schedule,
            cycles_succeeded: 0,
            cycles_failed: 0,
            last_success: None,
            last_failure: None,
        }
    }

    pub fn shared(schedule: ScheduleConfig) -> SharedStatus {
        Arc::new(RwLock::new(Self::new(schedule)))
    }

    fn record_success(&mut self, summary: SyncSummary) {
        self.cycles_succeeded += 1;
        self.last_success = Some(summary);
    }

    fn record_failure(&mut self, source: &str, error: String) {
        self.cycles_failed += 1;
        self.last_failure = Some(SyncFailure {
            source: source.to_string(),
            error,
            failed_at: Utc::now(),
        });
    }

    /// One line describing the most recent cycle, success or failure.
    pub fn last_sync_line(&self) -> Option<String> {
        const FMT: &str = "%Y-%m-%d %H:%M:%S UTC";
        let success = self.last_success.as_ref().map(|s| {
            let result = s.commit_message.as_deref().unwrap_or("nothing to commit");
            (
                s.finished_at,
                format!(
                    "Last backup {} ({}): {result}",
                    s.finished_at.format(FMT),
                    s.source
                ),
            )
        });
        let failure = self.last_failure.as_ref().map(|f| {
            (
                f.failed_at,
                format!(
                    "Last backup attempt {} ({}) failed: {}",
                    f.failed_at.format(FMT),
                    f.source,
                    f.error
                ),
            )
        });
        match (success, failure) {
            (Some(s), Some(f)) => Some(if f.0 > s.0 { f.1 } else { s.1 }),
            (s, f) => s.or(f).map(|(_, line)| line),
        }
    }
}

/// Spawn the single sync worker. The returned task broadcasts shutdown when
/// it exits.
pub fn spawn_sync_processor(
    runner: Arc<dyn SyncRunner>,
    status: SharedStatus,
    shutdown: broadcast::Sender<()>,
) -> (SyncQueue, JoinHandle<Result<(), DaemonError>>) {
    let (sync_tx, sync_rx) = mpsc::channel::<SyncJob>(64);
    let shutdown_rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        let result = sync_processor_task(runner, status, sync_rx, shutdown_rx).await;
        let _ = shutdown.send(());
        result
    });
    (SyncQueue { tx: sync_tx }, handle)
}

async fn sync_processor_task(
    runner: Arc<dyn SyncRunner>,
    status: SharedStatus,
    mut sync_rx: mpsc::Receiver<SyncJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_job = sync_rx.recv() => {
                let Some(job) = maybe_job else { break };
                let started = Instant::now();
                tracing::info!(source = job.source, "sync cycle started");

                let cycle_runner = runner.clone();
                // A panicking cycle counts as a failed cycle; the worker keeps going.
                let sync_result = match tokio::task::spawn_blocking(move || cycle_runner.run_cycle()).await {
                    Ok(result) => result.map_err(|err| err.to_string()),
                    Err(err) => Err(format!("sync task join error: {err}")),
                };

                let outcome = match sync_result {
                    Ok(outcome) => {
                        let summary = build_sync_summary(job.source, outcome, started.elapsed());
                        status.write().await.record_success(summary.clone());
                        Ok(summary)
                    }
                    Err(message) => {
                        tracing::error!(source = job.source, error = %message, "sync cycle failed");
                        status.write().await.record_failure(job.source, message.clone());
                        Err(message)
                    }
                };

                let _ = job.respond_to.send(outcome);
            }
        }
    }

    Ok(())
}

fn build_sync_summary(source: &'static str, outcome: SyncOutcome, duration: Duration) -> SyncSummary {
    SyncSummary {
        source: source.to_string(),
        written: outcome.written(),
        unchanged: outcome.unchanged(),
        updated: outcome.changes.updated.into_iter().collect(),
        removed: outcome.changes.removed,
        skipped: outcome.skipped,
        commit_message: outcome.commit_message,
        finished_at: Utc::now(),
        duration_ms: duration.as_millis(),
    }
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(config: BackupConfig) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config))
}

/// Run the daemon: prepare the clone, then serve the web surface and the
/// configured triggers until ctrl-c.
pub async fn run(config: BackupConfig) -> Result<(), DaemonError> {
    config.validate()?;
    let triggers = triggers_from_config(&config.schedule)?;
    if triggers.is_empty() {
        tracing::info!("no schedule configured; only manual backups will run");
    }

    let config = Arc::new(config);
    let api: Arc<dyn Orchestrator> = Arc::new(PortainerClient::new(&config.api));
    let renderer = Arc::new(Renderer::new()?);

    let startup_config = config.clone();
    tokio::task::spawn_blocking(move || acquire_repository(&startup_config))
        .await
        .map_err(|err| DaemonError::Task(format!("repository setup join error: {err}")))??;

    let listener = TcpListener::bind(config.listen_addr.as_str())
        .await
        .map_err(|e| io_err(config.listen_addr.as_str(), e))?;
    tracing::info!(addr = %config.listen_addr, "status page listening");

    let status = RuntimeStatus::shared(config.schedule.clone());
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let runner = Arc::new(PipelineRunner::new(config.clone(), api.clone(), renderer.clone()));
    let (queue, processor_handle) =
        spawn_sync_processor(runner, status.clone(), shutdown_tx.clone());

    let trigger_handles: Vec<_> = triggers
        .into_iter()
        .map(|trigger| {
            let queue = queue.clone();
            let shutdown = shutdown_tx.clone();
            tokio::spawn(async move { trigger_task(trigger, queue, shutdown.subscribe()).await })
        })
        .collect();

    let web_handle = {
        let shutdown = shutdown_tx.clone();
        let state = AppState {
            config,
            api,
            renderer,
            queue,
            status,
        };
        tokio::spawn(async move {
            let result = web::serve(listener, state, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Task(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let (processor_result, web_result, signal_result) =
        tokio::join!(processor_handle, web_handle, signal_handle);

    handle_join("sync_processor", processor_result)?;
    handle_join("web_server", web_result)?;
    handle_join("signal_handler", signal_result)?;
    for handle in trigger_handles {
        handle_join("trigger", handle.await)?;
    }
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Task(format!("{task} task join failure: {err}"))),
    }
}

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default `info` filter; repeated calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use stackvault_client::ClientError;
    use stackvault_sync::ChangeSet;

    #[derive(Default)]
    struct CountingRunner {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    impl SyncRunner for CountingRunner {
        fn run_cycle(&self) -> Result<SyncOutcome, SyncError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);

            let mut changes = ChangeSet::default();
            changes.record_update("README.md");
            Ok(SyncOutcome {
                commit_message: Some(changes.commit_message()),
                changes,
                writes: vec![],
                skipped: vec![],
            })
        }
    }

    struct FailingRunner;

    impl SyncRunner for FailingRunner {
        fn run_cycle(&self) -> Result<SyncOutcome, SyncError> {
            Err(SyncError::Client(ClientError::Auth { status: 422 }))
        }
    }

    /// Panics on the first cycle, succeeds afterwards.
    #[derive(Default)]
    struct PanicOnceRunner {
        calls: AtomicUsize,
    }

    impl SyncRunner for PanicOnceRunner {
        fn run_cycle(&self) -> Result<SyncOutcome, SyncError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("cycle blew up");
            }
            Ok(SyncOutcome {
                changes: ChangeSet::default(),
                writes: vec![],
                commit_message: None,
                skipped: vec![],
            })
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_requests_run_one_at_a_time() {
        let runner = Arc::new(CountingRunner::default());
        let status = RuntimeStatus::shared(ScheduleConfig::default());
        let (shutdown_tx, _) = broadcast::channel(4);
        let (queue, handle) = spawn_sync_processor(runner.clone(), status.clone(), shutdown_tx.clone());

        let sources = ["manual", "cron", "interval", "manual"];
        let requests: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let queue = queue.clone();
                tokio::spawn(async move { queue.request(source).await })
            })
            .collect();
        for request in requests {
            let summary = request.await.unwrap().expect("cycle succeeds");
            assert_eq!(summary.commit_message.as_deref(), Some("Update: README.md"));
        }

        assert_eq!(runner.calls.load(Ordering::SeqCst), 4);
        assert_eq!(runner.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(status.read().await.cycles_succeeded, 4);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn failed_cycle_is_reported_and_recorded() {
        let status = RuntimeStatus::shared(ScheduleConfig::default());
        let (shutdown_tx, _) = broadcast::channel(4);
        let (queue, _handle) = spawn_sync_processor(Arc::new(FailingRunner), status.clone(), shutdown_tx);

        let err = queue.request("manual").await.unwrap_err();
        assert!(matches!(err, DaemonError::CycleFailed(ref msg) if msg.contains("422")), "{err}");

        let status = status.read().await;
        assert_eq!(status.cycles_failed, 1);
        let line = status.last_sync_line().expect("status line");
        assert!(line.contains("(manual) failed: platform API error"), "{line}");
    }

    #[tokio::test]
    async fn panicking_cycle_is_recorded_and_worker_survives() {
        let status = RuntimeStatus::shared(ScheduleConfig::default());
        let (shutdown_tx, _) = broadcast::channel(4);
        let (queue, handle) = spawn_sync_processor(
            Arc::new(PanicOnceRunner::default()),
            status.clone(),
            shutdown_tx.clone(),
        );

        let err = queue.request("manual").await.unwrap_err();
        assert!(
            matches!(err, DaemonError::CycleFailed(ref msg) if msg.contains("join error")),
            "{err}"
        );

        let summary = queue.request("cron").await.expect("worker still running");
        assert_eq!(summary.source, "cron");

        {
            let status = status.read().await;
            assert_eq!(status.cycles_failed, 1);
            assert_eq!(status.cycles_succeeded, 1);
        }

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn queue_reports_closed_after_shutdown() {
        let status = RuntimeStatus::shared(ScheduleConfig::default());
        let (shutdown_tx, _) = broadcast::channel(4);
        let (queue, handle) =
            spawn_sync_processor(Arc::new(CountingRunner::default()), status, shutdown_tx.clone());

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();

        assert!(matches!(
            queue.request("manual").await,
            Err(DaemonError::ChannelClosed(_))
        ));
    }

    #[test]
    fn last_sync_line_prefers_most_recent_event() {
        let mut status = RuntimeStatus::new(ScheduleConfig::default());
        assert_eq!(status.last_sync_line(), None);

        status.record_failure("cron", "push rejected".to_string());
        status.record_success(SyncSummary {
            source: "manual".to_string(),
            updated: vec!["README.md".to_string()],
            removed: vec![],
            skipped: vec![],
            written: 1,
            unchanged: 0,
            commit_message: Some("Update: README.md".to_string()),
            finished_at: Utc::now() + chrono::Duration::seconds(5),
            duration_ms: 12,
        });

        let line = status.last_sync_line().unwrap();
        assert!(line.starts_with("Last backup "), "{line}");
        assert!(line.ends_with("(manual): Update: README.md"), "{line}");
    }
}
