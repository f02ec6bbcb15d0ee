//! Long-running backup service: sync queue, schedule triggers and web server.

mod error;
pub mod runtime;
pub mod scheduler;
pub mod web;

pub use error::DaemonError;
pub use runtime::{
    init_tracing, run, spawn_sync_processor, start_blocking, PipelineRunner, RuntimeStatus,
    SharedStatus, SyncQueue, SyncRunner, SyncSummary,
};
pub use scheduler::{parse_cron, triggers_from_config, Trigger};
pub use web::{build_router, serve, AppState};
