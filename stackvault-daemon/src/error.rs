use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the daemon runtime, scheduler and web server.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sync error: {0}")]
    Sync(#[from] stackvault_sync::SyncError),

    #[error("render error: {0}")]
    Render(#[from] stackvault_renderer::RenderError),

    #[error("configuration error: {0}")]
    Config(#[from] stackvault_core::ConfigError),

    #[error("invalid cron expression {expr:?}: {reason}")]
    Schedule { expr: String, reason: String },

    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    /// A sync cycle ran and failed; carries the rendered cause.
    #[error("sync cycle failed: {0}")]
    CycleFailed(String),

    #[error("daemon task error: {0}")]
    Task(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
