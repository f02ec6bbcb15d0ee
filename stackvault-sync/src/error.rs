//! Error types for stackvault-sync.

use std::path::PathBuf;

use thiserror::Error;

use stackvault_client::ClientError;
use stackvault_renderer::RenderError;

/// Failures of a git invocation against the backup clone.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The `git` executable could not be started.
    #[error("failed to run git {args}: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },

    /// `git` ran and exited non-zero. `stderr` has credentials masked.
    #[error("git {args} failed (exit {code}): {stderr}")]
    Command {
        args: String,
        code: i32,
        stderr: String,
    },
}

/// All errors that abort a sync cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The orchestration API rejected or failed a request.
    #[error("platform API error: {0}")]
    Client(#[from] ClientError),

    /// Clone, commit or push failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// README rendering failed.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// An I/O error in the backup working tree, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
