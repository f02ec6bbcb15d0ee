//! # stackvault-sync
//!
//! Reconciles the live orchestration state into the backup repository.
//!
//! Call [`pipeline::run`] for one complete cycle (query the platform, then
//! [`RepositorySynchronizer::sync`]), or [`pipeline::status_page`] to build
//! the read-only status view.

pub mod error;
pub mod git;
pub mod pipeline;
pub mod redact;
pub mod stack_files;
pub mod synchronizer;
pub mod writer;

pub use error::{RepositoryError, SyncError};
pub use git::GitRepo;
pub use redact::redact;
pub use stack_files::{read_stack_file, StackFile, COMPOSE_FILE, ENV_FILE};
pub use synchronizer::{ChangeSet, RepositorySynchronizer, SyncOutcome, README_FILE};
pub use writer::WriteResult;
