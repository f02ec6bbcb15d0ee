//! Stackvault core library: domain types, configuration and errors.
//!
//! - [`types`]: endpoints, stacks, containers as reported by the platform
//! - [`config`]: the immutable [`BackupConfig`]
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{ApiConfig, BackupConfig, ReadmeConfig, RepoConfig, ScheduleConfig, MASK};
pub use error::ConfigError;
pub use types::{
    stacks_for_endpoint, Container, Endpoint, EndpointId, Port, Stack, StackId, StackStatus,
};
