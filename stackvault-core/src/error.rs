//! Error types for stackvault-core.

use thiserror::Error;

/// Configuration problems detected at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is unset or blank.
    #[error("{var} is not defined; set this environment variable")]
    Missing { var: &'static str },

    /// A setting is present but unusable.
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
