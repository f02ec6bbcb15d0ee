//! Error types for stackvault-client.

use thiserror::Error;

/// Failures talking to the orchestration API. None of them are retried.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Credentials were rejected (non-2xx from the auth endpoint).
    #[error("authentication failed with HTTP {status}")]
    Auth { status: u16 },

    /// Any other endpoint answered with a non-2xx status.
    #[error("API request to {url} failed with HTTP {status}")]
    Api { url: String, status: u16 },

    /// Connection, DNS or TLS failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not the expected JSON shape.
    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Auth { status } | ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(_) | ClientError::Decode { .. } => None,
        }
    }
}
