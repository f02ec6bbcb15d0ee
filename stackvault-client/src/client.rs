//! Orchestration API contract and its `ureq` implementation.
//!
//! | Operation          | Request                                                     |
//! |--------------------|-------------------------------------------------------------|
//! | `authenticate`     | `POST /api/auth` `{username, password}` → `{jwt}`           |
//! | `list_endpoints`   | `GET /api/endpoints`                                        |
//! | `list_stacks`      | `GET /api/stacks`                                           |
//! | `list_containers`  | `GET /api/endpoints/{id}/docker/containers/json?all=true`   |
//!
//! Every `GET` carries `Authorization: Bearer {jwt}`.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use stackvault_core::{ApiConfig, Container, Endpoint, EndpointId, Stack};

use crate::error::ClientError;

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// Bearer token returned by [`Orchestrator::authenticate`].
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(jwt: impl Into<String>) -> Self {
        Self(jwt.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Queries the sync pipeline needs from the orchestration platform.
pub trait Orchestrator: Send + Sync {
    /// Exchange the configured credentials for a bearer token.
    fn authenticate(&self) -> Result<Token, ClientError>;

    fn list_endpoints(&self, token: &Token) -> Result<Vec<Endpoint>, ClientError>;

    fn list_stacks(&self, token: &Token) -> Result<Vec<Stack>, ClientError>;

    /// All containers on `endpoint`, including stopped ones.
    fn list_containers(
        &self,
        token: &Token,
        endpoint: EndpointId,
    ) -> Result<Vec<Container>, ClientError>;
}

#[derive(Deserialize)]
struct AuthResponse {
    jwt: String,
}

// ---------------------------------------------------------------------------
// PortainerClient
// ---------------------------------------------------------------------------

/// Blocking [`Orchestrator`] over HTTP. No retries, transport-default timeouts.
pub struct PortainerClient {
    agent: ureq::Agent,
    base_url: String,
    username: String,
    password: String,
}

impl PortainerClient {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, token: &Token, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        let response = self
            .agent
            .get(&url)
            .set("Authorization", &format!("Bearer {}", token.as_str()))
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(status, _) => ClientError::Api {
                    url: url.clone(),
                    status,
                },
                ureq::Error::Transport(transport) => ClientError::Transport(transport.to_string()),
            })?;
        response
            .into_json::<T>()
            .map_err(|source| ClientError::Decode { url, source })
    }
}

impl Orchestrator for PortainerClient {
    fn authenticate(&self) -> Result<Token, ClientError> {
        tracing::info!("fetching platform authentication token");
        let url = self.url("/api/auth");
        let response = self
            .agent
            .post(&url)
            .send_json(serde_json::json!({
                "username": self.username,
                "password": self.password,
            }))
            .map_err(|err| match err {
                ureq::Error::Status(status, _) => ClientError::Auth { status },
                ureq::Error::Transport(transport) => ClientError::Transport(transport.to_string()),
            })?;
        let body: AuthResponse = response
            .into_json()
            .map_err(|source| ClientError::Decode { url, source })?;
        Ok(Token(body.jwt))
    }

    fn list_endpoints(&self, token: &Token) -> Result<Vec<Endpoint>, ClientError> {
        tracing::info!("fetching endpoints");
        self.get_json(token, "/api/endpoints")
    }

    fn list_stacks(&self, token: &Token) -> Result<Vec<Stack>, ClientError> {
        tracing::info!("fetching stacks");
        self.get_json(token, "/api/stacks")
    }

    fn list_containers(
        &self,
        token: &Token,
        endpoint: EndpointId,
    ) -> Result<Vec<Container>, ClientError> {
        tracing::info!(endpoint = %endpoint, "fetching containers");
        self.get_json(
            token,
            &format!("/api/endpoints/{endpoint}/docker/containers/json?all=true"),
        )
    }
}
