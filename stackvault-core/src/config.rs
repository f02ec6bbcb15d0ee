//! Immutable runtime configuration.
//!
//! A [`BackupConfig`] is built once at startup (the CLI fills it from flags
//! and environment variables), validated with [`BackupConfig::validate`], and
//! then shared read-only with every component.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::ConfigError;

/// Replacement text for masked secrets.
pub const MASK: &str = "XXXXX";

/// Orchestration platform API access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Backup repository identity and local clone location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoConfig {
    pub username: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub name: String,
    pub host: String,
    pub local_path: PathBuf,
    pub author_name: String,
    pub author_email: String,
    /// Explicit remote URL; when set it replaces the URL derived from
    /// `host`/`username`/`token`/`name`.
    #[serde(skip_serializing)]
    pub remote_override: Option<String>,
}

impl RepoConfig {
    /// Repository identity with the default host, clone path and commit author.
    pub fn new(
        username: impl Into<String>,
        token: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            name: name.into(),
            host: "github.com".to_string(),
            local_path: PathBuf::from("/tmp/repo"),
            author_name: "stackvault".to_string(),
            author_email: "stackvault@localhost".to_string(),
            remote_override: None,
        }
    }
}

/// Text placed at the top of the generated `README.md`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadmeConfig {
    pub title: String,
    pub description: String,
}

impl Default for ReadmeConfig {
    fn default() -> Self {
        Self {
            title: "Backup Portainer".to_string(),
            description: "Backup all stacks and .env from portainer".to_string(),
        }
    }
}

/// Automatic sync triggers. Both are optional and fire independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleConfig {
    pub cron: Option<String>,
    pub interval_seconds: Option<u64>,
}

impl ScheduleConfig {
    pub fn is_empty(&self) -> bool {
        self.cron.is_none() && self.interval_seconds.is_none()
    }
}

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupConfig {
    pub api: ApiConfig,
    pub repo: RepoConfig,
    pub readme: ReadmeConfig,
    pub schedule: ScheduleConfig,
    /// Base directory holding `<stack id>/docker-compose.yml` and `<stack id>/stack.env`.
    pub stacks_base_path: PathBuf,
    /// Heading shown on the status page.
    pub page_heading: String,
    pub listen_addr: String,
}

impl BackupConfig {
    /// Configuration with defaults for everything but API access and the
    /// repository identity.
    pub fn new(api: ApiConfig, repo: RepoConfig) -> Self {
        Self {
            api,
            repo,
            readme: ReadmeConfig::default(),
            schedule: ScheduleConfig::default(),
            stacks_base_path: PathBuf::from("/stacks"),
            page_heading: "backup_portainer".to_string(),
            listen_addr: "0.0.0.0:5000".to_string(),
        }
    }

    /// Reject configurations the process cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("GITHUB_USERNAME", &self.repo.username),
            ("GITHUB_TOKEN", &self.repo.token),
            ("GITHUB_REPO_NAME", &self.repo.name),
        ];
        for (var, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing { var });
            }
        }

        if self.schedule.interval_seconds == Some(0) {
            return Err(ConfigError::Invalid {
                var: "INTERVAL_SECONDS",
                reason: "must be greater than zero".to_string(),
            });
        }
        if let Some(cron) = &self.schedule.cron {
            if cron.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    var: "CRON_SCHEDULE",
                    reason: "must not be blank".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Authenticated remote URL used for clone and push.
    pub fn remote_url(&self) -> String {
        if let Some(url) = &self.repo.remote_override {
            return url.clone();
        }
        format!(
            "https://{}:{}@{}/{}/{}.git",
            self.repo.username, self.repo.token, self.repo.host, self.repo.username, self.repo.name
        )
    }

    /// [`remote_url`](Self::remote_url) with the access token masked, for logs.
    pub fn redacted_remote_url(&self) -> String {
        let url = self.remote_url();
        if self.repo.token.is_empty() {
            url
        } else {
            url.replace(&self.repo.token, MASK)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
