//! Settings shared by `serve` and `sync`. Every flag falls back to an
//! environment variable of the same meaning.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stackvault_core::{ApiConfig, BackupConfig, ReadmeConfig, RepoConfig, ScheduleConfig};

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Base URL of the orchestration platform API.
    #[arg(long, env = "PORTAINER_URL", default_value = "http://localhost:9000")]
    pub portainer_url: String,

    #[arg(long, env = "PORTAINER_USERNAME", default_value = "")]
    pub portainer_username: String,

    #[arg(long, env = "PORTAINER_PASSWORD", default_value = "", hide_env_values = true)]
    pub portainer_password: String,

    /// Heading of the status page.
    #[arg(long, env = "TARGET_CONTAINER_NAME", default_value = "backup_portainer")]
    pub target_container_name: String,

    /// Directory holding `<stack id>/docker-compose.yml` and `<stack id>/stack.env`.
    #[arg(long, env = "STACKS_BASE_PATH", default_value = "/stacks")]
    pub stacks_base_path: PathBuf,

    #[arg(long, env = "GITHUB_USERNAME", default_value = "")]
    pub github_username: String,

    #[arg(long, env = "GITHUB_TOKEN", default_value = "", hide_env_values = true)]
    pub github_token: String,

    #[arg(long, env = "GITHUB_REPO_NAME", default_value = "")]
    pub github_repo_name: String,

    #[arg(long, env = "GITHUB_HOST", default_value = "github.com")]
    pub github_host: String,

    /// Local clone of the backup repository.
    #[arg(long, env = "GITHUB_REPO_PATH", default_value = "/tmp/repo")]
    pub github_repo_path: PathBuf,

    /// Full remote URL; replaces the one derived from the GitHub settings.
    #[arg(long, env = "BACKUP_REPO_URL", hide_env_values = true)]
    pub backup_repo_url: Option<String>,

    #[arg(long, env = "GIT_AUTHOR_NAME", default_value = "stackvault")]
    pub git_author_name: String,

    #[arg(long, env = "GIT_AUTHOR_EMAIL", default_value = "stackvault@localhost")]
    pub git_author_email: String,

    #[arg(long, env = "README_TITLE", default_value = "Backup Portainer")]
    pub readme_title: String,

    #[arg(
        long,
        env = "README_DESCRIPTION",
        default_value = "Backup all stacks and .env from portainer"
    )]
    pub readme_description: String,

    /// Crontab expression (5 fields, or 6/7 with leading seconds).
    #[arg(long, env = "CRON_SCHEDULE")]
    pub cron_schedule: Option<String>,

    /// Fixed interval between automatic syncs.
    #[arg(long, env = "INTERVAL_SECONDS")]
    pub interval_seconds: Option<u64>,

    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:5000")]
    pub listen_addr: String,
}

impl ConfigArgs {
    /// Build and validate the immutable configuration.
    pub fn into_config(self) -> Result<BackupConfig> {
        let api = ApiConfig {
            base_url: self.portainer_url,
            username: self.portainer_username,
            password: self.portainer_password,
        };

        let mut repo = RepoConfig::new(self.github_username, self.github_token, self.github_repo_name);
        repo.host = self.github_host;
        repo.local_path = self.github_repo_path;
        repo.author_name = self.git_author_name;
        repo.author_email = self.git_author_email;
        repo.remote_override = self.backup_repo_url;

        let mut config = BackupConfig::new(api, repo);
        config.readme = ReadmeConfig {
            title: self.readme_title,
            description: self.readme_description,
        };
        config.schedule = ScheduleConfig {
            cron: self.cron_schedule,
            interval_seconds: self.interval_seconds,
        };
        config.stacks_base_path = self.stacks_base_path;
        config.page_heading = self.target_container_name;
        config.listen_addr = self.listen_addr;

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}
