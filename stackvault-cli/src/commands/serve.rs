//! `stackvault serve`: the long-running backup service.

use anyhow::{Context, Result};
use clap::Args;

use super::config::ConfigArgs;

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl ServeArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.into_config()?;
        stackvault_daemon::start_blocking(config).context("backup service stopped with an error")
    }
}
