//! `stackvault sync`: one backup cycle without the service around it.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use stackvault_client::PortainerClient;
use stackvault_renderer::Renderer;
use stackvault_sync::{pipeline, SyncOutcome, WriteResult};

use super::config::ConfigArgs;

#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Emit the cycle outcome as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        stackvault_daemon::init_tracing();
        let json = self.json;
        let config = self.config.into_config()?;

        let api = PortainerClient::new(&config.api);
        let renderer = Renderer::new().context("failed to load templates")?;
        let outcome = pipeline::run(&config, &api, &renderer).context("sync cycle failed")?;

        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).context("failed to serialize sync outcome")?
            );
        } else {
            print_outcome(&outcome);
        }
        Ok(())
    }
}

fn print_outcome(outcome: &SyncOutcome) {
    println!(
        "{} backup synced ({} written, {} unchanged, {} removed)",
        "✓".green().bold(),
        outcome.written(),
        outcome.unchanged(),
        outcome.changes.removed.len(),
    );

    for write in &outcome.writes {
        match write {
            WriteResult::Written { path } => println!("  ✎  {}", path.display()),
            WriteResult::Unchanged { path } => println!("  ·  {}", path.display()),
            WriteResult::Removed { path } => println!("  ✗  {}", path.display()),
        }
    }
    for name in &outcome.changes.removed {
        println!("  {} obsolete stack {name}", "✗".red());
    }
    for name in &outcome.skipped {
        println!("  {} skipped unusable name {name:?}", "!".yellow());
    }
    if let Some(message) = &outcome.commit_message {
        println!("committed: {message}");
    }
}
