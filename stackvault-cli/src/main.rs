//! Stackvault: versioned backups of orchestration stacks.
//!
//! # Usage
//!
//! ```text
//! stackvault serve              # status page, manual trigger, cron/interval schedule
//! stackvault sync [--json]      # one full backup cycle, then exit
//! stackvault redact <FILE|->    # print an env file with secrets masked
//! stackvault status [--url URL] [--json]
//! ```
//!
//! `serve` and `sync` read their settings from flags or the matching
//! environment variables (`PORTAINER_URL`, `GITHUB_TOKEN`, ...).

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{redact::RedactArgs, serve::ServeArgs, status::StatusArgs, sync::SyncArgs};

#[derive(Parser, Debug)]
#[command(
    name = "stackvault",
    version,
    about = "Back up orchestration stacks and env files into a git repository",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the backup service: web status page plus scheduled syncs.
    Serve(ServeArgs),

    /// Run one backup cycle and exit.
    Sync(SyncArgs),

    /// Print an env file with sensitive values masked.
    Redact(RedactArgs),

    /// Show the state of a running backup service.
    Status(StatusArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Redact(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
