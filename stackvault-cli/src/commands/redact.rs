//! `stackvault redact`: show an env file the way it is committed.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

#[derive(Args, Debug)]
pub struct RedactArgs {
    /// Env file to redact; `-` reads standard input.
    pub file: PathBuf,
}

impl RedactArgs {
    pub fn run(self) -> Result<()> {
        let content = if self.file.as_os_str() == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read standard input")?;
            buf
        } else {
            std::fs::read_to_string(&self.file)
                .with_context(|| format!("failed to read {}", self.file.display()))?
        };
        print!("{}", stackvault_sync::redact(&content));
        Ok(())
    }
}
