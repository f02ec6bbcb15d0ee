//! Reads a stack's compose and env files from the platform's data mount.
//!
//! Layout consumed: `{base}/{stack id}/docker-compose.yml` and
//! `{base}/{stack id}/stack.env`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use stackvault_core::StackId;

use crate::redact::redact;

pub const COMPOSE_FILE: &str = "docker-compose.yml";
pub const ENV_FILE: &str = "stack.env";

/// Result of reading one stack file. Reading never fails the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackFile {
    Content(String),
    /// The file does not exist.
    Absent,
    /// Any other I/O failure, with its description.
    Unreadable(String),
}

impl StackFile {
    pub fn is_absent(&self) -> bool {
        matches!(self, StackFile::Absent)
    }

    /// Text form used when the file is shown or backed up regardless of
    /// outcome: the content, `"{filename} not found"`, or
    /// `"Error reading {filename}: {reason}"`.
    pub fn into_text(self, filename: &str) -> String {
        match self {
            StackFile::Content(content) => content,
            StackFile::Absent => format!("{filename} not found"),
            StackFile::Unreadable(reason) => format!("Error reading {filename}: {reason}"),
        }
    }

    /// [`into_text`](Self::into_text) passed through the secret redactor.
    pub fn into_redacted_text(self, filename: &str) -> String {
        redact(&self.into_text(filename))
    }
}

/// `{base}/{stack id}/{filename}`
pub fn stack_file_path(base: &Path, stack_id: StackId, filename: &str) -> PathBuf {
    base.join(stack_id.to_string()).join(filename)
}

/// Read `filename` of stack `stack_id` as text.
pub fn read_stack_file(base: &Path, stack_id: StackId, filename: &str) -> StackFile {
    let path = stack_file_path(base, stack_id, filename);
    match std::fs::read_to_string(&path) {
        Ok(content) => StackFile::Content(content),
        Err(err) if err.kind() == ErrorKind::NotFound => StackFile::Absent,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "stack file unreadable");
            StackFile::Unreadable(err.to_string())
        }
    }
}
