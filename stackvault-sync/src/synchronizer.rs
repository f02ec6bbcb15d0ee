//! Repository reconciliation. One complete pass per call.
//!
//! Steps, strictly in order:
//!
//! 1. Acquire the clone (reuse a valid working tree, clone otherwise).
//! 2. Prune stack directories the platform no longer reports, one commit per
//!    removed stack.
//! 3. Write `docker-compose.yml` (always) and the redacted `stack.env` (only
//!    when the source exists) for every current stack.
//! 4. Regenerate `README.md` from a live container listing per endpoint.
//! 5. Commit everything as `Update: <sorted change set>` and push.
//!
//! Backup tree layout: `{endpoint}/{stack}/docker-compose.yml`,
//! `{endpoint}/{stack}/stack.env`, `README.md`.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use stackvault_client::Orchestrator;
use stackvault_core::{stacks_for_endpoint, BackupConfig, Endpoint, Stack};
use stackvault_renderer::{context::readme_date, NodeCtx, ReadmeContext, Renderer};

use crate::error::{io_err, SyncError};
use crate::git::{CommitAuthor, GitRepo};
use crate::stack_files::{read_stack_file, COMPOSE_FILE, ENV_FILE};
use crate::writer::{atomic_write, remove_if_present, WriteResult};

pub const README_FILE: &str = "README.md";

// ---------------------------------------------------------------------------
// ChangeSet
// ---------------------------------------------------------------------------

/// Names touched by one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    /// Stack names (and `README.md`) written this cycle.
    pub updated: BTreeSet<String>,
    /// Stacks pruned in step 2, in removal order.
    pub removed: Vec<String>,
}

impl ChangeSet {
    pub fn record_update(&mut self, name: impl Into<String>) {
        self.updated.insert(name.into());
    }

    pub fn record_removal(&mut self, name: impl Into<String>) {
        self.removed.push(name.into());
    }

    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.removed.is_empty()
    }

    /// `Update: ` followed by the sorted, comma-separated updated names.
    pub fn commit_message(&self) -> String {
        let names: Vec<&str> = self.updated.iter().map(String::as_str).collect();
        format!("Update: {}", names.join(", "))
    }
}

/// Commit subject for a pruned stack.
pub fn removal_message(stack_name: &str) -> String {
    format!("Remove obsolete stack: {stack_name}")
}

// ---------------------------------------------------------------------------
// SyncOutcome
// ---------------------------------------------------------------------------

/// What one cycle did.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub changes: ChangeSet,
    pub writes: Vec<WriteResult>,
    /// Subject of the trailing batch commit, when one was made.
    pub commit_message: Option<String>,
    /// Platform names that could not be used as directory names.
    pub skipped: Vec<String>,
}

impl SyncOutcome {
    pub fn written(&self) -> usize {
        self.writes.iter().filter(|w| w.changed()).count()
    }

    pub fn unchanged(&self) -> usize {
        self.writes.len() - self.written()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `true` when `name` can be used as exactly one directory level.
/// `.git` is refused in any letter case.
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.eq_ignore_ascii_case(".git")
        && !name.contains(['/', '\\', '\0'])
}

/// `true` when `name` may become a directory at the repository root: a safe
/// component that is not the README and does not shadow an existing file.
pub fn is_usable_endpoint_name(root: &Path, name: &str) -> bool {
    if !is_safe_component(name) || name.eq_ignore_ascii_case(README_FILE) {
        return false;
    }
    match std::fs::symlink_metadata(root.join(name)) {
        Ok(meta) => meta.is_dir(),
        Err(_) => true,
    }
}

fn commit_author(config: &BackupConfig) -> CommitAuthor {
    CommitAuthor {
        name: config.repo.author_name.clone(),
        email: config.repo.author_email.clone(),
    }
}

fn secrets(config: &BackupConfig) -> Vec<String> {
    vec![config.repo.token.clone()]
}

/// Step 1: reuse the clone at `repo.local_path` when valid, clone otherwise.
pub fn acquire_repository(config: &BackupConfig) -> Result<GitRepo, SyncError> {
    let path = &config.repo.local_path;
    if let Some(repo) = GitRepo::open(path, commit_author(config), secrets(config)) {
        tracing::info!(path = %path.display(), "reusing existing backup repository");
        return Ok(repo);
    }
    tracing::info!(
        path = %path.display(),
        remote = %config.redacted_remote_url(),
        "cloning backup repository",
    );
    let repo = GitRepo::clone_from(
        &config.remote_url(),
        path,
        commit_author(config),
        secrets(config),
    )?;
    Ok(repo)
}

fn sorted_subdirectories(dir: &Path) -> Result<Vec<(String, PathBuf)>, SyncError> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let ty = entry.file_type().map_err(|e| io_err(entry.path(), e))?;
        if ty.is_dir() {
            dirs.push((entry.file_name().to_string_lossy().to_string(), entry.path()));
        }
    }
    dirs.sort();
    Ok(dirs)
}

// ---------------------------------------------------------------------------
// RepositorySynchronizer
// ---------------------------------------------------------------------------

/// Reconciliation engine. Holds no state between cycles; the working tree is
/// the only persistent state.
pub struct RepositorySynchronizer<'a> {
    config: &'a BackupConfig,
    api: &'a dyn Orchestrator,
    renderer: &'a Renderer,
}

impl<'a> RepositorySynchronizer<'a> {
    pub fn new(config: &'a BackupConfig, api: &'a dyn Orchestrator, renderer: &'a Renderer) -> Self {
        Self {
            config,
            api,
            renderer,
        }
    }

    /// Run one full reconciliation pass for the given live state.
    ///
    /// Any error aborts the pass; commits already made while pruning stay.
    pub fn sync(&self, endpoints: &[Endpoint], stacks: &[Stack]) -> Result<SyncOutcome, SyncError> {
        let repo = acquire_repository(self.config)?;
        let mut changes = ChangeSet::default();
        let mut writes = Vec::new();
        let mut skipped = Vec::new();

        for name in prune_stale_stacks(&repo, endpoints, stacks)? {
            changes.record_removal(name);
        }

        self.materialize_stacks(
            repo.workdir(),
            endpoints,
            stacks,
            &mut changes,
            &mut writes,
            &mut skipped,
        )?;

        writes.push(self.write_readme(repo.workdir(), endpoints)?);
        changes.record_update(README_FILE);
        tracing::info!("updated: {README_FILE}");

        let commit_message = commit_and_push(&repo, &changes)?;

        Ok(SyncOutcome {
            changes,
            writes,
            commit_message,
            skipped,
        })
    }

    /// Step 3.
    fn materialize_stacks(
        &self,
        root: &Path,
        endpoints: &[Endpoint],
        stacks: &[Stack],
        changes: &mut ChangeSet,
        writes: &mut Vec<WriteResult>,
        skipped: &mut Vec<String>,
    ) -> Result<(), SyncError> {
        let base = &self.config.stacks_base_path;

        for endpoint in endpoints {
            if !is_usable_endpoint_name(root, &endpoint.name) {
                tracing::warn!(endpoint = %endpoint.name, "skipping endpoint with unusable name");
                skipped.push(endpoint.name.clone());
                continue;
            }
            let endpoint_dir = root.join(&endpoint.name);
            std::fs::create_dir_all(&endpoint_dir).map_err(|e| io_err(&endpoint_dir, e))?;

            for stack in stacks_for_endpoint(stacks, endpoint) {
                if !is_safe_component(&stack.name) {
                    tracing::warn!(stack = %stack.name, "skipping stack with unusable name");
                    skipped.push(stack.name.clone());
                    continue;
                }
                let stack_dir = endpoint_dir.join(&stack.name);
                std::fs::create_dir_all(&stack_dir).map_err(|e| io_err(&stack_dir, e))?;

                // The compose file always counts as updated, even when its
                // text is a not-found or read-error message.
                let compose = read_stack_file(base, stack.id, COMPOSE_FILE).into_text(COMPOSE_FILE);
                writes.push(atomic_write(&stack_dir.join(COMPOSE_FILE), &compose)?);
                changes.record_update(&stack.name);
                tracing::info!("updated: {}/{COMPOSE_FILE}", stack.name);

                let env = read_stack_file(base, stack.id, ENV_FILE);
                let env_path = stack_dir.join(ENV_FILE);
                if env.is_absent() {
                    if let Some(removed) = remove_if_present(&env_path)? {
                        writes.push(removed);
                        changes.record_update(&stack.name);
                    }
                    continue;
                }
                writes.push(atomic_write(&env_path, &env.into_redacted_text(ENV_FILE))?);
                changes.record_update(&stack.name);
                tracing::info!("updated: {}/{ENV_FILE}", stack.name);
            }
        }
        Ok(())
    }

    /// Step 4. One authentication and one container listing per endpoint.
    fn write_readme(&self, root: &Path, endpoints: &[Endpoint]) -> Result<WriteResult, SyncError> {
        let mut nodes = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let token = self.api.authenticate()?;
            let containers = self.api.list_containers(&token, endpoint.id)?;
            nodes.push(NodeCtx::new(endpoint, &containers));
        }
        let ctx = ReadmeContext::new(&self.config.readme, readme_date(&Local::now()), nodes);
        let content = self.renderer.render_readme(&ctx)?;
        atomic_write(&root.join(README_FILE), &content)
    }
}

/// Step 2. Removes every stack directory under a current endpoint whose name
/// is not among that endpoint's current stacks, committing each removal.
///
/// Returns the removed directory names.
pub fn prune_stale_stacks(
    repo: &GitRepo,
    endpoints: &[Endpoint],
    stacks: &[Stack],
) -> Result<Vec<String>, SyncError> {
    let mut removed = Vec::new();

    for endpoint in endpoints {
        if !is_usable_endpoint_name(repo.workdir(), &endpoint.name) {
            continue;
        }
        let endpoint_dir = repo.workdir().join(&endpoint.name);
        if !endpoint_dir.is_dir() {
            continue;
        }
        let current: HashSet<&str> = stacks_for_endpoint(stacks, endpoint)
            .map(|s| s.name.as_str())
            .collect();

        for (name, path) in sorted_subdirectories(&endpoint_dir)? {
            if current.contains(name.as_str()) {
                continue;
            }
            tracing::info!(path = %path.display(), "removing obsolete directory");
            std::fs::remove_dir_all(&path).map_err(|e| io_err(&path, e))?;

            let relative = Path::new(&endpoint.name).join(&name);
            repo.unstage_removed(&relative)?;
            if repo.has_staged_changes(Some(&relative))? {
                repo.commit(&removal_message(&name), false, Some(&relative))?;
            }
            removed.push(name);
        }
    }
    Ok(removed)
}

/// Step 5. Returns the batch commit subject when a commit was made.
pub fn commit_and_push(repo: &GitRepo, changes: &ChangeSet) -> Result<Option<String>, SyncError> {
    let message = if changes.is_empty() {
        None
    } else {
        repo.stage_all()?;
        let message = changes.commit_message();
        repo.commit(&message, true, None)?;
        Some(message)
    };
    repo.push()?;
    match &message {
        Some(message) => tracing::info!("commit and push completed: {message}"),
        None => tracing::info!("push completed; nothing new to commit"),
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn commit_message_is_sorted() {
        let mut changes = ChangeSet::default();
        changes.record_update("web");
        changes.record_update(README_FILE);
        changes.record_update("api");
        changes.record_update("web");
        assert_eq!(changes.commit_message(), "Update: README.md, api, web");
    }

    #[test]
    fn removals_alone_make_change_set_non_empty() {
        let mut changes = ChangeSet::default();
        assert!(changes.is_empty());
        changes.record_removal("db");
        assert!(!changes.is_empty());
    }

    #[test]
    fn removal_message_names_stack() {
        assert_eq!(removal_message("db"), "Remove obsolete stack: db");
    }

    #[rstest]
    #[case("web", true)]
    #[case("my.stack-1", true)]
    #[case("", false)]
    #[case(".", false)]
    #[case("..", false)]
    #[case("a/b", false)]
    #[case("a\\b", false)]
    #[case(".git", false)]
    #[case(".GIT", false)]
    #[case(".github", true)]
    fn safe_component(#[case] name: &str, #[case] safe: bool) {
        assert_eq!(is_safe_component(name), safe);
    }

    #[test]
    fn endpoint_names_cannot_shadow_root_entries() {
        let root = tempfile::TempDir::new().unwrap();
        std::fs::write(root.path().join("notes.txt"), "x").unwrap();
        std::fs::create_dir(root.path().join("local")).unwrap();

        assert!(is_usable_endpoint_name(root.path(), "local"));
        assert!(is_usable_endpoint_name(root.path(), "edge"));
        assert!(!is_usable_endpoint_name(root.path(), "notes.txt"));
        assert!(!is_usable_endpoint_name(root.path(), README_FILE));
        assert!(!is_usable_endpoint_name(root.path(), "readme.md"));
        assert!(!is_usable_endpoint_name(root.path(), ".git"));
    }
}
