//! Entry points that pair a platform query with a repository pass or a
//! status view.

use stackvault_client::Orchestrator;
use stackvault_core::{stacks_for_endpoint, BackupConfig};
use stackvault_renderer::{EndpointView, Renderer, StackView, StatusPageContext};

use crate::error::SyncError;
use crate::stack_files::{read_stack_file, COMPOSE_FILE, ENV_FILE};
use crate::synchronizer::{RepositorySynchronizer, SyncOutcome};

/// One complete sync cycle: authenticate, list endpoints and stacks, then
/// reconcile the backup repository.
pub fn run(
    config: &BackupConfig,
    api: &dyn Orchestrator,
    renderer: &Renderer,
) -> Result<SyncOutcome, SyncError> {
    let token = api.authenticate()?;
    let endpoints = api.list_endpoints(&token)?;
    let stacks = api.list_stacks(&token)?;
    tracing::info!(
        endpoints = endpoints.len(),
        stacks = stacks.len(),
        "fetched platform state",
    );

    let outcome = RepositorySynchronizer::new(config, api, renderer).sync(&endpoints, &stacks)?;
    tracing::info!(
        written = outcome.written(),
        unchanged = outcome.unchanged(),
        removed = outcome.changes.removed.len(),
        "sync cycle finished",
    );
    Ok(outcome)
}

/// Build the status page view from the live platform state.
///
/// Stacks with a known project path carry their compose text and their
/// redacted env text; read failures are shown inline.
pub fn status_page(
    config: &BackupConfig,
    api: &dyn Orchestrator,
    last_sync: Option<String>,
) -> Result<StatusPageContext, SyncError> {
    let token = api.authenticate()?;
    let endpoints = api.list_endpoints(&token)?;
    let stacks = api.list_stacks(&token)?;
    let base = &config.stacks_base_path;

    let endpoints = endpoints
        .iter()
        .map(|endpoint| {
            let views = stacks_for_endpoint(&stacks, endpoint)
                .map(|stack| {
                    if !stack.has_project_path() {
                        return StackView::summary(stack);
                    }
                    let compose = read_stack_file(base, stack.id, COMPOSE_FILE).into_text(COMPOSE_FILE);
                    let env = read_stack_file(base, stack.id, ENV_FILE).into_redacted_text(ENV_FILE);
                    StackView::with_files(stack, compose, env)
                })
                .collect();
            EndpointView::new(endpoint, views)
        })
        .collect();

    Ok(StatusPageContext {
        heading: config.page_heading.clone(),
        endpoints,
        last_sync,
    })
}
