//! HTTP surface: status page, manual trigger and a JSON status endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use stackvault_client::Orchestrator;
use stackvault_core::BackupConfig;
use stackvault_renderer::Renderer;
use stackvault_sync::pipeline;

use crate::error::{io_err, DaemonError};
use crate::runtime::{SharedStatus, SyncQueue};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BackupConfig>,
    pub api: Arc<dyn Orchestrator>,
    pub renderer: Arc<Renderer>,
    pub queue: SyncQueue,
    pub status: SharedStatus,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status_page_handler))
        .route("/backup", post(backup_handler))
        .route("/api/status", get(status_json_handler))
        .with_state(state)
}

/// Serve until a shutdown broadcast arrives.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let addr = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "listener".to_string());
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .map_err(|e| io_err(addr, e))
}

async fn status_page_handler(State(state): State<AppState>) -> Response {
    let last_sync = state.status.read().await.last_sync_line();
    let config = state.config.clone();
    let api = state.api.clone();
    let renderer = state.renderer.clone();

    let rendered = tokio::task::spawn_blocking(move || -> Result<String, DaemonError> {
        let ctx = pipeline::status_page(&config, api.as_ref(), last_sync)?;
        Ok(renderer.render_status_page(&ctx)?)
    })
    .await;

    match rendered {
        Ok(Ok(html)) => Html(html).into_response(),
        Ok(Err(err)) => {
            tracing::error!(error = %err, "status page failed");
            error_response(&state, &err.to_string())
        }
        Err(err) => error_response(&state, &format!("status page task failed: {err}")),
    }
}

async fn backup_handler(State(state): State<AppState>) -> Response {
    match state.queue.request("manual").await {
        Ok(summary) => {
            tracing::info!(
                written = summary.written,
                unchanged = summary.unchanged,
                duration_ms = summary.duration_ms,
                "manual sync completed",
            );
            Redirect::to("/").into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "manual sync failed");
            error_response(&state, &err.to_string())
        }
    }
}

async fn status_json_handler(State(state): State<AppState>) -> Response {
    let status = state.status.read().await.clone();
    Json(status).into_response()
}

fn error_response(state: &AppState, message: &str) -> Response {
    let body = match state.renderer.render_error_page(&state.config.page_heading, message) {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "error page failed to render");
            message.to_string().into_response()
        }
    };
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}
