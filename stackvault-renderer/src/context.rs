//! Template contexts: serializable payloads for the README and status page.

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use stackvault_core::{Container, Endpoint, ReadmeConfig, Stack};

use crate::error::RenderError;

pub const RUNNING_ICON: &str = "🟢";
pub const STOPPED_ICON: &str = "🔴";

/// Placeholder for a container without published ports.
pub const NO_PORTS: &str = "N/A";

// ---------------------------------------------------------------------------
// README
// ---------------------------------------------------------------------------

/// One row of a node's container table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerRow {
    pub icon: String,
    pub name: String,
    pub ports: String,
}

impl ContainerRow {
    pub fn from_container(container: &Container) -> Self {
        let icon = if container.is_running() {
            RUNNING_ICON
        } else {
            STOPPED_ICON
        };
        let ports = container.published_ports();
        ContainerRow {
            icon: icon.to_string(),
            name: container.display_name().to_string(),
            ports: if ports.is_empty() {
                NO_PORTS.to_string()
            } else {
                ports.join(", ")
            },
        }
    }
}

/// One `## Node` section.
#[derive(Debug, Clone, Serialize)]
pub struct NodeCtx {
    pub name: String,
    pub containers: Vec<ContainerRow>,
}

impl NodeCtx {
    pub fn new(endpoint: &Endpoint, containers: &[Container]) -> Self {
        NodeCtx {
            name: endpoint.name.clone(),
            containers: containers.iter().map(ContainerRow::from_container).collect(),
        }
    }
}

/// Payload for `README.md`.
#[derive(Debug, Clone, Serialize)]
pub struct ReadmeContext {
    pub title: String,
    pub description: String,
    /// Shown in every row's "DATE LAST UPDATE" column (`dd/mm/YYYY`).
    pub date: String,
    pub nodes: Vec<NodeCtx>,
}

impl ReadmeContext {
    pub fn new(readme: &ReadmeConfig, date: impl Into<String>, nodes: Vec<NodeCtx>) -> Self {
        ReadmeContext {
            title: readme.title.clone(),
            description: readme.description.clone(),
            date: date.into(),
            nodes,
        }
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

/// `dd/mm/YYYY` rendering of `now` in its own timezone.
pub fn readme_date<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%d/%m/%Y").to_string()
}

// ---------------------------------------------------------------------------
// Status page
// ---------------------------------------------------------------------------

/// A stack as shown on the status page.
#[derive(Debug, Clone, Serialize)]
pub struct StackView {
    pub name: String,
    pub status: String,
    pub has_project_path: bool,
    pub project_path: String,
    /// Compose definition text; empty unless `has_project_path`.
    pub compose: String,
    /// Redacted env file text; empty unless `has_project_path`.
    pub env: String,
}

impl StackView {
    /// View without file contents (no project path known).
    pub fn summary(stack: &Stack) -> Self {
        StackView {
            name: stack.name.clone(),
            status: stack.status.to_string(),
            has_project_path: false,
            project_path: String::new(),
            compose: String::new(),
            env: String::new(),
        }
    }

    /// View carrying the compose text and the already-redacted env text.
    pub fn with_files(stack: &Stack, compose: String, env: String) -> Self {
        StackView {
            has_project_path: true,
            project_path: stack.project_path.clone().unwrap_or_default(),
            compose,
            env,
            ..StackView::summary(stack)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointView {
    pub id: String,
    pub name: String,
    pub stacks: Vec<StackView>,
}

impl EndpointView {
    pub fn new(endpoint: &Endpoint, stacks: Vec<StackView>) -> Self {
        EndpointView {
            id: endpoint.id.to_string(),
            name: endpoint.name.clone(),
            stacks,
        }
    }
}

/// Payload for the HTML status page.
#[derive(Debug, Clone, Serialize)]
pub struct StatusPageContext {
    pub heading: String,
    pub endpoints: Vec<EndpointView>,
    /// One-line description of the most recent sync, when one has run.
    pub last_sync: Option<String>,
}

impl StatusPageContext {
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}
