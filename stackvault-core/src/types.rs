//! Domain types for the orchestration platform snapshot.
//!
//! Every value here is re-fetched from the platform API on each sync cycle;
//! nothing is cached between cycles. Field names follow the platform's JSON
//! (`Id`, `Name`, `EndpointId`, ...) via `serde(rename)`.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Platform identifier of an endpoint (node).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(pub u64);

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for EndpointId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Platform identifier of a stack. Also the directory name of the stack's
/// files under the stacks base path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackId(pub u64);

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for StackId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Deployment status as reported by the platform (`1` active, `2` inactive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum StackStatus {
    Active,
    Inactive,
    Other(i64),
}

impl Default for StackStatus {
    fn default() -> Self {
        StackStatus::Other(0)
    }
}

impl From<i64> for StackStatus {
    fn from(raw: i64) -> Self {
        match raw {
            1 => StackStatus::Active,
            2 => StackStatus::Inactive,
            other => StackStatus::Other(other),
        }
    }
}

impl From<StackStatus> for i64 {
    fn from(status: StackStatus) -> Self {
        match status {
            StackStatus::Active => 1,
            StackStatus::Inactive => 2,
            StackStatus::Other(raw) => raw,
        }
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackStatus::Active => write!(f, "active"),
            StackStatus::Inactive => write!(f, "inactive"),
            StackStatus::Other(raw) => write!(f, "unknown ({raw})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One orchestration node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "Id")]
    pub id: EndpointId,
    #[serde(rename = "Name")]
    pub name: String,
}

/// One deployed application unit on an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    #[serde(rename = "Id")]
    pub id: StackId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "EndpointId")]
    pub endpoint_id: EndpointId,
    #[serde(rename = "Status", default)]
    pub status: StackStatus,
    /// Local project path on the platform host; empty or absent when unknown.
    #[serde(
        rename = "ProjectPath",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub project_path: Option<String>,
}

impl Stack {
    /// `true` when the platform reported a non-empty project path.
    pub fn has_project_path(&self) -> bool {
        self.project_path
            .as_deref()
            .map(|p| !p.is_empty())
            .unwrap_or(false)
    }
}

/// One published port mapping of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    #[serde(
        rename = "PublicPort",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub public_port: Option<u16>,
}

/// A container as listed on an endpoint. Display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    #[serde(rename = "Names", default)]
    pub names: Vec<String>,
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "Ports", default)]
    pub ports: Vec<Port>,
}

impl Container {
    /// First reported name without the leading `/` separator(s).
    pub fn display_name(&self) -> &str {
        self.names
            .first()
            .map(|n| n.trim_start_matches('/'))
            .unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.state == "running"
    }

    /// Publicly published ports, deduplicated and sorted as strings.
    pub fn published_ports(&self) -> Vec<String> {
        self.ports
            .iter()
            .filter_map(|p| p.public_port)
            .map(|p| p.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Stacks that belong to `endpoint`, in platform order.
pub fn stacks_for_endpoint<'a>(
    stacks: &'a [Stack],
    endpoint: &Endpoint,
) -> impl Iterator<Item = &'a Stack> + 'a {
    let id = endpoint.id;
    stacks.iter().filter(move |s| s.endpoint_id == id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
