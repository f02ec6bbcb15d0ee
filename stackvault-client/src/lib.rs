//! # stackvault-client
//!
//! Blocking client for the orchestration platform's HTTP API.
//!
//! [`Orchestrator`] is the seam the sync pipeline depends on;
//! [`PortainerClient`] is the `ureq` implementation used in production.

pub mod client;
pub mod error;

pub use client::{Orchestrator, PortainerClient, Token};
pub use error::ClientError;
