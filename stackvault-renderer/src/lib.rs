//! # stackvault-renderer
//!
//! Tera templates for the two documents stackvault produces: the backup
//! repository's `README.md` and the HTML status page.
//!
//! ```rust,no_run
//! use stackvault_renderer::{ReadmeContext, Renderer};
//! use stackvault_core::ReadmeConfig;
//!
//! fn empty_readme() -> Option<String> {
//!     let renderer = Renderer::new().ok()?;
//!     let ctx = ReadmeContext::new(&ReadmeConfig::default(), "01/01/2025", vec![]);
//!     renderer.render_readme(&ctx).ok()
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{
    ContainerRow, EndpointView, NodeCtx, ReadmeContext, StackView, StatusPageContext,
};
pub use engine::Renderer;
pub use error::RenderError;
