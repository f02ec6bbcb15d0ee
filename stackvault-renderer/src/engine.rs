//! Tera rendering engine.
//!
//! | Template      | Output                                  | Autoescape |
//! |---------------|-----------------------------------------|------------|
//! | `readme.md`   | `README.md` at the backup repo root     | no         |
//! | `status.html` | `GET /` status page                     | yes        |
//! | `error.html`  | error page for failed page loads/syncs  | yes        |

use tera::Tera;

use crate::context::{ReadmeContext, StatusPageContext};
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates, baked into the binary via include_str!
// ---------------------------------------------------------------------------

const README_TEMPLATE: &str = "readme.md";
const STATUS_TEMPLATE: &str = "status.html";
const ERROR_TEMPLATE: &str = "error.html";

const TPLS: &[(&str, &str)] = &[
    (README_TEMPLATE, include_str!("templates/readme.md.tera")),
    (STATUS_TEMPLATE, include_str!("templates/status.html.tera")),
    (ERROR_TEMPLATE, include_str!("templates/error.html.tera")),
];

fn build_tera() -> Result<Tera, RenderError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TPLS.iter().copied())?;
    Ok(tera)
}

fn normalize_line_endings(content: String) -> String {
    if content.contains('\r') {
        content.replace("\r\n", "\n")
    } else {
        content
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renderer over the embedded templates. Create once with [`Renderer::new`]
/// and share; rendering takes `&self`.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        Ok(Renderer {
            tera: build_tera()?,
        })
    }

    /// Full `README.md` content.
    pub fn render_readme(&self, ctx: &ReadmeContext) -> Result<String, RenderError> {
        let content = self.tera.render(README_TEMPLATE, &ctx.to_tera_context()?)?;
        Ok(normalize_line_endings(content))
    }

    pub fn render_status_page(&self, ctx: &StatusPageContext) -> Result<String, RenderError> {
        Ok(self.tera.render(STATUS_TEMPLATE, &ctx.to_tera_context()?)?)
    }

    pub fn render_error_page(&self, heading: &str, message: &str) -> Result<String, RenderError> {
        let mut ctx = tera::Context::new();
        ctx.insert("heading", heading);
        ctx.insert("message", message);
        Ok(self.tera.render(ERROR_TEMPLATE, &ctx)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
