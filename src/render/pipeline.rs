//! Two-stage render pipeline.
//!
//! # Data Flow
//! ```text
//! parse = true:
//!     template → buffer (must accept)
//!     → canvas → shell buffer (must accept)
//!     → shell with marker replaced by template buffer
//!
//! parse = false:
//!     canvas → buffer (must accept), used as-is
//! ```
//!
//! # Design Decisions
//! - Every stage writes into its own buffer; nothing is emitted until both
//!   stages accept, so a failed attempt leaves no partial output
//! - A rejected template is retryable, a failing canvas is not

use crate::render::locator::ResourceLocator;
use crate::render::resource::{CanvasVerdict, RenderContext, Verdict};
use crate::routing::error::DispatchError;

/// Default marker replaced by template output inside a canvas shell.
pub const DEFAULT_CONTENT_MARKER: &str = "%content%";

/// Runs the template and canvas stages for one attempt.
#[derive(Debug, Clone, Copy)]
pub struct RenderPipeline<'a> {
    locator: &'a ResourceLocator,
    content_marker: &'a str,
}

impl<'a> RenderPipeline<'a> {
    pub fn new(locator: &'a ResourceLocator, content_marker: &'a str) -> Self {
        Self {
            locator,
            content_marker,
        }
    }

    /// Render the selected canvas (and template, when parsing) into a body.
    pub fn render(
        &self,
        canvas: Option<&str>,
        template: Option<&str>,
        parse: bool,
        ctx: &RenderContext<'_>,
    ) -> Result<String, DispatchError> {
        let canvas = canvas.ok_or(DispatchError::CanvasNotSet)?;

        if !parse {
            if let Some(template) = template {
                tracing::debug!(canvas, template, "Raw canvas ignores selected template");
            }
            return self.open_canvas(canvas, ctx);
        }

        let content = match template {
            Some(name) => self.render_template(name, ctx)?,
            None => String::new(),
        };

        let shell = self.open_canvas(canvas, ctx)?;
        Ok(shell.replace(self.content_marker, &content))
    }

    /// Render only the template stage.
    pub fn render_template(&self, name: &str, ctx: &RenderContext<'_>) -> Result<String, DispatchError> {
        let template = self
            .locator
            .template(name)
            .map_err(|source| DispatchError::Io {
                resource: format!("template `{name}`"),
                source,
            })?
            .ok_or_else(|| DispatchError::TemplateNotFound(name.to_string()))?;

        let mut buffer = String::new();
        match template.render(ctx, &mut buffer) {
            Verdict::Accept => Ok(buffer),
            Verdict::Reject(returned) => {
                tracing::debug!(template = name, %returned, "Template rejected the request");
                Err(DispatchError::TemplateReturnInvalid {
                    name: name.to_string(),
                    returned,
                })
            }
        }
    }

    fn open_canvas(&self, name: &str, ctx: &RenderContext<'_>) -> Result<String, DispatchError> {
        let canvas = self
            .locator
            .canvas(name)
            .map_err(|source| DispatchError::Io {
                resource: format!("canvas `{name}`"),
                source,
            })?
            .ok_or_else(|| DispatchError::CanvasNotFound(name.to_string()))?;

        let mut shell = String::new();
        match canvas.open(ctx, &mut shell) {
            CanvasVerdict::Accept => Ok(shell),
            CanvasVerdict::Raise { message, code } => Err(DispatchError::CanvasRaised {
                name: name.to_string(),
                message,
                code,
            }),
            CanvasVerdict::Reject(returned) => Err(DispatchError::CanvasReturnInvalid {
                name: name.to_string(),
                returned,
            }),
        }
    }
}
