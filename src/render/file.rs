//! File-backed templates and canvases.
//!
//! Files are read once when resolved. Rendering replaces `{{key}}` with the
//! HTML-escaped request value of that name; `{{method}}` and `{{path}}` are
//! always available. Unknown keys are left as written.

use crate::render::resource::{Canvas, CanvasVerdict, RenderContext, Template, Verdict};

/// A template read from `<root>/template/<name>.html`.
#[derive(Debug, Clone)]
pub struct FileTemplate {
    source: String,
}

impl FileTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl Template for FileTemplate {
    fn render(&self, ctx: &RenderContext<'_>, out: &mut String) -> Verdict {
        substitute_into(&self.source, ctx, out);
        Verdict::Accept
    }
}

/// A canvas read from `<root>/canvas/<name>.html`.
#[derive(Debug, Clone)]
pub struct FileCanvas {
    source: String,
}

impl FileCanvas {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl Canvas for FileCanvas {
    fn open(&self, ctx: &RenderContext<'_>, out: &mut String) -> CanvasVerdict {
        substitute_into(&self.source, ctx, out);
        CanvasVerdict::Accept
    }
}

/// Expand `{{key}}` placeholders in `source` into `out`.
pub fn substitute_into(source: &str, ctx: &RenderContext<'_>, out: &mut String) {
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return;
        };

        let key = after[..end].trim();
        let value = match key {
            "method" => Some(ctx.method.as_str()),
            "path" => Some(ctx.path),
            _ => ctx.param(key),
        };
        match value {
            Some(value) => out.push_str(&escape(value)),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
}

fn escape(value: &str) -> String {
    maud::html! { (value) }.into_string()
}
