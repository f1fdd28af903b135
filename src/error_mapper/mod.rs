//! Error mapping subsystem.
//!
//! # Data Flow
//! ```text
//! DispatchError + DispatchState + RequestContext
//!     → forbidden attempt recorded?  → sign-in canvas (HTML) / bare 403
//!     → route not found / exhausted? → static_files.rs, else 404
//!     → anything else                → 500
//!     → error/<status> template in the error canvas, else pages.rs
//! ```
//!
//! # Design Decisions
//! - Internal errors never reach the client verbatim in live mode
//! - Diagnostics (context.rs) are always logged, shown only outside live mode
//! - Body format follows the content type the handler selected

pub mod context;
pub mod pages;
pub mod static_files;

use axum::http::StatusCode;
use std::collections::HashMap;

use crate::http::response::Reply;
use crate::observability::metrics;
use crate::render::{RenderContext, RenderPipeline, ResourceLocator};
use crate::routing::dispatcher::{DispatchState, RequestContext};
use crate::routing::error::DispatchError;

pub use context::ErrorContext;

const HTML: &str = "text/html; charset=utf-8";

/// Error page settings taken from the site configuration.
#[derive(Debug, Clone)]
pub struct ErrorSettings {
    pub live: bool,
    pub error_canvas: String,
    pub signin_canvas: String,
    pub content_marker: String,
}

/// Turns a failed dispatch into the response the client sees.
pub struct ErrorMapper<'a> {
    locator: &'a ResourceLocator,
    settings: &'a ErrorSettings,
}

impl<'a> ErrorMapper<'a> {
    pub fn new(locator: &'a ResourceLocator, settings: &'a ErrorSettings) -> Self {
        Self { locator, settings }
    }

    pub fn handle(&self, error: &DispatchError, state: &DispatchState, request: &RequestContext) -> Reply {
        let context = ErrorContext::new(error, state, request);
        let html = is_html(&state.content_type);

        if state.was_forbidden() {
            tracing::info!(
                path = %context.url,
                request_id = ?context.request_id,
                attempts = context.tried.len(),
                "Request refused as forbidden"
            );
            return if html {
                self.signin(request)
            } else {
                Reply::empty(StatusCode::FORBIDDEN)
            };
        }

        let status = if error.is_not_found() {
            if let Some(reply) = static_files::serve(self.locator, &request.path) {
                metrics::record_static_fallback();
                return reply;
            }
            tracing::warn!(
                code = context.code,
                path = %context.url,
                method = %context.method,
                request_id = ?context.request_id,
                attempts = context.tried.len(),
                error = %error,
                "Not found"
            );
            StatusCode::NOT_FOUND
        } else {
            tracing::error!(
                code = context.code,
                path = %context.url,
                method = %context.method,
                request_id = ?context.request_id,
                canvas = ?context.canvas,
                template = ?context.template,
                attempts = context.tried.len(),
                error = %error,
                "Dispatch failed"
            );
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if html {
            self.html_error(status, &context, request)
        } else if is_json(&state.content_type) {
            self.json_error(status, &context)
        } else {
            Reply::new(
                status,
                "text/plain; charset=utf-8",
                status.canonical_reason().unwrap_or("Error"),
            )
        }
    }

    fn html_error(&self, status: StatusCode, context: &ErrorContext, request: &RequestContext) -> Reply {
        let mut params = HashMap::new();
        params.insert("status".to_string(), status.as_u16().to_string());
        params.insert("code".to_string(), context.code.to_string());
        if !self.settings.live {
            params.insert("message".to_string(), context.message.clone());
        }
        let ctx = RenderContext {
            method: &request.method,
            path: &request.path,
            params: &params,
            query: &request.query,
        };

        let template = format!("error/{}", status.as_u16());
        let pipeline = RenderPipeline::new(self.locator, &self.settings.content_marker);
        match pipeline.render(Some(&self.settings.error_canvas), Some(&template), true, &ctx) {
            Ok(body) => Reply::new(status, HTML, body),
            Err(e) => {
                tracing::debug!(template = %template, error = %e, "Using built-in error page");
                let diagnostics = (!self.settings.live).then_some(context);
                Reply::new(status, HTML, pages::error_page(status, diagnostics).into_string())
            }
        }
    }

    fn json_error(&self, status: StatusCode, context: &ErrorContext) -> Reply {
        let mut error = serde_json::json!({
            "status": status.as_u16(),
            "code": context.code,
        });
        if !self.settings.live {
            error["message"] = serde_json::Value::String(context.message.clone());
            error["context"] = serde_json::to_value(context).unwrap_or_default();
        }
        let body = serde_json::json!({ "error": error }).to_string();
        Reply::new(status, "application/json", body)
    }

    fn signin(&self, request: &RequestContext) -> Reply {
        let empty = HashMap::new();
        let ctx = RenderContext {
            method: &request.method,
            path: &request.path,
            params: &empty,
            query: &request.query,
        };
        let pipeline = RenderPipeline::new(self.locator, &self.settings.content_marker);
        let body = match pipeline.render(Some(&self.settings.signin_canvas), None, false, &ctx) {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(canvas = %self.settings.signin_canvas, error = %e, "Using built-in sign-in page");
                pages::signin_page().into_string()
            }
        };
        Reply::new(StatusCode::FORBIDDEN, HTML, body)
    }
}

fn is_html(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("text/html")
}

fn is_json(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.starts_with("application/json") || ct.contains("+json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CanvasVerdict, Registry, Sentinel, Verdict, DEFAULT_CONTENT_MARKER};
    use crate::routing::dispatcher::{DispatchDefaults, TrialRecord};
    use axum::http::Method;

    fn settings(live: bool) -> ErrorSettings {
        ErrorSettings {
            live,
            error_canvas: "error".into(),
            signin_canvas: "signin".into(),
            content_marker: DEFAULT_CONTENT_MARKER.into(),
        }
    }

    fn not_found(request: &RequestContext) -> DispatchError {
        DispatchError::RouteNotFound {
            path: request.path.clone(),
        }
    }

    fn forbidden_state(content_type: &str) -> DispatchState {
        let mut state = DispatchState::new(&DispatchDefaults::default());
        state.content_type = content_type.to_string();
        state.tried_attempts.push(TrialRecord {
            route: "admin".into(),
            canvas: Some("page".into()),
            template: Some("admin".into()),
            returned: Sentinel::Forbidden,
        });
        state
    }

    #[test]
    fn test_site_error_template_is_used() {
        let mut registry = Registry::new();
        registry
            .canvas("error", |_, out| {
                out.push_str("<main>%content%</main>");
                CanvasVerdict::Accept
            })
            .template("error/404", |ctx, out| {
                out.push_str("lost: ");
                out.push_str(ctx.param("status").unwrap_or("?"));
                Verdict::Accept
            });
        let locator = ResourceLocator::new().registry(registry);
        let settings = settings(true);
        let mapper = ErrorMapper::new(&locator, &settings);

        let request = RequestContext::new(Method::GET, "/missing");
        let state = DispatchState::new(&DispatchDefaults::default());
        let reply = mapper.handle(&not_found(&request), &state, &request);

        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.text(), "<main>lost: 404</main>");
    }

    #[test]
    fn test_builtin_page_hides_diagnostics_when_live() {
        let locator = ResourceLocator::new();
        let request = RequestContext::new(Method::GET, "/missing");
        let state = DispatchState::new(&DispatchDefaults::default());

        let live = settings(true);
        let reply = ErrorMapper::new(&locator, &live).handle(&not_found(&request), &state, &request);
        assert!(!reply.text().contains("no route matches"));

        let dev = settings(false);
        let reply = ErrorMapper::new(&locator, &dev).handle(&not_found(&request), &state, &request);
        assert!(reply.text().contains("no route matches"));
    }

    #[test]
    fn test_other_errors_are_500() {
        let locator = ResourceLocator::new();
        let settings = settings(true);
        let request = RequestContext::new(Method::GET, "/x");
        let state = DispatchState::new(&DispatchDefaults::default());

        let reply = ErrorMapper::new(&locator, &settings).handle(&DispatchError::CanvasNotSet, &state, &request);
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.content_type.as_deref(), Some(HTML));
    }

    #[test]
    fn test_json_error_body() {
        let locator = ResourceLocator::new();
        let settings = settings(false);
        let request = RequestContext::new(Method::GET, "/api/missing");
        let mut state = DispatchState::new(&DispatchDefaults::default());
        state.content_type = "application/json".into();

        let reply = ErrorMapper::new(&locator, &settings).handle(&not_found(&request), &state, &request);
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
        assert_eq!(body["error"]["code"], 1);
        assert_eq!(body["error"]["context"]["url"], "/api/missing");
    }

    #[test]
    fn test_forbidden_html_renders_signin_canvas() {
        let mut registry = Registry::new();
        registry.canvas("signin", |_, out| {
            out.push_str("<form>login</form>");
            CanvasVerdict::Accept
        });
        let locator = ResourceLocator::new().registry(registry);
        let settings = settings(true);
        let request = RequestContext::new(Method::GET, "/admin");
        let error = DispatchError::RoutesExhausted {
            path: "admin".into(),
            attempts: 1,
        };

        let reply = ErrorMapper::new(&locator, &settings).handle(&error, &forbidden_state(HTML), &request);
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
        assert_eq!(reply.text(), "<form>login</form>");
    }

    #[test]
    fn test_forbidden_non_html_is_bare_403() {
        let locator = ResourceLocator::new();
        let settings = settings(true);
        let request = RequestContext::new(Method::GET, "/admin.json");
        let error = DispatchError::RoutesExhausted {
            path: "admin.json".into(),
            attempts: 1,
        };

        let reply = ErrorMapper::new(&locator, &settings)
            .handle(&error, &forbidden_state("application/json"), &request);
        assert_eq!(reply, Reply::empty(StatusCode::FORBIDDEN));
    }
}
