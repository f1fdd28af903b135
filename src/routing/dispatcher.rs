//! Request dispatch with backtracking.
//!
//! # State Machine
//! ```text
//! Matching ──▶ MethodCheck ──▶ Invoking ──▶ Rendering ──▶ Done
//!    ▲              │                           │
//!    └── pop top ───┘                           │
//!    └──────── pop top, record trial ───────────┘
//! any state ──▶ Error
//! ```
//!
//! # Design Decisions
//! - The route table is shared and never mutated; each request tracks how
//!   many bindings of every route are still live
//! - Iterative loop: every pass either returns or retires one binding, so the
//!   number of passes is bounded by the table's binding count
//! - First matching pattern in registration order wins

use axum::http::{Method, StatusCode};
use serde::Serialize;
use std::collections::HashMap;

use crate::observability::metrics;
use crate::render::{RenderContext, RenderPipeline, Sentinel};
use crate::routing::error::DispatchError;
use crate::routing::table::{normalize, RouteTable};

/// Content type used when a handler does not pick one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Per-request input to the dispatcher.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Request path without its leading slash.
    pub path: String,
    pub query: HashMap<String, String>,
    /// Parameters captured by the most recent match.
    pub params: HashMap<String, String>,
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: normalize(path).to_string(),
            query: HashMap::new(),
            params: HashMap::new(),
            request_id: None,
        }
    }

    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    fn render_context(&self) -> RenderContext<'_> {
        RenderContext {
            method: &self.method,
            path: &self.path,
            params: &self.params,
            query: &self.query,
        }
    }
}

/// Selection applied before every handler runs.
#[derive(Debug, Clone)]
pub struct DispatchDefaults {
    pub canvas: Option<String>,
    pub parse: bool,
    pub content_type: String,
}

impl Default for DispatchDefaults {
    fn default() -> Self {
        Self {
            canvas: None,
            parse: true,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

/// A failed render attempt, kept for diagnostics and the sign-in check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialRecord {
    pub route: String,
    pub canvas: Option<String>,
    pub template: Option<String>,
    pub returned: Sentinel,
}

/// Mutable dispatch state for one request.
#[derive(Debug, Clone)]
pub struct DispatchState {
    pub canvas_name: Option<String>,
    pub parse_canvas: bool,
    pub template_name: Option<String>,
    pub content_type: String,
    pub status: StatusCode,
    pub tried_attempts: Vec<TrialRecord>,
}

impl DispatchState {
    pub fn new(defaults: &DispatchDefaults) -> Self {
        Self {
            canvas_name: defaults.canvas.clone(),
            parse_canvas: defaults.parse,
            template_name: None,
            content_type: defaults.content_type.clone(),
            status: StatusCode::OK,
            tried_attempts: Vec::new(),
        }
    }

    /// Reset the selection for a new attempt. Trial history is kept.
    fn reset(&mut self, defaults: &DispatchDefaults) {
        self.canvas_name = defaults.canvas.clone();
        self.parse_canvas = defaults.parse;
        self.template_name = None;
        self.content_type = defaults.content_type.clone();
        self.status = StatusCode::OK;
    }

    /// Whether any attempt was turned away as forbidden.
    pub fn was_forbidden(&self) -> bool {
        self.tried_attempts.iter().any(|t| t.returned.is_forbidden())
    }
}

/// Handle given to a binding's handler.
pub struct Selection<'a> {
    state: &'a mut DispatchState,
    request: &'a RequestContext,
}

impl<'a> Selection<'a> {
    pub fn new(state: &'a mut DispatchState, request: &'a RequestContext) -> Self {
        Self { state, request }
    }

    /// Choose the canvas; `parse = false` makes its output the whole response.
    pub fn set_canvas(&mut self, name: impl Into<String>, parse: bool) {
        self.state.canvas_name = Some(name.into());
        self.state.parse_canvas = parse;
    }

    pub fn set_template(&mut self, name: impl Into<String>) {
        self.state.template_name = Some(name.into());
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.state.content_type = content_type.into();
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.state.status = status;
    }

    pub fn canvas(&self) -> Option<&str> {
        self.state.canvas_name.as_deref()
    }

    pub fn template(&self) -> Option<&str> {
        self.state.template_name.as_deref()
    }

    pub fn method(&self) -> &Method {
        &self.request.method
    }

    pub fn path(&self) -> &str {
        &self.request.path
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.request.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.params.get(name).map(String::as_str)
    }

    pub fn query(&self) -> &HashMap<String, String> {
        &self.request.query
    }
}

/// Successful dispatch output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub route: String,
    pub status: StatusCode,
    pub content_type: String,
    pub body: String,
}

/// Resolves one request against a route table.
pub struct Dispatcher<'a> {
    table: &'a RouteTable,
    pipeline: RenderPipeline<'a>,
    defaults: &'a DispatchDefaults,
    state: DispatchState,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        table: &'a RouteTable,
        pipeline: RenderPipeline<'a>,
        defaults: &'a DispatchDefaults,
    ) -> Self {
        Self {
            table,
            pipeline,
            defaults,
            state: DispatchState::new(defaults),
        }
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    /// Run the dispatch loop for `request`.
    pub fn dispatch(&mut self, request: &mut RequestContext) -> Result<Dispatched, DispatchError> {
        let routes = self.table.routes();
        let mut live: Vec<usize> = routes.iter().map(|r| r.bindings().len()).collect();

        loop {
            // Matching
            let found = routes
                .iter()
                .enumerate()
                .filter(|(index, _)| live[*index] > 0)
                .find_map(|(index, route)| {
                    route.pattern().matches(&request.path).map(|params| (index, params))
                });

            let Some((index, params)) = found else {
                return Err(self.unmatched(request));
            };
            let route = &routes[index];
            let template = route.pattern().template();
            request.params = params;

            // MethodCheck
            let height = live[index];
            let binding = &route.bindings()[height - 1];
            if !binding.methods().allows(&request.method) {
                if height > 1 {
                    tracing::trace!(route = template, allowed = %binding.methods(), "Method mismatch, trying older binding");
                    live[index] -= 1;
                    continue;
                }
                if !self.state.tried_attempts.is_empty() {
                    return Err(self.exhausted(request));
                }
                return Err(DispatchError::MethodNotFound {
                    route: template.to_string(),
                    method: request.method.to_string(),
                });
            }

            // Invoking
            self.state.reset(self.defaults);
            binding.invoke(&mut Selection::new(&mut self.state, request));
            tracing::debug!(
                route = template,
                canvas = ?self.state.canvas_name,
                template = ?self.state.template_name,
                attempt = self.state.tried_attempts.len() + 1,
                "Binding selected"
            );

            // Rendering
            let rendered = self.pipeline.render(
                self.state.canvas_name.as_deref(),
                self.state.template_name.as_deref(),
                self.state.parse_canvas,
                &request.render_context(),
            );

            match rendered {
                Ok(body) => {
                    return Ok(Dispatched {
                        route: template.to_string(),
                        status: self.state.status,
                        content_type: self.state.content_type.clone(),
                        body,
                    });
                }
                Err(DispatchError::TemplateReturnInvalid { returned, .. }) => {
                    self.state.tried_attempts.push(TrialRecord {
                        route: template.to_string(),
                        canvas: self.state.canvas_name.clone(),
                        template: self.state.template_name.clone(),
                        returned,
                    });
                    metrics::record_retry();
                    live[index] -= 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn unmatched(&self, request: &RequestContext) -> DispatchError {
        if self.state.tried_attempts.is_empty() {
            DispatchError::RouteNotFound {
                path: request.path.clone(),
            }
        } else {
            self.exhausted(request)
        }
    }

    fn exhausted(&self, request: &RequestContext) -> DispatchError {
        DispatchError::RoutesExhausted {
            path: request.path.clone(),
            attempts: self.state.tried_attempts.len(),
        }
    }
}
