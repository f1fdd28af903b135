//! Site composition.
//!
//! # Data Flow
//! ```text
//! SiteConfig / SiteBuilder
//!     → RouteTable (debug route first when not live, then config routes,
//!       then routes bound in code)
//!     → ResourceLocator (registries, site, subsite, modules, framework)
//!     → Site
//!
//! Site::handle(RequestContext)
//!     → routing::Dispatcher (match, method check, invoke, render)
//!     → error_mapper::ErrorMapper on failure
//!     → Reply
//! ```
//!
//! # Design Decisions
//! - A Site is immutable; reload builds a new one and swaps it (handle.rs)
//! - No process-wide router: every request gets its own Dispatcher

pub mod handle;

use axum::http::StatusCode;
use std::time::Instant;

use crate::config::{RouteConfig, SiteConfig, SiteSettings};
use crate::error_mapper::{ErrorMapper, ErrorSettings};
use crate::http::response::Reply;
use crate::observability::metrics;
use crate::render::{CanvasVerdict, Registry, RenderPipeline, ResourceLocator};
use crate::routing::dispatcher::{DispatchDefaults, Dispatcher, RequestContext};
use crate::routing::methods::{parse_methods, MethodMask, UnknownMethod};
use crate::routing::pattern::PatternError;
use crate::routing::table::{handler, RouteTable, ANY_SCOPE};

pub use handle::SiteHandle;

/// Framework-internal route registered ahead of user routes outside live mode.
pub const DEBUG_ROUTE: &str = "__gimle/:id";
/// Raw canvas serving the debug route.
pub const DEBUG_CANVAS: &str = "__gimle";

/// Errors raised while assembling a site.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("route `{route}`: {source}")]
    Pattern {
        route: String,
        #[source]
        source: PatternError,
    },

    #[error("route `{route}`: {source}")]
    Method {
        route: String,
        #[source]
        source: UnknownMethod,
    },
}

/// A ready-to-serve site: routes, resources and error settings.
pub struct Site {
    table: RouteTable,
    locator: ResourceLocator,
    defaults: DispatchDefaults,
    errors: ErrorSettings,
}

impl Site {
    /// Build a site from configuration alone.
    pub fn from_config(config: &SiteConfig) -> Result<Self, SiteError> {
        let mut builder = SiteBuilder::from_config(config);
        builder.bind_config(&config.routes)?;
        Ok(builder.build())
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn locator(&self) -> &ResourceLocator {
        &self.locator
    }

    /// Serve one request. Never fails: errors become error pages.
    pub fn handle(&self, mut request: RequestContext) -> Reply {
        let start = Instant::now();
        let pipeline = RenderPipeline::new(&self.locator, &self.errors.content_marker);
        let mut dispatcher = Dispatcher::new(&self.table, pipeline, &self.defaults);

        let (reply, outcome) = match dispatcher.dispatch(&mut request) {
            Ok(dispatched) => {
                tracing::debug!(
                    request_id = ?request.request_id,
                    route = %dispatched.route,
                    status = dispatched.status.as_u16(),
                    "Request dispatched"
                );
                let reply = Reply::new(dispatched.status, dispatched.content_type, dispatched.body);
                (reply, "ok")
            }
            Err(error) => {
                let state = dispatcher.state();
                let reply = ErrorMapper::new(&self.locator, &self.errors).handle(&error, state, &request);
                let outcome = if state.was_forbidden() {
                    "forbidden"
                } else if error.is_not_found() && reply.status == StatusCode::OK {
                    "static"
                } else if error.is_not_found() {
                    "not_found"
                } else {
                    "error"
                };
                (reply, outcome)
            }
        };

        metrics::record_dispatch(outcome, reply.status.as_u16(), start);
        reply
    }
}

/// Assembles a [`Site`] from settings, modules, registries and routes.
pub struct SiteBuilder {
    settings: SiteSettings,
    table: RouteTable,
    locator: ResourceLocator,
}

impl SiteBuilder {
    /// Start from site settings. Directory sources come from the settings;
    /// the debug route is bound first unless the site is live.
    pub fn new(settings: SiteSettings) -> Self {
        let mut locator = ResourceLocator::new().site(&settings.root);
        if let Some(subsite) = &settings.subsite {
            locator = locator.subsite(subsite);
        }
        if let Some(framework) = &settings.framework_dir {
            locator = locator.framework(framework);
        }

        let mut table = RouteTable::new(settings.base_path_key.clone());
        if !settings.live {
            bind_debug_route(&mut table);
        }

        Self {
            settings,
            table,
            locator,
        }
    }

    /// Start from a full configuration, including its modules (not its routes).
    pub fn from_config(config: &SiteConfig) -> Self {
        config
            .modules
            .iter()
            .fold(Self::new(config.site.clone()), |builder, module| {
                builder.module(&module.name, &module.path)
            })
    }

    pub fn module(mut self, name: &str, dir: &str) -> Self {
        self.locator = self.locator.module(name, dir);
        self
    }

    /// Add templates and canvases defined in code. They shadow every directory.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.locator = self.locator.registry(registry);
        self
    }

    /// Route table for binding handlers in code.
    pub fn routes(&mut self) -> &mut RouteTable {
        &mut self.table
    }

    /// Bind declarative routes from configuration, in order.
    pub fn bind_config(&mut self, routes: &[RouteConfig]) -> Result<(), SiteError> {
        for route in routes {
            let methods = parse_methods(&route.methods).map_err(|source| SiteError::Method {
                route: route.path.clone(),
                source,
            })?;
            let bound = self
                .table
                .bind(
                    &route.scope,
                    &route.path,
                    Some(config_handler(route, self.settings.default_parse)),
                    &route.conditions,
                    methods,
                )
                .map_err(|source| SiteError::Pattern {
                    route: route.path.clone(),
                    source,
                })?;
            if !bound {
                tracing::debug!(route = %route.path, scope = %route.scope, "Config route not active for this site");
            }
        }
        Ok(())
    }

    pub fn build(self) -> Site {
        let mut builtin = Registry::new();
        builtin.canvas(DEBUG_CANVAS, |ctx, out| {
            let dump = serde_json::json!({
                "id": ctx.param("id"),
                "method": ctx.method.as_str(),
                "path": ctx.path,
                "params": ctx.params,
                "query": ctx.query,
            });
            out.push_str(&dump.to_string());
            CanvasVerdict::Accept
        });

        let defaults = DispatchDefaults {
            canvas: self.settings.default_canvas.clone(),
            parse: self.settings.default_parse,
            content_type: self.settings.default_content_type.clone(),
        };
        let errors = ErrorSettings {
            live: self.settings.live,
            error_canvas: self.settings.error_canvas.clone(),
            signin_canvas: self.settings.signin_canvas.clone(),
            content_marker: self.settings.content_marker.clone(),
        };

        tracing::info!(
            base_path_key = %self.settings.base_path_key,
            live = self.settings.live,
            routes = self.table.len(),
            bindings = self.table.binding_count(),
            "Site built"
        );

        Site {
            table: self.table,
            locator: self.locator.registry(builtin),
            defaults,
            errors,
        }
    }
}

fn bind_debug_route(table: &mut RouteTable) {
    let debug = handler(|s| {
        s.set_canvas(DEBUG_CANVAS, false);
        s.set_content_type("application/json");
    });
    // The template is fixed and known to compile.
    if let Err(e) = table.bind(ANY_SCOPE, DEBUG_ROUTE, Some(debug), &Default::default(), MethodMask::GET) {
        tracing::error!(error = %e, "Debug route failed to compile");
    }
}

fn config_handler(route: &RouteConfig, default_parse: bool) -> crate::routing::table::Handler {
    let canvas = route.canvas.clone();
    let parse = route.parse;
    let template = route.template.clone();
    let content_type = route.content_type.clone();
    let status = route.status.and_then(|s| StatusCode::from_u16(s).ok());

    handler(move |s| {
        match (&canvas, parse) {
            (Some(canvas), parse) => s.set_canvas(canvas.clone(), parse.unwrap_or(default_parse)),
            (None, Some(parse)) => {
                if let Some(current) = s.canvas().map(str::to_string) {
                    s.set_canvas(current, parse);
                }
            }
            (None, None) => {}
        }
        if let Some(template) = &template {
            s.set_template(template.clone());
        }
        if let Some(content_type) = &content_type {
            s.set_content_type(content_type.clone());
        }
        if let Some(status) = status {
            s.set_status(status);
        }
    })
}
