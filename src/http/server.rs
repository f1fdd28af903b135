//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a catch-all handler into the site
//! - Wire up middleware (tracing, limits, timeout, request ID)
//! - Bind server to listener and shut down gracefully
//! - Run the synchronous dispatcher off the async workers

use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::SiteConfig;
use crate::http::request::{request_context, MakeRequestUuid, X_REQUEST_ID};
use crate::site::SiteHandle;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub site: SiteHandle,
}

/// HTTP server for a site.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server serving `site`.
    pub fn new(site: SiteHandle, config: &SiteConfig) -> Self {
        let router = Self::build_router(config, AppState { site });
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &SiteConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .route("/{*path}", any(site_handler))
            .route("/", any(site_handler))
            .with_state(state)
            .layer(middleware)
    }

    /// The router with all layers, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: dispatch the request through the current site.
async fn site_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let request = match request_context(method, &uri, query, &headers) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Refusing request");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    tracing::debug!(
        request_id = ?request.request_id,
        method = %request.method,
        path = %request.path,
        "Dispatching request"
    );

    let site = state.site.load();
    match tokio::task::spawn_blocking(move || site.handle(request)).await {
        Ok(reply) => reply.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Dispatch task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
