//! Canvas router library
//!
//! Route table, backtracking dispatcher, render pipeline and error mapping for
//! sites assembled from templates and canvases.

// Core subsystems
pub mod config;
pub mod http;
pub mod render;
pub mod routing;
pub mod site;

// Failure handling
pub mod error_mapper;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::SiteConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use site::{Site, SiteBuilder, SiteError, SiteHandle};
