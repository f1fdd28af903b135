//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every route template and condition compiles
//! - Check method names and status codes
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SiteConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::StatusCode;

use crate::config::schema::SiteConfig;
use crate::routing::methods::parse_methods;
use crate::routing::pattern::CompiledPattern;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("site.base_path_key must not be empty")]
    EmptyBasePathKey,

    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("module `{0}` is declared twice")]
    DuplicateModule(String),

    #[error("module name `{0}` must be a single path segment")]
    InvalidModuleName(String),

    #[error("route `{route}`: {message}")]
    InvalidPattern { route: String, message: String },

    #[error("route `{route}`: {message}")]
    InvalidMethod { route: String, message: String },

    #[error("route `{route}`: status {status} is not a valid HTTP status")]
    InvalidStatus { route: String, status: u16 },

    #[error("route `{route}`: methods must not be empty")]
    NoMethods { route: String },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &SiteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.site.base_path_key.trim().is_empty() {
        errors.push(ValidationError::EmptyBasePathKey);
    }
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let mut modules = HashSet::new();
    for module in &config.modules {
        if module.name.is_empty() || module.name.contains(['/', '\\']) || module.name == ".." {
            errors.push(ValidationError::InvalidModuleName(module.name.clone()));
        }
        if !modules.insert(module.name.as_str()) {
            errors.push(ValidationError::DuplicateModule(module.name.clone()));
        }
    }

    for route in &config.routes {
        if let Err(e) = CompiledPattern::compile(route.path.trim_start_matches('/'), &route.conditions) {
            errors.push(ValidationError::InvalidPattern {
                route: route.path.clone(),
                message: e.to_string(),
            });
        }
        if route.methods.is_empty() {
            errors.push(ValidationError::NoMethods {
                route: route.path.clone(),
            });
        } else if let Err(e) = parse_methods(&route.methods) {
            errors.push(ValidationError::InvalidMethod {
                route: route.path.clone(),
                message: e.to_string(),
            });
        }
        if let Some(status) = route.status {
            if StatusCode::from_u16(status).is_err() {
                errors.push(ValidationError::InvalidStatus {
                    route: route.path.clone(),
                    status,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
