//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a site.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::render::DEFAULT_CONTENT_MARKER;
use crate::routing::dispatcher::DEFAULT_CONTENT_TYPE;
use crate::routing::table::ANY_SCOPE;

/// Root configuration for a site.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SiteConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Site identity, resource directories and render defaults.
    pub site: SiteSettings,

    /// Installed modules, searched in order after the site.
    pub modules: Vec<ModuleConfig>,

    /// Declarative route bindings, registered in order.
    pub routes: Vec<RouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Site identity and rendering defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteSettings {
    /// Key selecting which scoped route bindings are active.
    pub base_path_key: String,

    /// Live sites hide diagnostics and skip the debug route.
    pub live: bool,

    /// Site directory (highest priority on disk).
    pub root: String,

    /// Subsite-of-main-site directory, searched after the site.
    pub subsite: Option<String>,

    /// Framework default module directory, searched last.
    pub framework_dir: Option<String>,

    /// Canvas selected before every handler runs.
    pub default_canvas: Option<String>,

    /// Whether the default canvas wraps a template.
    pub default_parse: bool,

    /// Content type used unless a handler picks another.
    pub default_content_type: String,

    /// Marker in a canvas shell replaced by template output.
    pub content_marker: String,

    /// Canvas wrapping `error/<status>` templates.
    pub error_canvas: String,

    /// Raw canvas shown when a page is refused as forbidden.
    pub signin_canvas: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            base_path_key: "main".to_string(),
            live: false,
            root: "site".to_string(),
            subsite: None,
            framework_dir: None,
            default_canvas: Some("html".to_string()),
            default_parse: true,
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            content_marker: DEFAULT_CONTENT_MARKER.to_string(),
            error_canvas: "error".to_string(),
            signin_canvas: "signin".to_string(),
        }
    }
}

/// An installed module.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModuleConfig {
    /// Module name, as used in `module/<name>/public/...` asset paths.
    pub name: String,

    /// Module directory.
    pub path: String,
}

/// A route binding declared in config.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Scope key: `*`, a base path key, or `a|b`.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Path template (`user/:id`, `files/:path+`, `post(/:id)`).
    pub path: String,

    /// Accepted methods (default: GET).
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,

    /// Per-parameter regex conditions.
    #[serde(default)]
    pub conditions: HashMap<String, String>,

    /// Canvas to select; the site default when absent.
    #[serde(default)]
    pub canvas: Option<String>,

    /// Whether the canvas wraps the template (default: site default).
    #[serde(default)]
    pub parse: Option<bool>,

    /// Template to render inside the canvas.
    #[serde(default)]
    pub template: Option<String>,

    /// Response content type override.
    #[serde(default)]
    pub content_type: Option<String>,

    /// Response status override.
    #[serde(default)]
    pub status: Option<u16>,
}

fn default_scope() -> String {
    ANY_SCOPE.to_string()
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string()]
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
