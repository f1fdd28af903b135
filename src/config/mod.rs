//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, resolve relative dirs)
//!     → validation.rs (semantic checks)
//!     → SiteConfig (validated, immutable)
//!     → site::Site::from_config (route table + resource locator)
//!
//! On reload (file change or SIGHUP):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the running Site
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ListenerConfig, ModuleConfig, ObservabilityConfig, RouteConfig, SecurityConfig, SiteConfig,
    SiteSettings, TimeoutConfig,
};
pub use validation::ValidationError;
