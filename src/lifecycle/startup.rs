//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize subsystems in dependency order (logging, metrics, site)
//! - Start background tasks (config watcher, signal listeners)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener starts last (traffic only when the site is built)
//! - Reload failures after startup are logged, never fatal

use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use crate::config::watcher::ConfigWatcher;
use crate::config::{load_config, ConfigError, SiteConfig};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::observability::{logging, metrics};
use crate::site::{Site, SiteError, SiteHandle};

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("site: {0}")]
    Site(#[from] SiteError),

    #[error("bind address `{0}` is not a socket address")]
    InvalidBind(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config watcher: {0}")]
    Watch(#[from] notify::Error),
}

/// What the process was asked to do.
#[derive(Debug, Clone)]
pub struct StartupOptions {
    pub config_path: PathBuf,
    /// Overrides `listener.bind_address`.
    pub bind: Option<String>,
}

/// Load the configuration and apply command-line overrides.
pub fn load(options: &StartupOptions) -> Result<SiteConfig, StartupError> {
    let mut config = load_config(&options.config_path)?;
    if let Some(bind) = &options.bind {
        if bind.parse::<SocketAddr>().is_err() {
            return Err(StartupError::InvalidBind(bind.clone()));
        }
        config.listener.bind_address = bind.clone();
    }
    Ok(config)
}

/// Build the site once without serving it. Returns a one-line summary.
pub fn check(config: &SiteConfig) -> Result<String, StartupError> {
    let site = Site::from_config(config)?;
    Ok(format!(
        "site `{}`: {} routes, {} bindings, {} resource sources",
        config.site.base_path_key,
        site.table().len(),
        site.table().binding_count(),
        site.locator().origins().count(),
    ))
}

/// Start every subsystem and serve until a shutdown signal arrives.
pub async fn run(options: StartupOptions, config: SiteConfig) -> Result<(), StartupError> {
    logging::init_logging(&config.observability);
    tracing::info!(
        config = %options.config_path.display(),
        bind_address = %config.listener.bind_address,
        base_path_key = %config.site.base_path_key,
        live = config.site.live,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let site = SiteHandle::from_config(&config)?;

    let (watcher, updates) = ConfigWatcher::new(&options.config_path);
    signals::spawn_reload_listener(options.config_path.clone(), watcher.sender());
    let _watcher = watcher.run()?;
    tokio::spawn(site.clone().follow(updates));

    let shutdown = Shutdown::new();
    signals::spawn_shutdown_listener(shutdown.clone());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(site, &config);
    server.run(listener, async move { shutdown.wait().await }).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
