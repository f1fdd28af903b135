//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate signals to internal events
//! - Trigger appropriate actions (shutdown, reload)
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP triggers config reload, not shutdown
//! - A reload goes through the same channel as file-watch reloads

use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::config::{load_config, SiteConfig};
use crate::lifecycle::shutdown::Shutdown;

/// Trigger `shutdown` on Ctrl+C or SIGTERM.
pub fn spawn_shutdown_listener(shutdown: Shutdown) {
    tokio::spawn(async move {
        terminate_signal().await;
        tracing::info!("Shutdown signal received");
        shutdown.trigger();
    });
}

async fn terminate_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Reload the config file on SIGHUP and push it into `updates`.
#[cfg(unix)]
pub fn spawn_reload_listener(path: PathBuf, updates: mpsc::UnboundedSender<SiteConfig>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(sighup) => sighup,
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGHUP");
                return;
            }
        };
        while sighup.recv().await.is_some() {
            tracing::info!(path = %path.display(), "SIGHUP received, reloading config");
            match load_config(&path) {
                Ok(config) => {
                    if updates.send(config).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::error!(error = %e, "Failed to reload config; keeping current site"),
            }
        }
    });
}

#[cfg(not(unix))]
pub fn spawn_reload_listener(_path: PathBuf, _updates: mpsc::UnboundedSender<SiteConfig>) {}
