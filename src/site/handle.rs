//! Hot-swappable site handle.
//!
//! # Responsibilities
//! - Hold the current [`Site`] behind an `ArcSwap`
//! - Rebuild the site from a new configuration and swap it in
//! - Keep serving the previous site when a rebuild fails
//!
//! # Design Decisions
//! - In-flight requests keep the `Arc<Site>` they loaded; swaps never block them
//! - Sites are built through a factory so routes and registries bound in code
//!   survive a reload

use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::SiteConfig;
use crate::site::{Site, SiteError};

/// Builds a site from configuration.
pub type SiteFactory = Arc<dyn Fn(&SiteConfig) -> Result<Site, SiteError> + Send + Sync>;

/// Shared, reloadable access to the live site.
#[derive(Clone)]
pub struct SiteHandle {
    current: Arc<ArcSwap<Site>>,
    factory: SiteFactory,
}

impl SiteHandle {
    /// Build the initial site with [`Site::from_config`].
    pub fn from_config(config: &SiteConfig) -> Result<Self, SiteError> {
        Self::with_factory(config, Arc::new(Site::from_config))
    }

    /// Build the initial site with a custom factory, reused on every reload.
    pub fn with_factory(config: &SiteConfig, factory: SiteFactory) -> Result<Self, SiteError> {
        let site = factory(config)?;
        Ok(Self {
            current: Arc::new(ArcSwap::from_pointee(site)),
            factory,
        })
    }

    /// Snapshot of the current site.
    pub fn load(&self) -> Arc<Site> {
        self.current.load_full()
    }

    /// Rebuild from `config` and swap. On error the current site stays.
    pub fn reload(&self, config: &SiteConfig) -> Result<(), SiteError> {
        let site = (self.factory)(config)?;
        self.current.store(Arc::new(site));
        tracing::info!(base_path_key = %config.site.base_path_key, "Site reloaded");
        Ok(())
    }

    /// Apply configurations from a watcher until the channel closes.
    pub async fn follow(self, mut updates: mpsc::UnboundedReceiver<SiteConfig>) {
        while let Some(config) = updates.recv().await {
            if let Err(e) = self.reload(&config) {
                tracing::error!(error = %e, "Reload rejected; keeping current site");
            }
        }
        tracing::debug!("Config update channel closed");
    }
}
