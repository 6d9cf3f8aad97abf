//! Application state management
use market_core::{Config, Marketplace, Result, WalletView};
use std::sync::Arc;

/// Shared handle to the storefront
#[derive(Clone)]
pub struct AppState {
    marketplace: Arc<Marketplace>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self::with_marketplace(Marketplace::new(config)?))
    }

    pub fn with_marketplace(marketplace: Marketplace) -> Self {
        Self {
            marketplace: Arc::new(marketplace),
        }
    }

    pub async fn initialize(&self) -> WalletView {
        self.marketplace.initialize().await
    }

    pub fn marketplace(&self) -> &Marketplace {
        &self.marketplace
    }

    pub fn shutdown(&self) {
        self.marketplace.shutdown();
    }
}
