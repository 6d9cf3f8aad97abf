//! Main storefront state container

use std::sync::Arc;

use market_provider::{HttpProvider, WalletProvider};
use market_wallet::WalletSessionManager;

use crate::config::Config;
use crate::view::WalletView;
use crate::Result;

/// Storefront instance
///
/// Owns the wallet session manager and the provider it talks to. The UI
/// layer holds one of these and never touches the provider directly.
pub struct Marketplace {
    config: Config,
    wallet: WalletSessionManager,
}

impl Marketplace {
    /// Build from configuration, using an HTTP provider when an RPC URL is
    /// configured and no provider otherwise.
    pub fn new(config: Config) -> Result<Self> {
        let provider: Option<Arc<dyn WalletProvider>> = match config.rpc_url.as_deref() {
            Some(url) => Some(Arc::new(HttpProvider::with_poll_interval(
                url,
                config.poll_interval(),
            )?)),
            None => None,
        };

        Self::with_provider(config, provider)
    }

    pub fn with_provider(
        config: Config,
        provider: Option<Arc<dyn WalletProvider>>,
    ) -> Result<Self> {
        config.validate()?;

        let wallet =
            WalletSessionManager::new(provider, config.network.clone(), config.timeouts());

        Ok(Self { config, wallet })
    }

    /// Subscribe to wallet events and pick up an earlier approval.
    pub async fn initialize(&self) -> WalletView {
        self.wallet.attach();
        let restored = self.wallet.restore().await;

        tracing::info!(
            provider_available = self.wallet.is_provider_available(),
            restored,
            network = %self.config.network.chain_name,
            "Marketplace initialized"
        );

        self.wallet_view()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn wallet(&self) -> &WalletSessionManager {
        &self.wallet
    }

    pub fn wallet_view(&self) -> WalletView {
        WalletView::new(
            self.wallet.session(),
            self.wallet.network(),
            self.wallet.is_provider_available(),
        )
    }

    // === Wallet actions ===

    pub async fn connect_wallet(&self) -> Result<WalletView> {
        self.wallet.connect().await?;
        Ok(self.wallet_view())
    }

    pub fn disconnect_wallet(&self) -> WalletView {
        self.wallet.disconnect();
        self.wallet_view()
    }

    pub async fn refresh_balance(&self) -> WalletView {
        self.wallet.refresh_balance().await;
        self.wallet_view()
    }

    /// Drop provider subscriptions before the UI goes away.
    pub fn shutdown(&self) {
        self.wallet.detach();
        tracing::info!("Marketplace shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use market_provider::{MockProvider, ProviderEvent, ProviderEventKind};
    use market_wallet::WalletError;

    const ACCOUNT: &str = "0x1234567890123456789012345678901234567890";

    fn marketplace_for(provider: &MockProvider) -> Marketplace {
        Marketplace::with_provider(Config::default(), Some(Arc::new(provider.clone()))).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_restores_session() {
        let provider = MockProvider::new()
            .with_accounts([ACCOUNT])
            .with_chain_id("0x1234")
            .with_balance(ACCOUNT, "0xde0b6b3a7640000")
            .authorized();
        let marketplace = marketplace_for(&provider);

        let view = marketplace.initialize().await;
        assert!(view.connected);
        assert!(view.is_on_target_network);
        assert_eq!(view.formatted_address, "0x1234...7890");
        assert_eq!(view.formatted_balance, "1.0000");
        assert_eq!(provider.listener_count(ProviderEventKind::AccountsChanged), 1);

        marketplace.shutdown();
        assert_eq!(provider.listener_count(ProviderEventKind::AccountsChanged), 0);
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let provider = MockProvider::new().with_accounts([ACCOUNT]);
        let marketplace = marketplace_for(&provider);
        let view = marketplace.initialize().await;
        assert!(!view.connected);
        assert!(view.is_provider_available);

        let view = marketplace.connect_wallet().await.unwrap();
        assert!(view.connected);
        assert_eq!(view.chain_id.as_deref(), Some("0x1234"));
        assert!(!view.loading);

        let view = marketplace.disconnect_wallet();
        assert!(!view.connected);
        assert_eq!(view.formatted_address, "");
    }

    #[tokio::test]
    async fn test_wallet_switches_account() {
        let provider = MockProvider::new()
            .with_accounts([ACCOUNT])
            .with_known_chain("0x1234");
        let marketplace = marketplace_for(&provider);
        marketplace.initialize().await;
        marketplace.connect_wallet().await.unwrap();

        let mut rx = marketplace.wallet().watch();
        provider.emit(ProviderEvent::AccountsChanged(vec![]));
        rx.wait_for(|s| !s.connected).await.unwrap();

        assert!(!marketplace.wallet_view().connected);
    }

    #[tokio::test]
    async fn test_without_provider() {
        let marketplace = Marketplace::new(Config::default()).unwrap();
        let view = marketplace.initialize().await;
        assert!(!view.is_provider_available);

        let err = marketplace.connect_wallet().await.unwrap_err();
        assert!(matches!(err, CoreError::Wallet(WalletError::ProviderAbsent)));
        assert!(marketplace.wallet_view().error.is_some());
    }

    #[test]
    fn test_invalid_rpc_url() {
        let config = Config {
            rpc_url: Some("not a url".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            Marketplace::new(config),
            Err(CoreError::Provider(_))
        ));
    }

    #[test]
    fn test_http_provider_from_config() {
        let config = Config {
            rpc_url: Some("http://127.0.0.1:8545".to_string()),
            ..Config::default()
        };
        let marketplace = Marketplace::new(config).unwrap();
        assert!(marketplace.wallet().is_provider_available());
    }
}
