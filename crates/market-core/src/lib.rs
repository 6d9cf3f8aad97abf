//! Intuition Market Core
//!
//! Central coordination layer for the storefront. The wallet session lives
//! here; the UI only renders [`WalletView`] snapshots and calls actions.

mod config;
mod error;
mod marketplace;
mod view;

pub use config::Config;
pub use error::CoreError;
pub use marketplace::Marketplace;
pub use view::WalletView;

// Re-export wallet components
pub use market_provider::{
    HttpProvider, MockProvider, ProviderError, ProviderEvent, ProviderEventKind, WalletProvider,
};
pub use market_wallet::{
    NativeCurrency, NetworkConfig, Session, Timeouts, WalletError, WalletSessionManager,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging to stderr. `RUST_LOG` wins over the configured filter.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
