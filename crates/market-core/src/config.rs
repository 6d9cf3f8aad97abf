//! Storefront configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use market_wallet::{NetworkConfig, Timeouts};

use crate::error::CoreError;
use crate::Result;

pub const CONFIG_PATH_ENV: &str = "INTUITION_MARKET_CONFIG";
pub const RPC_URL_ENV: &str = "INTUITION_MARKET_RPC_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Network the wallet is expected to be on
    pub network: NetworkConfig,
    /// JSON-RPC endpoint standing in for the injected provider; none means
    /// no wallet is available
    pub rpc_url: Option<String>,
    /// How often the HTTP provider polls for account/chain changes
    pub poll_interval_ms: u64,
    /// Timeout for silent provider reads
    pub request_timeout_ms: u64,
    /// Timeout for calls that wait on a wallet dialog
    pub prompt_timeout_ms: u64,
    /// Log filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Config {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;

        tracing::debug!(path = %path.as_ref().display(), "Loaded configuration");

        Ok(config)
    }

    /// File named by `INTUITION_MARKET_CONFIG` if set, otherwise defaults.
    /// `INTUITION_MARKET_RPC_URL` overrides the endpoint either way.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(url) = std::env::var(RPC_URL_ENV) {
            if !url.trim().is_empty() {
                config.rpc_url = Some(url);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.network.validate().map_err(CoreError::Config)?;

        if self.poll_interval_ms == 0 {
            return Err(CoreError::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        if self.request_timeout_ms == 0 || self.prompt_timeout_ms == 0 {
            return Err(CoreError::Config(
                "provider timeouts must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            request: Duration::from_millis(self.request_timeout_ms),
            prompt: Duration::from_millis(self.prompt_timeout_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::intuition(),
            rpc_url: None,
            poll_interval_ms: 4_000,
            request_timeout_ms: 10_000,
            prompt_timeout_ms: 120_000,
            log_filter: "info".to_string(),
        }
    }
}
