//! Typed provider calls with timeouts

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use market_provider::{ProviderError, RpcMethod, WalletProvider};

use crate::error::WalletError;
use crate::format::wei_to_native;
use crate::network::NetworkConfig;
use crate::Result;

/// Upper bounds on how long a provider call may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Silent reads (`eth_accounts`, `eth_chainId`, `eth_getBalance`)
    pub request: Duration,
    /// Calls that may wait on a wallet dialog
    pub prompt: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(10),
            prompt: Duration::from_secs(120),
        }
    }
}

#[derive(Clone)]
pub(crate) struct Rpc {
    provider: Arc<dyn WalletProvider>,
    timeouts: Timeouts,
}

impl Rpc {
    pub(crate) fn new(provider: Arc<dyn WalletProvider>, timeouts: Timeouts) -> Self {
        Self { provider, timeouts }
    }

    pub(crate) fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.provider
    }

    async fn call(&self, method: RpcMethod, params: Value) -> Result<Value> {
        let timeout = if method.prompts_user() {
            self.timeouts.prompt
        } else {
            self.timeouts.request
        };

        tracing::trace!(%method, "Provider request");

        match tokio::time::timeout(timeout, self.provider.request(method.as_str(), params)).await
        {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(WalletError::from_provider(method, err)),
            Err(_) => Err(WalletError::Timeout { method, timeout }),
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(method: RpcMethod, value: Value) -> Result<T> {
        serde_json::from_value(value).map_err(|e| {
            WalletError::from_provider(method, ProviderError::InvalidResponse(e.to_string()))
        })
    }

    /// `eth_requestAccounts`: may open the wallet's approval dialog
    pub(crate) async fn request_accounts(&self) -> Result<Vec<String>> {
        let value = self.call(RpcMethod::RequestAccounts, json!([])).await?;
        Self::decode(RpcMethod::RequestAccounts, value)
    }

    /// `eth_accounts`: already-authorized accounts, never prompts
    pub(crate) async fn accounts(&self) -> Result<Vec<String>> {
        let value = self.call(RpcMethod::Accounts, json!([])).await?;
        Self::decode(RpcMethod::Accounts, value)
    }

    pub(crate) async fn chain_id(&self) -> Result<String> {
        let value = self.call(RpcMethod::ChainId, json!([])).await?;
        Self::decode(RpcMethod::ChainId, value)
    }

    pub(crate) async fn balance(&self, account: &str, decimals: u8) -> Result<f64> {
        let value = self
            .call(RpcMethod::GetBalance, json!([account, "latest"]))
            .await?;
        let hex: String = Self::decode(RpcMethod::GetBalance, value)?;
        wei_to_native(&hex, decimals)
    }

    pub(crate) async fn switch_chain(&self, chain_id: &str) -> Result<()> {
        self.call(RpcMethod::SwitchChain, json!([{ "chainId": chain_id }]))
            .await
            .map(|_| ())
    }

    pub(crate) async fn add_chain(&self, network: &NetworkConfig) -> Result<()> {
        self.call(RpcMethod::AddChain, json!([network]))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_provider::MockProvider;

    fn rpc_for(provider: &MockProvider) -> Rpc {
        Rpc::new(Arc::new(provider.clone()), Timeouts::default())
    }

    #[tokio::test]
    async fn test_balance_conversion() {
        let provider = MockProvider::new().with_balance("0xaaa", "0x1bc16d674ec80000");
        let rpc = rpc_for(&provider);

        assert_eq!(rpc.balance("0xaaa", 18).await.unwrap(), 2.0);
    }

    #[tokio::test]
    async fn test_add_chain_sends_descriptor() {
        let provider = MockProvider::new();
        let rpc = rpc_for(&provider);

        rpc.add_chain(&NetworkConfig::intuition()).await.unwrap();
        assert!(provider.knows_chain("0x1234"));
        assert_eq!(provider.requests(), vec!["wallet_addEthereumChain"]);
    }

    #[tokio::test]
    async fn test_timeout() {
        let provider = MockProvider::new();
        provider.set_request_delay(Some(Duration::from_millis(200)));
        let rpc = Rpc::new(
            Arc::new(provider.clone()),
            Timeouts {
                request: Duration::from_millis(20),
                prompt: Duration::from_secs(5),
            },
        );

        let err = rpc.chain_id().await.unwrap_err();
        assert_eq!(
            err,
            WalletError::Timeout {
                method: RpcMethod::ChainId,
                timeout: Duration::from_millis(20),
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_balance() {
        let provider = MockProvider::new().with_balance("0xaaa", "lots");
        let rpc = rpc_for(&provider);

        assert!(matches!(
            rpc.balance("0xaaa", 18).await,
            Err(WalletError::InvalidBalance(_))
        ));
    }
}
