//! The provider contract

use async_trait::async_trait;
use serde_json::Value;

use crate::event::{EventSink, ProviderEventKind};

/// RPC methods the wallet layer issues against a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    RequestAccounts,
    Accounts,
    ChainId,
    GetBalance,
    SwitchChain,
    AddChain,
}

impl RpcMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcMethod::RequestAccounts => "eth_requestAccounts",
            RpcMethod::Accounts => "eth_accounts",
            RpcMethod::ChainId => "eth_chainId",
            RpcMethod::GetBalance => "eth_getBalance",
            RpcMethod::SwitchChain => "wallet_switchEthereumChain",
            RpcMethod::AddChain => "wallet_addEthereumChain",
        }
    }

    /// Whether the wallet may show a prompt and wait on the user
    pub fn prompts_user(&self) -> bool {
        matches!(
            self,
            RpcMethod::RequestAccounts | RpcMethod::SwitchChain | RpcMethod::AddChain
        )
    }
}

impl std::fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RpcMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eth_requestAccounts" => Ok(RpcMethod::RequestAccounts),
            "eth_accounts" => Ok(RpcMethod::Accounts),
            "eth_chainId" => Ok(RpcMethod::ChainId),
            "eth_getBalance" => Ok(RpcMethod::GetBalance),
            "wallet_switchEthereumChain" => Ok(RpcMethod::SwitchChain),
            "wallet_addEthereumChain" => Ok(RpcMethod::AddChain),
            _ => Err(format!("Unknown RPC method: {}", s)),
        }
    }
}

/// An EIP-1193 style wallet provider.
///
/// `request` mirrors `provider.request({ method, params })`. Event
/// subscriptions hand the provider a channel sender; the provider pushes
/// every matching notification into it until `remove_all_listeners` is
/// called for that event.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> crate::Result<Value>;

    fn on(&self, event: ProviderEventKind, sink: EventSink);

    fn remove_all_listeners(&self, event: ProviderEventKind);
}
