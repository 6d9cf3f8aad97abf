//! Wallet error types

use std::time::Duration;

use market_provider::{codes, ProviderError, RpcMethod};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalletError {
    #[error("No wallet provider detected. Please install a browser wallet to continue.")]
    ProviderAbsent,

    #[error("User rejected the request ({0})")]
    UserRejected(RpcMethod),

    #[error("Network is not registered in the wallet: {0}")]
    UnrecognizedNetwork(String),

    #[error("No accounts found")]
    NoAccounts,

    #[error("Read failed: {0}")]
    TransientRead(String),

    #[error("{method} timed out after {timeout:?}")]
    Timeout { method: RpcMethod, timeout: Duration },

    #[error("A wallet connection is already in progress")]
    ConnectInProgress,

    #[error("Connection attempt cancelled by disconnect")]
    Cancelled,

    #[error("Invalid balance value: {0}")]
    InvalidBalance(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl WalletError {
    /// Classify a raw provider failure for the method that produced it.
    pub fn from_provider(method: RpcMethod, err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable => WalletError::ProviderAbsent,
            ProviderError::Rpc { code, .. } if code == codes::USER_REJECTED => {
                WalletError::UserRejected(method)
            }
            ProviderError::Rpc { code, message } if code == codes::UNRECOGNIZED_CHAIN => {
                WalletError::UnrecognizedNetwork(message)
            }
            ProviderError::Transport(msg) | ProviderError::InvalidResponse(msg)
                if !method.prompts_user() =>
            {
                WalletError::TransientRead(format!("{}: {}", method, msg))
            }
            other => WalletError::Provider(other),
        }
    }

    /// Everything except a missing provider can be retried by the user.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, WalletError::ProviderAbsent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(
            WalletError::from_provider(RpcMethod::RequestAccounts, ProviderError::Unavailable),
            WalletError::ProviderAbsent
        );
        assert_eq!(
            WalletError::from_provider(
                RpcMethod::SwitchChain,
                ProviderError::rpc(codes::USER_REJECTED, "User rejected the request.")
            ),
            WalletError::UserRejected(RpcMethod::SwitchChain)
        );
        assert!(matches!(
            WalletError::from_provider(
                RpcMethod::SwitchChain,
                ProviderError::rpc(codes::UNRECOGNIZED_CHAIN, "Unrecognized chain ID")
            ),
            WalletError::UnrecognizedNetwork(_)
        ));
    }

    #[test]
    fn test_reads_are_transient() {
        let err = WalletError::from_provider(
            RpcMethod::GetBalance,
            ProviderError::Transport("connection reset".into()),
        );
        assert_eq!(
            err,
            WalletError::TransientRead("eth_getBalance: connection reset".to_string())
        );

        // Prompts keep the raw provider error
        let err = WalletError::from_provider(
            RpcMethod::RequestAccounts,
            ProviderError::Transport("connection reset".into()),
        );
        assert!(matches!(err, WalletError::Provider(_)));
    }

    #[test]
    fn test_recoverable() {
        assert!(!WalletError::ProviderAbsent.is_recoverable());
        assert!(WalletError::UserRejected(RpcMethod::RequestAccounts).is_recoverable());
        assert!(WalletError::ConnectInProgress.is_recoverable());
        assert!(WalletError::Cancelled.is_recoverable());
    }
}
