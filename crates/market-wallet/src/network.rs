//! Target network descriptor
//!
//! Serialized field names follow `wallet_addEthereumChain` (EIP-3085) so the
//! struct can be handed to the provider as-is.

use serde::{Deserialize, Serialize};

/// Largest decimal count whose scale factor fits in a u128
pub const MAX_DECIMALS: u8 = 38;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// Hex chain id, e.g. `0x1234`
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub block_explorer_urls: Vec<String>,
}

impl NetworkConfig {
    /// Intuition Network testnet
    pub fn intuition() -> Self {
        Self {
            chain_id: "0x1234".to_string(),
            chain_name: "Intuition Network".to_string(),
            native_currency: NativeCurrency {
                name: "tTRUST".to_string(),
                symbol: "tTRUST".to_string(),
                decimals: 18,
            },
            rpc_urls: vec!["https://rpc.intuition.systems".to_string()],
            block_explorer_urls: vec!["https://explorer.intuition.systems".to_string()],
        }
    }

    pub fn decimals(&self) -> u8 {
        self.native_currency.decimals
    }

    pub fn matches_chain(&self, chain_id: Option<&str>) -> bool {
        chain_id == Some(self.chain_id.as_str())
    }

    /// Check the descriptor before handing it to a wallet.
    pub fn validate(&self) -> Result<(), String> {
        let digits = self
            .chain_id
            .strip_prefix("0x")
            .ok_or_else(|| format!("chain id must be 0x-prefixed hex: {}", self.chain_id))?;

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("chain id must be 0x-prefixed hex: {}", self.chain_id));
        }

        if self.chain_name.trim().is_empty() {
            return Err("chain name cannot be empty".to_string());
        }

        if self.native_currency.decimals > MAX_DECIMALS {
            return Err(format!(
                "native currency decimals must be at most {}",
                MAX_DECIMALS
            ));
        }

        if self.rpc_urls.is_empty() {
            return Err("at least one RPC URL is required".to_string());
        }

        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::intuition()
    }
}
