//! Presentation snapshot of the wallet session

use serde::{Deserialize, Serialize};

use market_wallet::{formatted_address, formatted_balance, NetworkConfig, Session};

/// Everything the UI reads about the wallet, taken from one session
/// snapshot so the derived fields always agree with each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletView {
    pub connected: bool,
    pub account: Option<String>,
    pub chain_id: Option<String>,
    pub balance: f64,
    pub loading: bool,
    pub error: Option<String>,
    pub is_on_target_network: bool,
    pub formatted_address: String,
    pub formatted_balance: String,
    pub is_provider_available: bool,
    pub network_name: String,
    pub currency_symbol: String,
}

impl WalletView {
    pub fn new(session: Session, network: &NetworkConfig, provider_available: bool) -> Self {
        let is_on_target_network = network.matches_chain(session.chain_id.as_deref());
        let formatted_address = formatted_address(session.account.as_deref());
        let formatted_balance = formatted_balance(session.display_balance());

        Self {
            connected: session.connected,
            account: session.account,
            chain_id: session.chain_id,
            balance: session.balance,
            loading: session.loading,
            error: session.error,
            is_on_target_network,
            formatted_address,
            formatted_balance,
            is_provider_available: provider_available,
            network_name: network.chain_name.clone(),
            currency_symbol: network.native_currency.symbol.clone(),
        }
    }
}
