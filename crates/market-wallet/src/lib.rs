//! Intuition Market Wallet Sessions
//!
//! Tracks the connection between the storefront and a single wallet
//! provider:
//! - One [`Session`] per manager, never persisted
//! - `connect` asks for accounts, moves the wallet to the target network
//!   and reads the balance, strictly in that order
//! - Provider `accountsChanged` / `chainChanged` events keep the session in
//!   sync for as long as the manager is attached
//! - Background balance reads never look like a disconnect

mod error;
mod format;
mod manager;
mod network;
mod rpc;
mod session;

pub use error::WalletError;
pub use format::{formatted_address, formatted_balance, wei_to_native};
pub use manager::WalletSessionManager;
pub use network::{NativeCurrency, NetworkConfig};
pub use rpc::Timeouts;
pub use session::Session;

pub type Result<T> = std::result::Result<T, WalletError>;
