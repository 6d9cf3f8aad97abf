//! Intuition Market Provider Adapters
//!
//! The wallet side of the storefront talks to exactly one external object:
//! an EIP-1193 style provider. This crate defines that contract and ships
//! two adapters for it:
//! - [`HttpProvider`]: JSON-RPC over HTTP, with polled change events
//! - [`MockProvider`]: an in-memory scripted wallet for tests and demos

mod error;
mod event;
mod http;
mod mock;
mod provider;

pub use error::{codes, ProviderError};
pub use event::{EventSink, ProviderEvent, ProviderEventKind};
pub use http::HttpProvider;
pub use mock::MockProvider;
pub use provider::{RpcMethod, WalletProvider};

pub type Result<T> = std::result::Result<T, ProviderError>;
