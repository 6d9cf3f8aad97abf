//! Wallet commands
//!
//! Bridges a line-oriented frontend to the core. Every command answers with
//! a `CommandResult` carrying the current wallet view.

use market_core::WalletView;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CommandResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Disconnect,
    Refresh,
    Status,
    Help,
    Quit,
}

impl std::str::FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "connect" => Ok(Command::Connect),
            "disconnect" => Ok(Command::Disconnect),
            "refresh" | "balance" => Ok(Command::Refresh),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("Unknown command: {}", other)),
        }
    }
}

pub const HELP: &str = "\
commands:
  connect      request wallet access and switch to the target network
  disconnect   forget the current wallet connection
  refresh      re-read the balance of the connected account
  status       show the current wallet state
  quit         exit";

pub async fn connect(state: &AppState) -> CommandResult<WalletView> {
    match state.marketplace().connect_wallet().await {
        Ok(view) => CommandResult::ok(view),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub fn disconnect(state: &AppState) -> CommandResult<WalletView> {
    CommandResult::ok(state.marketplace().disconnect_wallet())
}

pub async fn refresh_balance(state: &AppState) -> CommandResult<WalletView> {
    CommandResult::ok(state.marketplace().refresh_balance().await)
}

pub fn status(state: &AppState) -> CommandResult<WalletView> {
    CommandResult::ok(state.marketplace().wallet_view())
}

/// Run a wallet command. `Help` and `Quit` are handled by the caller.
pub async fn execute(state: &AppState, command: Command) -> CommandResult<WalletView> {
    match command {
        Command::Connect => connect(state).await,
        Command::Disconnect => disconnect(state),
        Command::Refresh => refresh_balance(state).await,
        Command::Status | Command::Help | Command::Quit => status(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::{Config, Marketplace, MockProvider};
    use std::sync::Arc;

    fn state_with(provider: Option<MockProvider>) -> AppState {
        let provider = provider.map(|p| Arc::new(p) as Arc<dyn market_core::WalletProvider>);
        AppState::with_marketplace(Marketplace::with_provider(Config::default(), provider).unwrap())
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("connect".parse::<Command>().unwrap(), Command::Connect);
        assert_eq!("  Status ".parse::<Command>().unwrap(), Command::Status);
        assert_eq!("balance".parse::<Command>().unwrap(), Command::Refresh);
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
        assert!("mint".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn test_connect_command() {
        let state = state_with(Some(MockProvider::new()));
        state.initialize().await;

        let result = execute(&state, Command::Connect).await;
        assert!(result.success);
        let view = result.data.unwrap();
        assert!(view.connected);
        assert!(view.is_on_target_network);

        let result = execute(&state, Command::Disconnect).await;
        assert!(!result.data.unwrap().connected);
    }

    #[tokio::test]
    async fn test_connect_without_wallet() {
        let state = state_with(None);

        let result = execute(&state, Command::Connect).await;
        assert!(!result.success);
        assert!(result.data.is_none());
        assert!(result.error.unwrap().contains("No wallet provider detected"));
    }

    #[test]
    fn test_result_shape() {
        let json = serde_json::to_value(CommandResult::<()>::err("boom".to_string())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "data": null, "error": "boom" })
        );
    }
}
