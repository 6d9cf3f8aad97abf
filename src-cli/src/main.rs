//! Intuition Market - wallet command bridge
//!
//! Reads commands from stdin and answers each with a JSON line, standing
//! in for the storefront UI.

mod commands;
mod state;

use commands::{Command, CommandResult};
use market_core::Config;
use serde::Serialize;
use state::AppState;
use tokio::io::{AsyncBufReadExt, BufReader};

fn emit<T: Serialize>(result: &CommandResult<T>) {
    match serde_json::to_string(result) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::error!("Failed to serialize command result: {}", e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    market_core::init_logging(&config.log_filter);

    let state = AppState::new(config)?;
    let view = state.initialize().await;
    emit(&CommandResult::ok(view));

    tracing::info!("Intuition Market started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };

        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => println!("{}", commands::HELP),
            Ok(command) => emit(&commands::execute(&state, command).await),
            Err(e) => emit(&CommandResult::<()>::err(e)),
        }
    }

    state.shutdown();
    Ok(())
}
