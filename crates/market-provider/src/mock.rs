//! In-memory scripted wallet
//!
//! Behaves like a browser wallet extension closely enough for the session
//! manager: it keeps a list of accounts, an active chain, the chains it
//! knows about and per-account balances, and it can be told to reject
//! prompts or fail reads. Every request is recorded.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use crate::error::{codes, ProviderError};
use crate::event::{EventSink, ProviderEvent, ProviderEventKind};
use crate::provider::{RpcMethod, WalletProvider};
use crate::Result;

const DEFAULT_ACCOUNT: &str = "0x1000000000000000000000000000000000000001";
const DEFAULT_CHAIN_ID: &str = "0x1";

#[derive(Debug)]
struct MockState {
    /// Accounts the wallet holds and hands out on approval
    wallet_accounts: Vec<String>,
    /// Accounts the site is authorized for (`eth_accounts`)
    authorized: Vec<String>,
    chain_id: String,
    known_chains: HashSet<String>,
    /// Lowercased address -> hex wei
    balances: HashMap<String, String>,
    reject_accounts: bool,
    reject_switch: bool,
    fail_balance: bool,
    request_delay: Option<Duration>,
    /// One-shot: the next `eth_getBalance` answers with the balance at
    /// request time, but only after this delay
    balance_delay: Option<Duration>,
    listeners: HashMap<ProviderEventKind, Vec<EventSink>>,
    requests: Vec<(String, Value)>,
}

impl Default for MockState {
    fn default() -> Self {
        let mut known_chains = HashSet::new();
        known_chains.insert(DEFAULT_CHAIN_ID.to_string());

        Self {
            wallet_accounts: vec![DEFAULT_ACCOUNT.to_string()],
            authorized: Vec::new(),
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            known_chains,
            balances: HashMap::new(),
            reject_accounts: false,
            reject_switch: false,
            fail_balance: false,
            request_delay: None,
            balance_delay: None,
            listeners: HashMap::new(),
            requests: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    state: Arc<Mutex<MockState>>,
    prompt_gate: Arc<Mutex<Option<Arc<Notify>>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounts handed out when the user approves `eth_requestAccounts`
    #[must_use]
    pub fn with_accounts<I, S>(self, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.lock().wallet_accounts = accounts.into_iter().map(Into::into).collect();
        self
    }

    /// Pre-authorize the wallet accounts, as if the site was approved earlier
    #[must_use]
    pub fn authorized(self) -> Self {
        {
            let mut state = self.state.lock();
            state.authorized = state.wallet_accounts.clone();
        }
        self
    }

    #[must_use]
    pub fn with_chain_id(self, chain_id: impl Into<String>) -> Self {
        {
            let mut state = self.state.lock();
            let chain_id = chain_id.into();
            state.known_chains.insert(chain_id.clone());
            state.chain_id = chain_id;
        }
        self
    }

    /// Register a chain so `wallet_switchEthereumChain` succeeds for it
    #[must_use]
    pub fn with_known_chain(self, chain_id: impl Into<String>) -> Self {
        self.state.lock().known_chains.insert(chain_id.into());
        self
    }

    #[must_use]
    pub fn with_balance(self, account: &str, wei_hex: impl Into<String>) -> Self {
        self.set_balance(account, wei_hex);
        self
    }

    pub fn set_balance(&self, account: &str, wei_hex: impl Into<String>) {
        self.state
            .lock()
            .balances
            .insert(account.to_lowercase(), wei_hex.into());
    }

    pub fn set_reject_accounts(&self, reject: bool) {
        self.state.lock().reject_accounts = reject;
    }

    pub fn set_reject_switch(&self, reject: bool) {
        self.state.lock().reject_switch = reject;
    }

    pub fn set_fail_balance(&self, fail: bool) {
        self.state.lock().fail_balance = fail;
    }

    /// Delay every request, to exercise caller timeouts
    pub fn set_request_delay(&self, delay: Option<Duration>) {
        self.state.lock().request_delay = delay;
    }

    /// Make the next balance read slow. Its value is taken when the request
    /// arrives, like a node answering from an older block.
    pub fn delay_next_balance(&self, delay: Duration) {
        self.state.lock().balance_delay = Some(delay);
    }

    /// Keep `eth_requestAccounts` pending until `release_account_prompt`
    pub fn hold_account_prompt(&self) {
        *self.prompt_gate.lock() = Some(Arc::new(Notify::new()));
    }

    pub fn release_account_prompt(&self) {
        if let Some(gate) = self.prompt_gate.lock().take() {
            gate.notify_one();
        }
    }

    pub fn chain_id(&self) -> String {
        self.state.lock().chain_id.clone()
    }

    pub fn knows_chain(&self, chain_id: &str) -> bool {
        self.state.lock().known_chains.contains(chain_id)
    }

    /// Method names of every request received, in order
    pub fn requests(&self) -> Vec<String> {
        self.state
            .lock()
            .requests
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }

    pub fn request_count(&self, method: RpcMethod) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|(m, _)| m == method.as_str())
            .count()
    }

    pub fn listener_count(&self, event: ProviderEventKind) -> usize {
        self.state
            .lock()
            .listeners
            .get(&event)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Simulate the wallet firing an event. Also updates the wallet's own
    /// view so later reads agree with what was emitted.
    pub fn emit(&self, event: ProviderEvent) {
        let mut state = self.state.lock();
        match &event {
            ProviderEvent::AccountsChanged(accounts) => state.authorized = accounts.clone(),
            ProviderEvent::ChainChanged(chain_id) => {
                state.known_chains.insert(chain_id.clone());
                state.chain_id = chain_id.clone();
            }
        }
        Self::dispatch(&mut state, event);
    }

    fn dispatch(state: &mut MockState, event: ProviderEvent) {
        if let Some(sinks) = state.listeners.get_mut(&event.kind()) {
            sinks.retain(|sink| sink.send(event.clone()).is_ok());
        }
    }

    fn chain_param(params: &Value) -> Result<String> {
        first_param(params)
            .and_then(|p| p.get("chainId"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::rpc(-32602, "Missing chainId parameter"))
    }

    fn activate_chain(state: &mut MockState, chain_id: String) {
        if state.chain_id != chain_id {
            state.chain_id = chain_id.clone();
            Self::dispatch(state, ProviderEvent::ChainChanged(chain_id));
        }
    }

    fn handle(&self, method: &str, params: &Value) -> Result<Value> {
        let method: RpcMethod = method.parse().map_err(|_| {
            ProviderError::rpc(
                codes::UNSUPPORTED_METHOD,
                format!("Method not supported: {}", method),
            )
        })?;
        let mut state = self.state.lock();

        match method {
            RpcMethod::RequestAccounts => {
                if state.reject_accounts {
                    return Err(ProviderError::rpc(
                        codes::USER_REJECTED,
                        "User rejected the request.",
                    ));
                }
                state.authorized = state.wallet_accounts.clone();
                Ok(json!(state.authorized))
            }
            RpcMethod::Accounts => Ok(json!(state.authorized)),
            RpcMethod::ChainId => Ok(json!(state.chain_id)),
            RpcMethod::GetBalance => {
                if state.fail_balance {
                    return Err(ProviderError::Transport("balance read failed".to_string()));
                }
                let account = first_param(params)
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProviderError::rpc(-32602, "Missing address parameter"))?;
                let balance = state
                    .balances
                    .get(&account.to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| "0x0".to_string());
                Ok(json!(balance))
            }
            RpcMethod::SwitchChain => {
                let chain_id = Self::chain_param(params)?;
                if state.reject_switch {
                    return Err(ProviderError::rpc(
                        codes::USER_REJECTED,
                        "User rejected the request.",
                    ));
                }
                if !state.known_chains.contains(&chain_id) {
                    return Err(ProviderError::rpc(
                        codes::UNRECOGNIZED_CHAIN,
                        format!("Unrecognized chain ID \"{}\"", chain_id),
                    ));
                }
                Self::activate_chain(&mut state, chain_id);
                Ok(Value::Null)
            }
            RpcMethod::AddChain => {
                let chain_id = Self::chain_param(params)?;
                if state.reject_switch {
                    return Err(ProviderError::rpc(
                        codes::USER_REJECTED,
                        "User rejected the request.",
                    ));
                }
                // Wallets switch to a freshly added chain after approval
                state.known_chains.insert(chain_id.clone());
                Self::activate_chain(&mut state, chain_id);
                Ok(Value::Null)
            }
        }
    }
}

fn first_param(params: &Value) -> Option<&Value> {
    params.as_array().and_then(|p| p.first())
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let (delay, balance_delay) = {
            let mut state = self.state.lock();
            state.requests.push((method.to_string(), params.clone()));
            let balance_delay = if method == RpcMethod::GetBalance.as_str() {
                state.balance_delay.take()
            } else {
                None
            };
            (state.request_delay, balance_delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(balance_delay) = balance_delay {
            let answer = self.handle(method, &params);
            tokio::time::sleep(balance_delay).await;
            return answer;
        }

        if method == RpcMethod::RequestAccounts.as_str() {
            let gate = self.prompt_gate.lock().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
        }

        self.handle(method, &params)
    }

    fn on(&self, event: ProviderEventKind, sink: EventSink) {
        self.state
            .lock()
            .listeners
            .entry(event)
            .or_default()
            .push(sink);
    }

    fn remove_all_listeners(&self, event: ProviderEventKind) {
        self.state.lock().listeners.remove(&event);
    }
}
