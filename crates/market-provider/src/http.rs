//! JSON-RPC over HTTP provider
//!
//! Talks to a node or wallet bridge that speaks JSON-RPC 2.0. HTTP has no
//! push channel, so `on(...)` starts a watcher task that polls
//! `eth_accounts` and `eth_chainId` and emits an event whenever either
//! value changes. The watcher stops once the last listener is removed.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

use crate::error::ProviderError;
use crate::event::{EventSink, ProviderEvent, ProviderEventKind};
use crate::provider::{RpcMethod, WalletProvider};
use crate::Result;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(4);
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

struct HttpInner {
    client: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
    poll_interval: Duration,
    listeners: Mutex<HashMap<ProviderEventKind, Vec<EventSink>>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct HttpProvider {
    inner: Arc<HttpInner>,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("url", &self.inner.url.as_str())
            .field("poll_interval", &self.inner.poll_interval)
            .finish_non_exhaustive()
    }
}

impl HttpProvider {
    pub fn new(rpc_url: &str) -> Result<Self> {
        Self::with_poll_interval(rpc_url, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(rpc_url: &str, poll_interval: Duration) -> Result<Self> {
        let url = Url::parse(rpc_url)
            .map_err(|e| ProviderError::Transport(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProviderError::Transport(format!(
                "Unsupported RPC URL scheme: {}",
                url.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpInner {
                client,
                url,
                next_id: AtomicU64::new(1),
                poll_interval,
                listeners: Mutex::new(HashMap::new()),
                watcher: Mutex::new(None),
            }),
        })
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    fn ensure_watcher(&self) {
        let mut watcher = self.inner.watcher.lock();
        if watcher.is_some() {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::downgrade(&self.inner);
                *watcher = Some(handle.spawn(watch_provider(inner, self.inner.poll_interval)));
                tracing::debug!(url = %self.inner.url, "Started provider watcher");
            }
            Err(_) => {
                tracing::warn!(
                    url = %self.inner.url,
                    "No async runtime; provider events will not be delivered"
                );
            }
        }
    }
}

impl HttpInner {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = encode_request(id, method, params);

        tracing::trace!(id, method, "JSON-RPC request");

        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let payload: Value = response.json().await?;
        decode_response(payload)
    }

    fn dispatch(&self, event: ProviderEvent) {
        let mut listeners = self.listeners.lock();
        if let Some(sinks) = listeners.get_mut(&event.kind()) {
            sinks.retain(|sink| sink.send(event.clone()).is_ok());
        }
    }
}

fn encode_request(id: u64, method: &str, params: Value) -> RpcRequest<'_> {
    let params = match params {
        Value::Null => json!([]),
        other => other,
    };

    RpcRequest {
        jsonrpc: "2.0",
        id,
        method,
        params,
    }
}

fn decode_response(payload: Value) -> Result<Value> {
    let response: RpcResponse = serde_json::from_value(payload)
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    if let Some(error) = response.error {
        return Err(ProviderError::rpc(error.code, error.message));
    }

    Ok(response.result.unwrap_or(Value::Null))
}

/// Record `current` as the latest polled value. Returns it when it differs
/// from an earlier poll; the first poll only sets the baseline.
fn observe<T: PartialEq + Clone>(last: &mut Option<T>, current: T) -> Option<T> {
    let changed = last.as_ref().is_some_and(|previous| *previous != current);
    *last = Some(current.clone());
    changed.then_some(current)
}

async fn watch_provider(inner: Weak<HttpInner>, poll_interval: Duration) {
    let mut ticker = tokio::time::interval(poll_interval);
    let mut last_accounts: Option<Vec<String>> = None;
    let mut last_chain: Option<String> = None;

    loop {
        ticker.tick().await;

        let Some(inner) = inner.upgrade() else {
            break;
        };

        match inner.call(RpcMethod::Accounts.as_str(), json!([])).await {
            Ok(value) => match serde_json::from_value::<Vec<String>>(value) {
                Ok(accounts) => {
                    if let Some(accounts) = observe(&mut last_accounts, accounts) {
                        inner.dispatch(ProviderEvent::AccountsChanged(accounts));
                    }
                }
                Err(e) => tracing::debug!("Ignoring malformed eth_accounts result: {}", e),
            },
            Err(e) => tracing::debug!("Account poll failed: {}", e),
        }

        match inner.call(RpcMethod::ChainId.as_str(), json!([])).await {
            Ok(Value::String(chain_id)) => {
                if let Some(chain_id) = observe(&mut last_chain, chain_id) {
                    inner.dispatch(ProviderEvent::ChainChanged(chain_id));
                }
            }
            Ok(other) => tracing::debug!("Ignoring malformed eth_chainId result: {}", other),
            Err(e) => tracing::debug!("Chain poll failed: {}", e),
        }
    }
}

#[async_trait]
impl WalletProvider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.inner.call(method, params).await
    }

    fn on(&self, event: ProviderEventKind, sink: EventSink) {
        self.inner
            .listeners
            .lock()
            .entry(event)
            .or_default()
            .push(sink);
        self.ensure_watcher();
    }

    fn remove_all_listeners(&self, event: ProviderEventKind) {
        let now_empty = {
            let mut listeners = self.inner.listeners.lock();
            listeners.remove(&event);
            listeners.values().all(Vec::is_empty)
        };

        if now_empty {
            if let Some(handle) = self.inner.watcher.lock().take() {
                handle.abort();
                tracing::debug!(url = %self.inner.url, "Stopped provider watcher");
            }
        }
    }
}

impl Drop for HttpInner {
    fn drop(&mut self) {
        if let Some(handle) = self.watcher.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_url_validation() {
        assert!(HttpProvider::new("http://127.0.0.1:8545").is_ok());
        assert!(HttpProvider::new("https://rpc.intuition.systems").is_ok());
        assert!(HttpProvider::new("not a url").is_err());
        assert!(HttpProvider::new("ws://127.0.0.1:8546").is_err());
    }

    #[test]
    fn test_encode_request() {
        let request = encode_request(7, "eth_chainId", Value::Null);
        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(
            encoded,
            json!({ "jsonrpc": "2.0", "id": 7, "method": "eth_chainId", "params": [] })
        );

        let request = encode_request(8, "eth_getBalance", json!(["0xabc", "latest"]));
        assert_eq!(request.params, json!(["0xabc", "latest"]));
    }

    #[test]
    fn test_decode_response() {
        let ok = decode_response(json!({ "jsonrpc": "2.0", "id": 1, "result": "0x1234" }));
        assert_eq!(ok.unwrap(), json!("0x1234"));

        let err = decode_response(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 4902, "message": "Unrecognized chain ID" }
        }))
        .unwrap_err();
        assert!(err.is_unrecognized_chain());

        let null = decode_response(json!({ "jsonrpc": "2.0", "id": 1, "result": null }));
        assert_eq!(null.unwrap(), Value::Null);

        assert!(matches!(
            decode_response(json!("garbage")),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_observe_reports_changes_after_baseline() {
        let mut last_chain = None;

        assert_eq!(observe(&mut last_chain, "0x1".to_string()), None);
        assert_eq!(observe(&mut last_chain, "0x1".to_string()), None);
        assert_eq!(
            observe(&mut last_chain, "0x1234".to_string()),
            Some("0x1234".to_string())
        );
        assert_eq!(last_chain.as_deref(), Some("0x1234"));

        let mut last_accounts: Option<Vec<String>> = None;
        assert_eq!(observe(&mut last_accounts, vec!["0xabc".to_string()]), None);
        assert_eq!(observe(&mut last_accounts, vec![]), Some(vec![]));
    }

    #[tokio::test]
    async fn test_dispatch_reaches_listeners_of_kind() {
        let provider = HttpProvider::new("http://127.0.0.1:9").unwrap();
        let (accounts_tx, mut accounts_rx) = mpsc::unbounded_channel();
        let (chain_tx, mut chain_rx) = mpsc::unbounded_channel();
        provider.on(ProviderEventKind::AccountsChanged, accounts_tx);
        provider.on(ProviderEventKind::ChainChanged, chain_tx);

        let mut last_chain = Some("0x1".to_string());
        if let Some(chain_id) = observe(&mut last_chain, "0x1234".to_string()) {
            provider.inner.dispatch(ProviderEvent::ChainChanged(chain_id));
        }

        assert_eq!(
            chain_rx.try_recv().unwrap(),
            ProviderEvent::ChainChanged("0x1234".to_string())
        );
        assert!(accounts_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_watcher_lifecycle() {
        // Nothing listens on this port; polls fail quietly
        let provider =
            HttpProvider::with_poll_interval("http://127.0.0.1:9", Duration::from_secs(60))
                .unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();

        provider.on(ProviderEventKind::AccountsChanged, tx.clone());
        provider.on(ProviderEventKind::ChainChanged, tx);
        assert!(provider.inner.watcher.lock().is_some());

        provider.remove_all_listeners(ProviderEventKind::AccountsChanged);
        assert!(provider.inner.watcher.lock().is_some());

        provider.remove_all_listeners(ProviderEventKind::ChainChanged);
        assert!(provider.inner.watcher.lock().is_none());
    }
}
