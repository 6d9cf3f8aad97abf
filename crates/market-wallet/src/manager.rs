//! Wallet Session Manager
//!
//! Single writer for the [`Session`]. Readers get clones or a `watch`
//! receiver; provider events are funnelled through one listener task so
//! state transitions are applied in the order the wallet fired them.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use market_provider::{ProviderEvent, ProviderEventKind, WalletProvider};

use crate::error::WalletError;
use crate::format::{formatted_address, formatted_balance};
use crate::network::NetworkConfig;
use crate::rpc::{Rpc, Timeouts};
use crate::session::Session;
use crate::Result;

struct Shared {
    rpc: Option<Rpc>,
    network: NetworkConfig,
    session: watch::Sender<Session>,
    /// Bumped on every account or chain transition; balance reads started
    /// under an older value are dropped
    generation: AtomicU64,
    /// Bumped by `disconnect`; an in-flight connect or restore started under
    /// an older value does not commit
    disconnects: AtomicU64,
    /// Event listener task while attached
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    /// Start a new generation. Call only from inside a session write.
    fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn disconnect_epoch(&self) -> u64 {
        self.disconnects.load(Ordering::SeqCst)
    }

    fn apply_event(self: &Arc<Self>, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
                None => {
                    self.session.send_modify(|s| {
                        s.reset();
                        self.advance();
                    });
                    tracing::info!("Wallet reported no accounts; session cleared");
                }
                Some(account) => {
                    let mut generation = 0;
                    self.session.send_modify(|s| {
                        s.adopt_account(account.clone());
                        generation = self.advance();
                    });
                    tracing::info!(account = %account, "Wallet account changed");
                    self.spawn_balance_refresh(account, generation);
                }
            },
            ProviderEvent::ChainChanged(chain_id) => {
                let mut account = None;
                let mut generation = 0;
                self.session.send_modify(|s| {
                    s.chain_id = Some(chain_id.clone());
                    account = s.account.clone();
                    generation = self.advance();
                });
                tracing::info!(
                    chain_id = %chain_id,
                    on_target = self.network.chain_id == chain_id,
                    "Wallet chain changed"
                );
                if let Some(account) = account {
                    self.spawn_balance_refresh(account, generation);
                }
            }
        }
    }

    fn spawn_balance_refresh(self: &Arc<Self>, account: String, generation: u64) {
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            shared.refresh_balance_for(&account, generation).await;
        });
    }

    /// Read and store the balance of `account`. Failures are logged only. The
    /// result is dropped if the account changed or another account or chain
    /// transition happened after `generation` was taken.
    async fn refresh_balance_for(&self, account: &str, generation: u64) {
        let Some(rpc) = self.rpc.as_ref() else {
            return;
        };

        match rpc.balance(account, self.network.decimals()).await {
            Ok(balance) => {
                let applied = self.session.send_if_modified(|s| {
                    if s.account.as_deref() == Some(account)
                        && self.current_generation() == generation
                    {
                        s.balance = balance;
                        true
                    } else {
                        false
                    }
                });
                if applied {
                    tracing::debug!(account = %account, balance, "Balance refreshed");
                } else {
                    tracing::debug!(account = %account, "Discarding stale balance");
                }
            }
            Err(e) => {
                tracing::warn!(account = %account, "Failed to refresh balance: {}", e);
            }
        }
    }

    fn detach(&self) {
        let Some(task) = self.listener.lock().take() else {
            return;
        };

        if let Some(rpc) = self.rpc.as_ref() {
            rpc.provider().remove_all_listeners(ProviderEventKind::AccountsChanged);
            rpc.provider().remove_all_listeners(ProviderEventKind::ChainChanged);
        }
        task.abort();

        tracing::debug!("Detached from wallet provider events");
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.detach();
    }
}

async fn run_listener(shared: Weak<Shared>, mut events: mpsc::UnboundedReceiver<ProviderEvent>) {
    while let Some(event) = events.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.apply_event(event);
    }
}

/// Clears `loading` when a `connect` call ends, however it ends.
struct LoadingGuard<'a> {
    session: &'a watch::Sender<Session>,
}

impl<'a> LoadingGuard<'a> {
    fn start(session: &'a watch::Sender<Session>) -> Self {
        session.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        Self { session }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.session.send_modify(|s| s.loading = false);
    }
}

/// Owns the wallet session for one running storefront.
///
/// Cloning yields another handle to the same session. Event subscriptions
/// are removed by [`detach`](Self::detach) or when the last handle drops.
#[derive(Clone)]
pub struct WalletSessionManager {
    shared: Arc<Shared>,
    /// Held for the whole `connect` sequence
    connect_lock: Arc<tokio::sync::Mutex<()>>,
}

impl WalletSessionManager {
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        network: NetworkConfig,
        timeouts: Timeouts,
    ) -> Self {
        let (session, _) = watch::channel(Session::new());

        Self {
            shared: Arc::new(Shared {
                rpc: provider.map(|p| Rpc::new(p, timeouts)),
                network,
                session,
                generation: AtomicU64::new(0),
                disconnects: AtomicU64::new(0),
                listener: Mutex::new(None),
            }),
            connect_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    // === State ===

    pub fn session(&self) -> Session {
        self.shared.session()
    }

    /// Receiver that observes every session change
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.shared.session.subscribe()
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.shared.network
    }

    pub fn is_provider_available(&self) -> bool {
        self.shared.rpc.is_some()
    }

    pub fn is_on_target_network(&self) -> bool {
        self.shared
            .network
            .matches_chain(self.shared.session.borrow().chain_id.as_deref())
    }

    pub fn formatted_address(&self) -> String {
        formatted_address(self.shared.session.borrow().account.as_deref())
    }

    pub fn formatted_balance(&self) -> String {
        formatted_balance(self.shared.session.borrow().display_balance())
    }

    // === Actions ===

    /// Ask the wallet for an account, move it to the target network and read
    /// the balance. The error message of a failed attempt is kept in the
    /// session for display; the user may simply try again.
    pub async fn connect(&self) -> Result<Session> {
        let Some(rpc) = self.shared.rpc.as_ref() else {
            let err = WalletError::ProviderAbsent;
            self.shared
                .session
                .send_modify(|s| s.error = Some(err.to_string()));
            return Err(err);
        };

        let Ok(_in_flight) = self.connect_lock.try_lock() else {
            tracing::warn!("Ignoring connect request while another is in flight");
            return Err(WalletError::ConnectInProgress);
        };

        let loading = LoadingGuard::start(&self.shared.session);
        let epoch = self.shared.disconnect_epoch();

        let (account, chain_id) = match self.establish(rpc).await {
            Ok(connection) => connection,
            Err(e) => {
                tracing::error!("Failed to connect wallet: {}", e);
                self.shared
                    .session
                    .send_modify(|s| s.error = Some(e.to_string()));
                return Err(e);
            }
        };

        let Some(generation) = self.commit(epoch, &account, Some(chain_id.clone())) else {
            tracing::info!(
                account = %account,
                "Wallet disconnected during connect; not committing"
            );
            return Err(WalletError::Cancelled);
        };

        tracing::info!(
            account = %account,
            chain_id = %chain_id,
            on_target = self.shared.network.chain_id == chain_id,
            "Wallet connected"
        );

        self.shared.refresh_balance_for(&account, generation).await;

        drop(loading);
        Ok(self.session())
    }

    /// Store the account and chain unless `disconnect` ran after `epoch` was
    /// taken. Returns the new generation on success.
    fn commit(&self, epoch: u64, account: &str, chain_id: Option<String>) -> Option<u64> {
        let mut generation = None;
        self.shared.session.send_if_modified(|s| {
            if self.shared.disconnect_epoch() != epoch {
                return false;
            }
            s.adopt_account(account.to_string());
            s.chain_id = chain_id;
            generation = Some(self.shared.advance());
            true
        });
        generation
    }

    /// Account access, then the network check, then a fresh chain id read.
    async fn establish(&self, rpc: &Rpc) -> Result<(String, String)> {
        let account = rpc
            .request_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(WalletError::NoAccounts)?;

        let network = &self.shared.network;
        match rpc.switch_chain(&network.chain_id).await {
            Ok(()) => {}
            Err(WalletError::UnrecognizedNetwork(_)) => {
                tracing::info!(
                    chain_id = %network.chain_id,
                    chain_name = %network.chain_name,
                    "Target network unknown to wallet; requesting registration"
                );
                rpc.add_chain(network).await?;
            }
            Err(e) => return Err(e),
        }

        let chain_id = rpc.chain_id().await?;
        Ok((account, chain_id))
    }

    /// Forget the connection. Wallets offer no programmatic disconnect, so
    /// the provider is not contacted.
    pub fn disconnect(&self) {
        self.shared.session.send_modify(|s| {
            s.reset();
            self.shared.disconnects.fetch_add(1, Ordering::SeqCst);
            self.shared.advance();
        });
        tracing::info!("Wallet disconnected");
    }

    /// Re-read the balance of the current account, if any.
    pub async fn refresh_balance(&self) {
        let (account, generation) = {
            let session = self.shared.session.borrow();
            (session.account.clone(), self.shared.current_generation())
        };
        let Some(account) = account else {
            return;
        };
        self.shared.refresh_balance_for(&account, generation).await;
    }

    /// Pick up a connection the user approved in an earlier visit, without
    /// prompting. Returns whether a session was restored.
    pub async fn restore(&self) -> bool {
        let Some(rpc) = self.shared.rpc.as_ref() else {
            return false;
        };

        let Ok(_in_flight) = self.connect_lock.try_lock() else {
            return false;
        };
        let epoch = self.shared.disconnect_epoch();

        let account = match rpc.accounts().await {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(account) => account,
                None => return false,
            },
            Err(e) => {
                tracing::warn!("Failed to check existing wallet connection: {}", e);
                return false;
            }
        };

        let chain_id = match rpc.chain_id().await {
            Ok(chain_id) => Some(chain_id),
            Err(e) => {
                tracing::warn!("Failed to read chain id: {}", e);
                None
            }
        };

        let Some(generation) = self.commit(epoch, &account, chain_id) else {
            return false;
        };
        tracing::info!(account = %account, "Restored wallet session");

        self.shared.refresh_balance_for(&account, generation).await;
        true
    }

    // === Provider events ===

    /// Subscribe to `accountsChanged` and `chainChanged`. Must be called from
    /// within a Tokio runtime; calling it again while attached is a no-op.
    pub fn attach(&self) {
        let Some(rpc) = self.shared.rpc.as_ref() else {
            tracing::debug!("No wallet provider; skipping event subscriptions");
            return;
        };

        let mut listener = self.shared.listener.lock();
        if listener.is_some() {
            return;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::error!("Cannot attach to wallet events outside an async runtime");
                return;
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        rpc.provider().on(ProviderEventKind::AccountsChanged, tx.clone());
        rpc.provider().on(ProviderEventKind::ChainChanged, tx);

        *listener = Some(handle.spawn(run_listener(Arc::downgrade(&self.shared), rx)));
        tracing::debug!("Attached to wallet provider events");
    }

    pub fn detach(&self) {
        self.shared.detach();
    }

    pub fn is_attached(&self) -> bool {
        self.shared.listener.lock().is_some()
    }
}
