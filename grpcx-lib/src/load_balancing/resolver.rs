use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{Resolver, Update, Watcher};
use crate::config::DiscoveryConfig;
use crate::error::{GrpcxError, Result};

/// Each watcher buffers at most one undelivered batch.
const WATCHER_BUFFER: usize = 1;

/// Resolver over a fixed, explicitly managed address set.
///
/// `add` and `remove` wait for each open watcher to have room for the new
/// batch, so a watcher nobody drains holds them up. The resolver lock is
/// released before any of that waiting happens. Concurrent `add`/`remove`
/// calls run one at a time, so every watcher sees batches in the order the
/// address set changed.
#[derive(Debug, Default)]
pub struct FixedAddressResolver {
    state: Mutex<ResolverState>,
    // held from mutation until the batch is delivered
    send_lock: AsyncMutex<()>,
}

#[derive(Debug, Default)]
struct ResolverState {
    addrs: Vec<String>,
    watchers: Vec<WatcherSlot>,
}

#[derive(Debug, Clone)]
struct WatcherSlot {
    tx: mpsc::Sender<Vec<Update>>,
    closed: CancellationToken,
}

impl WatcherSlot {
    fn is_open(&self) -> bool {
        !self.closed.is_cancelled() && !self.tx.is_closed()
    }
}

impl FixedAddressResolver {
    /// Seed the resolver. Repeated addresses are kept once.
    pub fn new<I, S>(addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for addr in addrs {
            let addr = addr.into();
            if !unique.contains(&addr) {
                unique.push(addr);
            }
        }
        Self {
            state: Mutex::new(ResolverState { addrs: unique, watchers: Vec::new() }),
            send_lock: AsyncMutex::new(()),
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(config.addresses.iter().cloned())
    }

    /// Snapshot of the addresses currently held.
    pub fn addresses(&self) -> Vec<String> {
        self.lock().addrs.clone()
    }

    /// Number of watchers that have not been closed.
    pub fn watcher_count(&self) -> usize {
        self.lock().watchers.iter().filter(|w| w.is_open()).count()
    }

    /// Add `address` and announce it to every open watcher.
    pub async fn add(&self, address: impl Into<String>) -> Result<()> {
        let address = address.into();
        let _sending = self.send_lock.lock().await;
        let targets = {
            let mut state = self.lock();
            if state.addrs.contains(&address) {
                return Err(GrpcxError::DuplicateAddress(address));
            }
            state.addrs.push(address.clone());
            state.open_watchers()
        };
        debug!(address = %address, watchers = targets.len(), "address added");
        broadcast(targets, vec![Update::add(address)]).await;
        Ok(())
    }

    /// Remove `address` and announce the removal to every open watcher.
    pub async fn remove(&self, address: &str) -> Result<()> {
        let _sending = self.send_lock.lock().await;
        let targets = {
            let mut state = self.lock();
            let Some(pos) = state.addrs.iter().position(|a| a == address) else {
                return Err(GrpcxError::UnknownAddress(address.to_string()));
            };
            state.addrs.remove(pos);
            state.open_watchers()
        };
        debug!(address, watchers = targets.len(), "address removed");
        broadcast(targets, vec![Update::delete(address)]).await;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResolverState {
    /// Drop closed watchers and return the rest.
    fn open_watchers(&mut self) -> Vec<WatcherSlot> {
        self.watchers.retain(WatcherSlot::is_open);
        self.watchers.clone()
    }
}

async fn broadcast(targets: Vec<WatcherSlot>, batch: Vec<Update>) {
    for slot in targets {
        tokio::select! {
            biased;
            _ = slot.closed.cancelled() => {}
            sent = slot.tx.send(batch.clone()) => {
                if sent.is_err() {
                    debug!("watcher dropped before receiving update");
                }
            }
        }
    }
}

impl Resolver for FixedAddressResolver {
    type Watcher = AddressWatcher;

    /// New watcher whose first batch adds every address currently held.
    ///
    /// The target name is not interpreted.
    fn resolve(&self, target: &str) -> Result<AddressWatcher> {
        let (tx, rx) = mpsc::channel(WATCHER_BUFFER);
        let closed = CancellationToken::new();

        let mut state = self.lock();
        let initial: Vec<Update> = state.addrs.iter().map(Update::add).collect();
        tx.try_send(initial).map_err(|_| GrpcxError::WatcherClosed)?;
        state.watchers.retain(WatcherSlot::is_open);
        state.watchers.push(WatcherSlot { tx, closed: closed.clone() });
        debug!(resolve_target = target, addresses = state.addrs.len(), "watcher created");

        Ok(AddressWatcher { rx: AsyncMutex::new(rx), closed })
    }
}

/// Receives address update batches from a [`FixedAddressResolver`].
///
/// Open until [`close`](Watcher::close); afterwards every `next` fails with
/// `WatcherClosed` at once, even when a batch is still buffered.
#[derive(Debug)]
pub struct AddressWatcher {
    rx: AsyncMutex<mpsc::Receiver<Vec<Update>>>,
    closed: CancellationToken,
}

impl AddressWatcher {
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

impl Watcher for AddressWatcher {
    async fn next(&self) -> Result<Vec<Update>> {
        let mut rx = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return Err(GrpcxError::WatcherClosed),
            rx = self.rx.lock() => rx,
        };
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(GrpcxError::WatcherClosed),
            batch = rx.recv() => batch.ok_or(GrpcxError::WatcherClosed),
        }
    }

    fn close(&self) {
        self.closed.cancel();
    }
}
