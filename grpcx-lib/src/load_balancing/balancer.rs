use std::sync::{Arc, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{AddressWatcher, FixedAddressResolver, Op, Resolver, RoundRobin, Update, Watcher};
use crate::error::{GrpcxError, Result};

/// Keeps a member list in sync with a watcher and hands members out in turn.
#[derive(Debug, Default)]
pub struct RoundRobinBalancer {
    members: RwLock<Vec<String>>,
    cursor: RoundRobin,
}

impl RoundRobinBalancer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one update batch. Adding a present member or deleting an absent
    /// one is a no-op.
    pub fn apply(&self, updates: &[Update]) {
        let mut members = self.members.write().unwrap_or_else(PoisonError::into_inner);
        for update in updates {
            match update.op {
                Op::Add => {
                    if !members.contains(&update.addr) {
                        members.push(update.addr.clone());
                    }
                }
                Op::Delete => members.retain(|m| m != &update.addr),
            }
        }
    }

    /// Next member in rotation, or `None` while the list is empty.
    pub fn pick(&self) -> Option<String> {
        let members = self.members.read().unwrap_or_else(PoisonError::into_inner);
        self.cursor.pick(members.as_slice()).cloned()
    }

    pub fn members(&self) -> Vec<String> {
        self.members.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Drain `watcher` into the member list until it is closed.
    pub async fn run<W: Watcher>(&self, watcher: &W) -> Result<()> {
        loop {
            match watcher.next().await {
                Ok(batch) => {
                    debug!(updates = batch.len(), "applying address updates");
                    self.apply(&batch);
                }
                Err(GrpcxError::WatcherClosed) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }
}

/// A resolver plus a balancer fed from one of its watchers in the background.
///
/// Dropping it closes the watcher, which ends the feeding task; use
/// [`shutdown`](Self::shutdown) to also wait for that task.
pub struct MultiAddrBalancer {
    resolver: Arc<FixedAddressResolver>,
    balancer: Arc<RoundRobinBalancer>,
    watcher: Arc<AddressWatcher>,
    task: Option<JoinHandle<()>>,
}

impl MultiAddrBalancer {
    pub fn resolver(&self) -> &Arc<FixedAddressResolver> {
        &self.resolver
    }

    pub fn balancer(&self) -> &Arc<RoundRobinBalancer> {
        &self.balancer
    }

    pub fn pick(&self) -> Option<String> {
        self.balancer.pick()
    }

    /// Close the watcher and wait for the feeding task to finish.
    pub async fn shutdown(mut self) {
        self.watcher.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "balancer task ended abnormally");
            }
        }
    }
}

impl Drop for MultiAddrBalancer {
    fn drop(&mut self) {
        self.watcher.close();
    }
}

/// Round-robin over a fixed address list that can be changed later through
/// [`MultiAddrBalancer::resolver`].
///
/// The seed addresses are applied before this returns, so `pick` succeeds
/// right away for a non-empty list.
pub async fn multi_addr_balancer<I, S>(addrs: I) -> Result<MultiAddrBalancer>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let resolver = Arc::new(FixedAddressResolver::new(addrs));
    let watcher = Arc::new(resolver.resolve("")?);
    let balancer = Arc::new(RoundRobinBalancer::new());

    balancer.apply(&watcher.next().await?);

    let task = {
        let balancer = Arc::clone(&balancer);
        let watcher = Arc::clone(&watcher);
        tokio::spawn(async move {
            if let Err(e) = balancer.run(watcher.as_ref()).await {
                warn!(error = %e, "address watcher failed");
            }
        })
    };

    Ok(MultiAddrBalancer { resolver, balancer, watcher, task: Some(task) })
}
