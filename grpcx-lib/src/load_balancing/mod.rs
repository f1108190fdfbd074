//! Fixed-address name resolution and round-robin selection.
//!
//! A [`FixedAddressResolver`] owns a mutable address set. Every call to
//! [`Resolver::resolve`] hands out a fresh [`AddressWatcher`] whose first batch
//! adds every address currently held; later `add`/`remove` calls push
//! one-element batches to every watcher still open. A [`RoundRobinBalancer`]
//! drains a watcher into its member list and picks members in turn.

mod balancer;
mod resolver;
mod round_robin;

pub use balancer::{multi_addr_balancer, MultiAddrBalancer, RoundRobinBalancer};
pub use resolver::{AddressWatcher, FixedAddressResolver};
pub use round_robin::RoundRobin;

use std::future::Future;

use crate::error::Result;

/// Whether an address joins or leaves the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Delete,
}

/// One change to the resolved address set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Update {
    pub op: Op,
    pub addr: String,
}

impl Update {
    pub fn add(addr: impl Into<String>) -> Self {
        Self { op: Op::Add, addr: addr.into() }
    }

    pub fn delete(addr: impl Into<String>) -> Self {
        Self { op: Op::Delete, addr: addr.into() }
    }
}

/// Produces watchers for a target name.
pub trait Resolver: Send + Sync {
    type Watcher: Watcher;

    fn resolve(&self, target: &str) -> Result<Self::Watcher>;
}

/// A stream of address update batches.
pub trait Watcher: Send + Sync {
    /// Wait for the next batch. Fails with `WatcherClosed` once closed.
    fn next(&self) -> impl Future<Output = Result<Vec<Update>>> + Send;

    fn close(&self);
}
