use ahash::AHashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{RateLimitResult, TokenBucket};
use crate::error::{GrpcxError, Result};

pub const DEFAULT_RATE: f64 = 50.0;
pub const DEFAULT_BURST: u32 = 100;
pub const DEFAULT_CLEAN_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Keyed collection of token buckets sharing one rate/burst policy.
///
/// Limiters are created lazily the first time a key is seen. Each key gets its
/// own bucket, so one noisy caller (or method) cannot drain capacity meant for
/// another.
pub struct RateLimiterPool {
    rate: f64,
    burst: NonZeroU32,
    limiters: RwLock<AHashMap<String, Arc<TokenBucket>>>,
}

impl RateLimiterPool {
    /// Create a pool whose limiters refill at `rate` tokens per second and hold
    /// at most `burst` tokens.
    pub fn new(rate: f64, burst: u32) -> Result<Self> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(GrpcxError::Config(format!(
                "rate limit must be a finite non-negative number, got {rate}"
            )));
        }
        let burst = NonZeroU32::new(burst)
            .ok_or_else(|| GrpcxError::Config("rate limit burst must be >= 1".to_string()))?;

        Ok(Self { rate, burst, limiters: RwLock::new(AHashMap::new()) })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn burst(&self) -> u32 {
        self.burst.get()
    }

    /// Number of keys currently holding a limiter.
    pub fn len(&self) -> usize {
        self.limiters.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the limiter for `key`, creating it on first use.
    ///
    /// Concurrent callers racing on an unseen key all receive the same instance.
    pub fn get_or_create(&self, key: &str) -> Arc<TokenBucket> {
        {
            let limiters = self.limiters.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(limiter) = limiters.get(key) {
                return Arc::clone(limiter);
            }
        }

        let mut limiters = self.limiters.write().unwrap_or_else(PoisonError::into_inner);
        let limiter = limiters.entry(key.to_string()).or_insert_with(|| {
            debug!(key, rate = self.rate, burst = self.burst.get(), "creating rate limiter");
            Arc::new(TokenBucket::new(self.rate, self.burst))
        });
        Arc::clone(limiter)
    }

    /// Consume one token for `key` if available.
    pub fn allow(&self, key: &str) -> bool {
        self.get_or_create(key).allow()
    }

    /// Like [`allow`](Self::allow) but reports remaining capacity or retry delay.
    pub fn check(&self, key: &str) -> RateLimitResult {
        self.get_or_create(key).check()
    }

    /// Wait for a token for `key` until one is available or `cancel` fires.
    pub async fn wait(&self, key: &str, cancel: &CancellationToken) -> Result<()> {
        let limiter = self.get_or_create(key);
        limiter.wait(cancel).await
    }

    /// Wait for a token for `key`, giving up at `deadline` or when `cancel` fires.
    pub async fn wait_until(
        &self,
        key: &str,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let limiter = self.get_or_create(key);
        limiter.wait_until(deadline, cancel).await
    }

    /// Drop limiters idle for at least `idle` whose bucket has refilled.
    ///
    /// Only buckets that a fresh limiter would reproduce exactly are removed,
    /// so eviction never grants a caller extra capacity. A limiter still held
    /// outside the pool (for example by a pending `wait`) is kept, so the key
    /// never splits across two buckets. Returns the number of keys removed.
    pub fn evict_idle(&self, idle: Duration) -> usize {
        let now = Instant::now();
        let mut limiters = self.limiters.write().unwrap_or_else(PoisonError::into_inner);
        let before = limiters.len();
        limiters
            .retain(|_, limiter| Arc::strong_count(limiter) > 1 || !limiter.is_idle(now, idle));
        before - limiters.len()
    }

    /// Run [`evict_idle`](Self::evict_idle) every `interval` until `cancel` fires.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        idle: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = pool.evict_idle(idle);
                        if evicted > 0 {
                            debug!(evicted, remaining = pool.len(), "evicted idle rate limiters");
                        }
                    }
                }
            }
        })
    }
}

impl Default for RateLimiterPool {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE,
            burst: NonZeroU32::new(DEFAULT_BURST).unwrap_or(NonZeroU32::MIN),
            limiters: RwLock::new(AHashMap::new()),
        }
    }
}

impl std::fmt::Debug for RateLimiterPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterPool")
            .field("rate", &self.rate)
            .field("burst", &self.burst)
            .field("keys", &self.len())
            .finish()
    }
}
