//! Token bucket limiter.
//!
//! Tokens accrue continuously at `rate` per second up to `burst`; each allowed
//! event consumes one. The bucket starts full.

use std::num::NonZeroU32;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{GrpcxError, Result};

// Absorbs float drift when a sleep lands exactly on a refill boundary.
const EPSILON: f64 = 1e-9;

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq)]
pub enum RateLimitResult {
    /// A token was consumed.
    Allowed {
        /// Bucket capacity
        limit: u32,
        /// Whole tokens left after this event
        remaining: u32,
    },
    /// No token was available; nothing was consumed.
    Limited {
        /// Bucket capacity
        limit: u32,
        /// Time until one token is available, `None` if the bucket never refills
        retry_after: Option<Duration>,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }

    pub fn is_limited(&self) -> bool {
        matches!(self, RateLimitResult::Limited { .. })
    }

    pub fn limit(&self) -> u32 {
        match self {
            RateLimitResult::Allowed { limit, .. } => *limit,
            RateLimitResult::Limited { limit, .. } => *limit,
        }
    }

    pub fn remaining(&self) -> u32 {
        match self {
            RateLimitResult::Allowed { remaining, .. } => *remaining,
            RateLimitResult::Limited { .. } => 0,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            RateLimitResult::Limited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
    last_used: Instant,
}

/// A single token bucket, safe to share between tasks.
#[derive(Debug)]
pub struct TokenBucket {
    rate: f64,
    burst: u32,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a full bucket refilling at `rate` tokens per second.
    ///
    /// A zero rate gives a bucket that never refills. Negative or non-finite
    /// rates are rejected by [`crate::security::RateLimiterPool::new`]; here they
    /// are clamped to zero.
    pub fn new(rate: f64, burst: NonZeroU32) -> Self {
        let rate = if rate.is_finite() && rate > 0.0 { rate } else { 0.0 };
        let now = Instant::now();
        Self {
            rate,
            burst: burst.get(),
            state: Mutex::new(BucketState {
                tokens: f64::from(burst.get()),
                last_refill: now,
                last_used: now,
            }),
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }

    /// Tokens available right now, after refill.
    pub fn tokens(&self) -> f64 {
        let mut state = self.lock();
        self.refill(&mut state, Instant::now());
        state.tokens
    }

    /// Consume one token if available.
    pub fn allow(&self) -> bool {
        self.check().is_allowed()
    }

    /// Consume one token if available, reporting what is left or when to retry.
    pub fn check(&self) -> RateLimitResult {
        self.check_at(Instant::now())
    }

    fn check_at(&self, now: Instant) -> RateLimitResult {
        let mut state = self.lock();
        self.refill(&mut state, now);
        state.last_used = now;

        if state.tokens + EPSILON >= 1.0 {
            state.tokens = (state.tokens - 1.0).max(0.0);
            RateLimitResult::Allowed { limit: self.burst, remaining: state.tokens as u32 }
        } else {
            RateLimitResult::Limited { limit: self.burst, retry_after: self.delay_for(state.tokens) }
        }
    }

    /// Wait until a token is available, or until `cancel` fires.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        self.wait_inner(None, cancel).await
    }

    /// Wait until a token is available, `deadline` passes, or `cancel` fires.
    ///
    /// Fails immediately with [`GrpcxError::DeadlineExceeded`] when the next
    /// token cannot arrive before `deadline`.
    pub async fn wait_until(&self, deadline: Instant, cancel: &CancellationToken) -> Result<()> {
        self.wait_inner(Some(deadline), cancel).await
    }

    // No token is held while suspended, so dropping or cancelling the wait
    // never leaks capacity.
    async fn wait_inner(&self, deadline: Option<Instant>, cancel: &CancellationToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(GrpcxError::Cancelled);
            }

            let now = Instant::now();
            let retry_after = match self.check_at(now) {
                RateLimitResult::Allowed { .. } => return Ok(()),
                RateLimitResult::Limited { retry_after, .. } => retry_after,
            };

            if let Some(deadline) = deadline {
                match retry_after.and_then(|delay| now.checked_add(delay)) {
                    Some(ready_at) if ready_at <= deadline => {}
                    _ => return Err(GrpcxError::DeadlineExceeded),
                }
            }

            match retry_after {
                Some(delay) => {
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(GrpcxError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => {
                    cancel.cancelled().await;
                    return Err(GrpcxError::Cancelled);
                }
            }
        }
    }

    /// True when the bucket has not been touched for `idle` and has refilled to
    /// capacity, i.e. it is indistinguishable from a freshly created one.
    pub(crate) fn is_idle(&self, now: Instant, idle: Duration) -> bool {
        let state = self.lock();
        if now.saturating_duration_since(state.last_used) < idle {
            return false;
        }
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens + elapsed * self.rate + EPSILON >= f64::from(self.burst)
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            state.tokens = (state.tokens + elapsed * self.rate).min(f64::from(self.burst));
            state.last_refill = now;
        }
    }

    /// Time until one token is available; `None` when that is never, or too
    /// far away to represent.
    fn delay_for(&self, tokens: f64) -> Option<Duration> {
        if self.rate <= 0.0 {
            return None;
        }
        let missing = (1.0 - tokens).max(0.0);
        Duration::try_from_secs_f64(missing / self.rate).ok()
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
