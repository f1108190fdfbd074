//! Per-key rate limiting.
//!
//! Two pieces:
//!
//! 1. **TokenBucket** (`limiter.rs`): a single limiter. Tokens refill
//!    continuously at `rate` per second up to `burst`; `allow` is a
//!    non-blocking test-and-decrement, `wait` suspends until a token arrives or
//!    the caller gives up.
//!
//! 2. **RateLimiterPool** (`pool.rs`): a lazily populated `key -> TokenBucket`
//!    map behind one `RwLock`. Lookups take the read lock; a miss re-checks
//!    under the write lock so a key's limiter is created once even under races.
//!
//! # Example Usage
//!
//! ```
//! use grpcx::security::RateLimiterPool;
//!
//! // 50 events per second, bursts of up to 100
//! let pool = RateLimiterPool::new(50.0, 100)?;
//!
//! if !pool.allow("192.168.1.1") {
//!     // reject with ResourceExhausted
//! }
//! # Ok::<(), grpcx::GrpcxError>(())
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [rate_limit]
//! enabled = true
//! requests_per_second = 50
//! burst = 100
//! limit_by = "peer"
//! ```

mod limiter;
mod pool;

pub use limiter::{RateLimitResult, TokenBucket};
pub use pool::{RateLimiterPool, DEFAULT_BURST, DEFAULT_CLEAN_INTERVAL, DEFAULT_RATE};
