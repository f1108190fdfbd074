pub mod ip_filter;
pub mod rate_limit;

pub use ip_filter::{is_ip_allowed, AccessMode, IpAccessList};
pub use rate_limit::{RateLimitResult, RateLimiterPool, TokenBucket};
