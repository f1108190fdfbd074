//! Standard interceptors.
//!
//! Each implements both [`UnaryInterceptor`] and [`StreamInterceptor`], takes
//! its logger at construction and optionally records metrics.
//! [`Interceptors::from_config`] assembles the usual stack:
//!
//! ```text
//! recovery -> logging -> metrics -> ip filter -> rate limit -> handler
//! ```

mod access;
mod logging;
mod metrics;
mod rate_limit;
mod recovery;
mod unknown;

pub use access::IpFilter;
pub use logging::Logging;
pub use metrics::MetricsInterceptor;
pub use rate_limit::RateLimit;
pub use recovery::Recovery;
pub use unknown::unknown_method_handler;

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::chain::{ServerStream, StreamChain, UnaryChain};
use crate::chain::{StreamInterceptor, UnaryInterceptor};
use crate::config::Config;
use crate::error::Result;
use crate::logger::SharedLogger;
use crate::security::{IpAccessList, RateLimiterPool};
use crate::telemetry::Metrics;

/// The configured interceptor set, ready to be turned into chains.
#[derive(Clone)]
pub struct Interceptors {
    recovery: Recovery,
    logging: Logging,
    metrics: Option<MetricsInterceptor>,
    ip_filter: Option<IpFilter>,
    rate_limit: Option<RateLimit>,
    sweep: Option<(Duration, Duration)>,
}

impl Interceptors {
    /// Build the stack described by `config`.
    ///
    /// Fails when the rate limit section describes an invalid pool.
    pub fn from_config(
        config: &Config,
        logger: SharedLogger,
        metrics: Option<Arc<Metrics>>,
    ) -> Result<Self> {
        let mut recovery = Recovery::new(&config.role).with_logger(Arc::clone(&logger));
        if let Some(m) = &metrics {
            recovery = recovery.with_metrics(Arc::clone(m));
        }

        let logging = Logging::new(&config.role).with_logger(Arc::clone(&logger));

        let ip_filter = IpAccessList::from_config(&config.ip_filter).map(|list| {
            let filter = IpFilter::new(list).with_logger(Arc::clone(&logger));
            match &metrics {
                Some(m) => filter.with_metrics(Arc::clone(m)),
                None => filter,
            }
        });

        let rl = &config.rate_limit;
        let rate_limit = if rl.enabled {
            let pool = Arc::new(RateLimiterPool::new(rl.requests_per_second, rl.burst)?);
            let limiter = RateLimit::new(pool, rl.limit_by).with_logger(Arc::clone(&logger));
            Some(match &metrics {
                Some(m) => limiter.with_metrics(Arc::clone(m)),
                None => limiter,
            })
        } else {
            None
        };

        let sweep = match (rl.enabled, rl.idle_timeout_secs) {
            (true, Some(idle)) => Some((
                Duration::from_secs(rl.clean_interval_secs),
                Duration::from_secs(idle),
            )),
            _ => None,
        };

        info!(
            role = %config.role,
            ip_filter = ?config.ip_filter.mode,
            rate_limit = rl.enabled,
            limit_by = rl.limit_by.as_str(),
            "interceptors configured"
        );

        Ok(Self {
            recovery,
            logging,
            metrics: metrics.map(MetricsInterceptor::new),
            ip_filter,
            rate_limit,
            sweep,
        })
    }

    pub fn rate_limiter_pool(&self) -> Option<&Arc<RateLimiterPool>> {
        self.rate_limit.as_ref().map(RateLimit::pool)
    }

    pub fn unary_chain<Req, Resp>(&self) -> UnaryChain<Req, Resp>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
    {
        let mut chain: Vec<Arc<dyn UnaryInterceptor<Req, Resp>>> =
            vec![Arc::new(self.recovery.clone()), Arc::new(self.logging.clone())];
        if let Some(m) = &self.metrics {
            chain.push(Arc::new(m.clone()));
        }
        if let Some(f) = &self.ip_filter {
            chain.push(Arc::new(f.clone()));
        }
        if let Some(r) = &self.rate_limit {
            chain.push(Arc::new(r.clone()));
        }
        UnaryChain::new(chain)
    }

    pub fn stream_chain<S: ServerStream>(&self) -> StreamChain<S> {
        let mut chain: Vec<Arc<dyn StreamInterceptor<S>>> =
            vec![Arc::new(self.recovery.clone()), Arc::new(self.logging.clone())];
        if let Some(m) = &self.metrics {
            chain.push(Arc::new(m.clone()));
        }
        if let Some(f) = &self.ip_filter {
            chain.push(Arc::new(f.clone()));
        }
        if let Some(r) = &self.rate_limit {
            chain.push(Arc::new(r.clone()));
        }
        StreamChain::new(chain)
    }

    /// Start the idle-limiter sweeper when the configuration asks for one.
    pub fn spawn_sweeper(&self, cancel: CancellationToken) -> Option<JoinHandle<()>> {
        let (interval, idle) = self.sweep?;
        let pool = self.rate_limiter_pool()?;
        Some(pool.spawn_sweeper(interval, idle, cancel))
    }
}
