use std::future::ready;
use std::sync::Arc;

use crate::chain::{BoxFuture, CallResult, ServerStream, StreamHandler, StreamInterceptor};
use crate::chain::{UnaryHandler, UnaryInterceptor};
use crate::config::LimitBy;
use crate::context::{peer_addr, CallContext};
use crate::logger::{default_logger, SharedLogger};
use crate::security::RateLimiterPool;
use crate::status::Status;
use crate::telemetry::Metrics;

const UNKNOWN_PEER: &str = "unknown";

/// Asks the pool for a token before every call and rejects with
/// `ResourceExhausted` when none is left. Never waits.
#[derive(Clone)]
pub struct RateLimit {
    pool: Arc<RateLimiterPool>,
    limit_by: LimitBy,
    logger: SharedLogger,
    metrics: Option<Arc<Metrics>>,
}

impl RateLimit {
    pub fn new(pool: Arc<RateLimiterPool>, limit_by: LimitBy) -> Self {
        Self { pool, limit_by, logger: default_logger(), metrics: None }
    }

    /// One bucket per transport peer IP.
    pub fn per_peer(pool: Arc<RateLimiterPool>) -> Self {
        Self::new(pool, LimitBy::Peer)
    }

    /// One bucket per fully-qualified method.
    pub fn per_method(pool: Arc<RateLimiterPool>) -> Self {
        Self::new(pool, LimitBy::Method)
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn pool(&self) -> &Arc<RateLimiterPool> {
        &self.pool
    }

    pub fn limit_by(&self) -> LimitBy {
        self.limit_by
    }

    fn check(&self, ctx: &CallContext) -> Result<(), Status> {
        let peer = peer_addr(ctx).unwrap_or_else(|| UNKNOWN_PEER.to_string());
        let key = match self.limit_by {
            LimitBy::Peer => peer.as_str(),
            LimitBy::Method => ctx.full_method(),
        };
        let strategy = self.limit_by.as_str();

        if self.pool.allow(key) {
            if let Some(m) = &self.metrics {
                m.record_rate_limit_allowed(strategy);
            }
            return Ok(());
        }

        self.logger.error(format_args!(
            "host [{}] request [{}] is rejected by {} ratelimiter",
            peer,
            ctx.full_method(),
            strategy
        ));
        if let Some(m) = &self.metrics {
            m.record_rate_limit_rejection(strategy, ctx.full_method());
        }
        Err(Status::resource_exhausted(format!(
            "host [{}] request [{}] is rejected by ratelimiter",
            peer,
            ctx.full_method()
        )))
    }
}

impl<Req, Resp> UnaryInterceptor<Req, Resp> for RateLimit
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn intercept(
        &self,
        ctx: CallContext,
        req: Req,
        next: UnaryHandler<Req, Resp>,
    ) -> BoxFuture<CallResult<Resp>> {
        match self.check(&ctx) {
            Ok(()) => next(ctx, req),
            Err(status) => Box::pin(ready(Err(status))),
        }
    }
}

impl<S: ServerStream> StreamInterceptor<S> for RateLimit {
    fn intercept(&self, stream: S, next: StreamHandler<S>) -> BoxFuture<CallResult<()>> {
        match self.check(stream.context()) {
            Ok(()) => next(stream),
            Err(status) => Box::pin(ready(Err(status))),
        }
    }
}
