use ipnet::IpNet;
use std::future::ready;
use std::sync::Arc;

use crate::chain::{BoxFuture, CallResult, ServerStream, StreamHandler, StreamInterceptor};
use crate::chain::{UnaryHandler, UnaryInterceptor};
use crate::context::{caller_ip, parse_method, CallContext};
use crate::logger::{default_logger, SharedLogger};
use crate::security::{AccessMode, IpAccessList};
use crate::status::Status;
use crate::telemetry::Metrics;

/// Rejects callers by address before the continuation runs.
///
/// The caller address comes from the forwarded headers when present, else from
/// the transport peer.
#[derive(Clone)]
pub struct IpFilter {
    list: Arc<IpAccessList>,
    logger: SharedLogger,
    metrics: Option<Arc<Metrics>>,
}

impl IpFilter {
    pub fn new(list: IpAccessList) -> Self {
        Self { list: Arc::new(list), logger: default_logger(), metrics: None }
    }

    /// Only callers inside `networks` pass.
    pub fn allowlist(networks: Vec<IpNet>) -> Self {
        Self::new(IpAccessList::allow(networks))
    }

    /// Callers inside `networks` are rejected.
    pub fn denylist(networks: Vec<IpNet>) -> Self {
        Self::new(IpAccessList::deny(networks))
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn mode_name(&self) -> &'static str {
        match self.list.mode() {
            AccessMode::Allow => "allowlist",
            AccessMode::Deny => "denylist",
        }
    }

    fn check(&self, ctx: &CallContext) -> Result<(), Status> {
        let ip = caller_ip(ctx);
        let mode = self.mode_name();

        if self.list.permits(ip) {
            if let Some(m) = &self.metrics {
                m.record_ip_filter_allowed(mode);
            }
            return Ok(());
        }

        let host = ip.map(|ip| ip.to_string()).unwrap_or_default();
        let (_, call) = parse_method(ctx.full_method());
        self.logger.error(format_args!(
            "host [{}] request [{}] is rejected by ip {}",
            host,
            ctx.full_method(),
            mode
        ));
        if let Some(m) = &self.metrics {
            m.record_ip_filter_denied(mode);
        }
        Err(Status::resource_exhausted(format!(
            "host [{host}] is rejected by ip {mode} when calling {call}"
        )))
    }
}

impl<Req, Resp> UnaryInterceptor<Req, Resp> for IpFilter
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

impl<S: ServerStream> StreamInterceptor<S> for IpFilter {
    fn intercept(&self, stream: S, next: StreamHandler<S>) -> BoxFuture<CallResult<()>> {
        match self.check(stream.context()) {
            Ok(()) => next(stream),
            Err(status) => Box::pin(ready(Err(status))),
        }
    }
}
