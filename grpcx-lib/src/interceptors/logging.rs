use std::sync::Arc;
use tokio::time::Instant;

use crate::chain::{BoxFuture, CallResult, ServerStream, StreamHandler, StreamInterceptor};
use crate::chain::{UnaryHandler, UnaryInterceptor};
use crate::context::CallContext;
use crate::logger::{default_logger, SharedLogger};

/// Logs a begin line before the continuation and a finish line with the
/// elapsed time after it, whatever the outcome.
#[derive(Clone)]
pub struct Logging {
    role: Arc<str>,
    logger: SharedLogger,
}

impl Logging {
    pub fn new(role: impl AsRef<str>) -> Self {
        Self { role: Arc::from(role.as_ref()), logger: default_logger() }
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }
}

impl<Req, Resp> UnaryInterceptor<Req, Resp> for Logging
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
        let this = self.clone();
        Box::pin(async move {
            let method = ctx.full_method().to_string();
            let start = Instant::now();
            this.logger
                .info(format_args!("[{}] begin grpc unary request {}", this.role, method));

            let result = next(ctx, req).await;

            this.logger.info(format_args!(
                "[{}] finish grpc unary request {}, cost: {:?}",
                this.role,
                method,
                start.elapsed()
            ));
            result
        })
    }
}

impl<S: ServerStream> StreamInterceptor<S> for Logging {
    fn intercept(&self, stream: S, next: StreamHandler<S>) -> BoxFuture<CallResult<()>> {
        let this = self.clone();
        Box::pin(async move {
            let method = stream.context().full_method().to_string();
            let start = Instant::now();
            this.logger
                .info(format_args!("[{}] begin grpc stream request {}", this.role, method));

            let result = next(stream).await;

            this.logger.info(format_args!(
                "[{}] finish grpc stream request {}, cost: {:?}",
                this.role,
                method,
                start.elapsed()
            ));
            result
        })
    }
}
