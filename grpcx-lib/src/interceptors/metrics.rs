use std::sync::Arc;
use tokio::time::Instant;

use crate::chain::{BoxFuture, CallResult, ServerStream, StreamHandler, StreamInterceptor};
use crate::chain::{UnaryHandler, UnaryInterceptor};
use crate::context::CallContext;
use crate::status::Code;
use crate::telemetry::metrics::values::{KIND_STREAM, KIND_UNARY};
use crate::telemetry::Metrics;

/// Records call count and latency per method, labelled with the status code.
#[derive(Clone)]
pub struct MetricsInterceptor {
    metrics: Arc<Metrics>,
}

impl MetricsInterceptor {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

fn code_of<T>(result: &CallResult<T>) -> Code {
    match result {
        Ok(_) => Code::Ok,
        Err(status) => status.code(),
    }
}

impl<Req, Resp> UnaryInterceptor<Req, Resp> for MetricsInterceptor
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
        let metrics = Arc::clone(&self.metrics);
        Box::pin(async move {
            let method = ctx.full_method().to_string();
            let start = Instant::now();
            let result = next(ctx, req).await;
            metrics.record_request(
                KIND_UNARY,
                &method,
                code_of(&result).as_str(),
                start.elapsed().as_secs_f64(),
            );
            result
        })
    }
}

impl<S: ServerStream> StreamInterceptor<S> for MetricsInterceptor {
    fn intercept(&self, stream: S, next: StreamHandler<S>) -> BoxFuture<CallResult<()>> {
        let metrics = Arc::clone(&self.metrics);
        Box::pin(async move {
            let method = stream.context().full_method().to_string();
            let start = Instant::now();
            let result = next(stream).await;
            metrics.record_request(
                KIND_STREAM,
                &method,
                code_of(&result).as_str(),
                start.elapsed().as_secs_f64(),
            );
            result
        })
    }
}
