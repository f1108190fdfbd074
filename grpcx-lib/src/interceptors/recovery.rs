use futures::FutureExt;
use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::chain::{BoxFuture, CallResult, ServerStream, StreamHandler, StreamInterceptor};
use crate::chain::{UnaryHandler, UnaryInterceptor};
use crate::context::CallContext;
use crate::logger::{default_logger, SharedLogger};
use crate::status::{panic_message, Status};
use crate::telemetry::metrics::values::{KIND_STREAM, KIND_UNARY};
use crate::telemetry::Metrics;

/// Turns a panic anywhere downstream into an `Internal` status.
///
/// The continuation runs inside `catch_unwind`, so a panic raised while
/// building the downstream future or while polling it is caught here and
/// never reaches the serving runtime.
#[derive(Clone)]
pub struct Recovery {
    role: Arc<str>,
    logger: SharedLogger,
    metrics: Option<Arc<Metrics>>,
}

impl Recovery {
    pub fn new(role: impl AsRef<str>) -> Self {
        Self { role: Arc::from(role.as_ref()), logger: default_logger(), metrics: None }
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Log and convert a caught panic.
    ///
    /// The stack has already unwound by now, so the logged backtrace ends at
    /// this interceptor rather than at the panic site. The panic hook reports
    /// the panic location itself.
    fn recover(&self, kind: &str, method: &str, payload: Box<dyn Any + Send>) -> Status {
        let backtrace = Backtrace::force_capture();
        self.logger.error(format_args!(
            "[{}] grpc {} {} panic recovery, err: {}\nrecovery backtrace:\n{}",
            self.role,
            kind,
            method,
            panic_message(payload.as_ref()),
            backtrace
        ));
        if let Some(m) = &self.metrics {
            m.record_panic_recovered(kind, method);
        }
        Status::from_panic(payload.as_ref())
    }
}

impl<Req, Resp> UnaryInterceptor<Req, Resp> for Recovery
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
        let method = ctx.full_method().to_string();
        Box::pin(async move {
            let guarded = AssertUnwindSafe(async move { next(ctx, req).await });
            match guarded.catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(this.recover(KIND_UNARY, &method, payload)),
            }
        })
    }
}

impl<S: ServerStream> StreamInterceptor<S> for Recovery {
    fn intercept(&self, stream: S, next: StreamHandler<S>) -> BoxFuture<CallResult<()>> {
        let this = self.clone();
        let method = stream.context().full_method().to_string();
        Box::pin(async move {
            let guarded = AssertUnwindSafe(async move { next(stream).await });
            match guarded.catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(this.recover(KIND_STREAM, &method, payload)),
            }
        })
    }
}
