use std::future::Future;
use std::sync::Arc;

use super::{BoxFuture, CallResult};
use crate::context::CallContext;

/// Terminal or composed request handler.
pub type UnaryHandler<Req, Resp> =
    Arc<dyn Fn(CallContext, Req) -> BoxFuture<CallResult<Resp>> + Send + Sync>;

/// Wrap an async function as a [`UnaryHandler`].
pub fn unary_handler<Req, Resp, F, Fut>(f: F) -> UnaryHandler<Req, Resp>
where
    F: Fn(CallContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CallResult<Resp>> + Send + 'static,
{
    Arc::new(move |ctx: CallContext, req: Req| -> BoxFuture<CallResult<Resp>> {
        Box::pin(f(ctx, req))
    })
}

pub trait UnaryInterceptor<Req, Resp>: Send + Sync + 'static {
    fn intercept(
        &self,
        ctx: CallContext,
        req: Req,
        next: UnaryHandler<Req, Resp>,
    ) -> BoxFuture<CallResult<Resp>>;
}

impl<Req, Resp, F> UnaryInterceptor<Req, Resp> for F
where
    F: Fn(CallContext, Req, UnaryHandler<Req, Resp>) -> BoxFuture<CallResult<Resp>>
        + Send
        + Sync
        + 'static,
{
    fn intercept(
        &self,
        ctx: CallContext,
        req: Req,
        next: UnaryHandler<Req, Resp>,
    ) -> BoxFuture<CallResult<Resp>> {
        self(ctx, req, next)
    }
}

/// Box a closure as an interceptor.
///
/// ```
/// use grpcx::chain::{unary_interceptor_fn, UnaryInterceptor};
/// use std::sync::Arc;
///
/// let tag: Arc<dyn UnaryInterceptor<String, String>> =
///     unary_interceptor_fn(|ctx, req: String, next| {
///         Box::pin(async move { next(ctx, format!("{req}!")).await })
///     });
/// ```
pub fn unary_interceptor_fn<Req, Resp, F>(f: F) -> Arc<dyn UnaryInterceptor<Req, Resp>>
where
    F: Fn(CallContext, Req, UnaryHandler<Req, Resp>) -> BoxFuture<CallResult<Resp>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Ordered unary interceptors composed into one.
pub struct UnaryChain<Req, Resp> {
    interceptors: Vec<Arc<dyn UnaryInterceptor<Req, Resp>>>,
}

impl<Req, Resp> Clone for UnaryChain<Req, Resp> {
    fn clone(&self) -> Self {
        Self { interceptors: self.interceptors.clone() }
    }
}

impl<Req, Resp> Default for UnaryChain<Req, Resp> {
    fn default() -> Self {
        Self { interceptors: Vec::new() }
    }
}

impl<Req, Resp> UnaryChain<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    pub fn new(interceptors: Vec<Arc<dyn UnaryInterceptor<Req, Resp>>>) -> Self {
        Self { interceptors }
    }

    /// Append an interceptor; it runs after every one added before it.
    pub fn with<I>(mut self, interceptor: I) -> Self
    where
        I: UnaryInterceptor<Req, Resp>,
    {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn push(&mut self, interceptor: Arc<dyn UnaryInterceptor<Req, Resp>>) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Wrap `handler` so that calling the result enters `interceptors[0]` first.
    pub fn compose(&self, handler: UnaryHandler<Req, Resp>) -> UnaryHandler<Req, Resp> {
        let mut chain = handler;
        for interceptor in self.interceptors.iter().rev() {
            let interceptor = Arc::clone(interceptor);
            let next = chain;
            chain = Arc::new(move |ctx: CallContext, req: Req| {
                interceptor.intercept(ctx, req, Arc::clone(&next))
            });
        }
        chain
    }

    /// Run one call through the chain and `handler`.
    pub fn call(
        &self,
        ctx: CallContext,
        req: Req,
        handler: UnaryHandler<Req, Resp>,
    ) -> BoxFuture<CallResult<Resp>> {
        self.compose(handler)(ctx, req)
    }
}

impl<Req, Resp> UnaryInterceptor<Req, Resp> for UnaryChain<Req, Resp>
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
        self.call(ctx, req, next)
    }
}
