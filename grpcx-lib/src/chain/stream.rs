use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{BoxFuture, CallResult};
use crate::context::CallContext;
use crate::status::Status;

/// A server-side duplex stream as seen by interceptors.
pub trait ServerStream: Send + 'static {
    fn context(&self) -> &CallContext;
}

/// Terminal or composed stream handler.
pub type StreamHandler<S> = Arc<dyn Fn(S) -> BoxFuture<CallResult<()>> + Send + Sync>;

/// Wrap an async function as a [`StreamHandler`].
pub fn stream_handler<S, F, Fut>(f: F) -> StreamHandler<S>
where
    S: ServerStream,
    F: Fn(S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CallResult<()>> + Send + 'static,
{
    Arc::new(move |stream: S| -> BoxFuture<CallResult<()>> { Box::pin(f(stream)) })
}

pub trait StreamInterceptor<S>: Send + Sync + 'static {
    fn intercept(&self, stream: S, next: StreamHandler<S>) -> BoxFuture<CallResult<()>>;
}

impl<S, F> StreamInterceptor<S> for F
where
    F: Fn(S, StreamHandler<S>) -> BoxFuture<CallResult<()>> + Send + Sync + 'static,
{
    fn intercept(&self, stream: S, next: StreamHandler<S>) -> BoxFuture<CallResult<()>> {
        self(stream, next)
    }
}

/// Box a closure as a stream interceptor.
pub fn stream_interceptor_fn<S, F>(f: F) -> Arc<dyn StreamInterceptor<S>>
where
    S: ServerStream,
    F: Fn(S, StreamHandler<S>) -> BoxFuture<CallResult<()>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Ordered stream interceptors composed into one.
pub struct StreamChain<S> {
    interceptors: Vec<Arc<dyn StreamInterceptor<S>>>,
}

impl<S> Clone for StreamChain<S> {
    fn clone(&self) -> Self {
        Self { interceptors: self.interceptors.clone() }
    }
}

impl<S> Default for StreamChain<S> {
    fn default() -> Self {
        Self { interceptors: Vec::new() }
    }
}

impl<S: ServerStream> StreamChain<S> {
    pub fn new(interceptors: Vec<Arc<dyn StreamInterceptor<S>>>) -> Self {
        Self { interceptors }
    }

    pub fn with<I>(mut self, interceptor: I) -> Self
    where
        I: StreamInterceptor<S>,
    {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn push(&mut self, interceptor: Arc<dyn StreamInterceptor<S>>) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn compose(&self, handler: StreamHandler<S>) -> StreamHandler<S> {
        let mut chain = handler;
        for interceptor in self.interceptors.iter().rev() {
            let interceptor = Arc::clone(interceptor);
            let next = chain;
            chain = Arc::new(move |stream: S| interceptor.intercept(stream, Arc::clone(&next)));
        }
        chain
    }

    pub fn call(&self, stream: S, handler: StreamHandler<S>) -> BoxFuture<CallResult<()>> {
        self.compose(handler)(stream)
    }
}

impl<S: ServerStream> StreamInterceptor<S> for StreamChain<S> {
    fn intercept(&self, stream: S, next: StreamHandler<S>) -> BoxFuture<CallResult<()>> {
        self.call(stream, next)
    }
}

/// In-process duplex stream backed by two bounded channels.
pub struct ChannelStream<In, Out> {
    ctx: CallContext,
    inbound: mpsc::Receiver<In>,
    outbound: mpsc::Sender<Out>,
}

/// The caller's end of a [`ChannelStream`].
pub struct StreamClient<In, Out> {
    pub requests: mpsc::Sender<In>,
    pub responses: mpsc::Receiver<Out>,
}

impl<In, Out> ChannelStream<In, Out>
where
    In: Send + 'static,
    Out: Send + 'static,
{
    pub fn pair(ctx: CallContext, buffer: usize) -> (Self, StreamClient<In, Out>) {
        let (req_tx, req_rx) = mpsc::channel(buffer.max(1));
        let (resp_tx, resp_rx) = mpsc::channel(buffer.max(1));
        (
            Self { ctx, inbound: req_rx, outbound: resp_tx },
            StreamClient { requests: req_tx, responses: resp_rx },
        )
    }

    /// Next message from the caller; `None` once the caller stops sending.
    pub async fn recv(&mut self) -> Option<In> {
        self.inbound.recv().await
    }

    pub async fn send(&self, msg: Out) -> CallResult<()> {
        self.outbound
            .send(msg)
            .await
            .map_err(|_| Status::unavailable("stream receiver dropped"))
    }

    pub fn context_mut(&mut self) -> &mut CallContext {
        &mut self.ctx
    }
}

impl<In, Out> ServerStream for ChannelStream<In, Out>
where
    In: Send + 'static,
    Out: Send + 'static,
{
    fn context(&self) -> &CallContext {
        &self.ctx
    }
}
