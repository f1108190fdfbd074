//! Interceptor chains.
//!
//! An interceptor receives the call and an explicit `next` continuation. It may
//! call `next` once, with the original or modified arguments, or return its own
//! result without calling it at all, in which case nothing downstream runs.
//!
//! A chain of `[a, b, c]` around handler `h` is composed back to front:
//! `h` is wrapped by `c`, that by `b`, that by `a`. On entry `a` runs first; any
//! work an interceptor does after `next` returns runs in reverse order.

mod stream;
mod unary;

use std::future::Future;
use std::pin::Pin;

use crate::status::Status;

pub use stream::{
    stream_handler, stream_interceptor_fn, ChannelStream, ServerStream, StreamChain,
    StreamClient, StreamHandler, StreamInterceptor,
};
pub use unary::{
    unary_handler, unary_interceptor_fn, UnaryChain, UnaryHandler, UnaryInterceptor,
};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Outcome of one call: the response or a categorized failure.
pub type CallResult<T> = Result<T, Status>;
