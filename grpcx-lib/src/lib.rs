#![forbid(unsafe_code)]

pub mod chain;
pub mod config;
pub mod connectivity;
pub mod context;
pub mod error;
pub mod interceptors;
pub mod load_balancing;
pub mod logger;
pub mod security;
pub mod status;
pub mod telemetry;

pub use chain::{
    stream_handler, unary_handler, BoxFuture, CallResult, StreamChain, StreamHandler,
    StreamInterceptor, UnaryChain, UnaryHandler, UnaryInterceptor,
};
pub use config::{load_from_path, Config};
pub use connectivity::{check_conn_state, ConnectivityState};
pub use context::CallContext;
pub use error::{GrpcxError, Result};
pub use interceptors::{
    unknown_method_handler, Interceptors, IpFilter, Logging, MetricsInterceptor, RateLimit,
    Recovery,
};
pub use load_balancing::{
    multi_addr_balancer, AddressWatcher, FixedAddressResolver, Op, Resolver, RoundRobin,
    RoundRobinBalancer, Update, Watcher,
};
pub use logger::{Logger, SharedLogger, TracingLogger};
pub use security::RateLimiterPool;
pub use status::{Code, Status};
