use thiserror::Error;

/// Errors returned by the resolver, the limiter pool and the configuration loader.
///
/// RPC-facing rejections are reported with [`crate::status::Status`] instead.
#[derive(Error, Debug)]
pub enum GrpcxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("watcher has been closed")]
    WatcherClosed,

    #[error("target is existed: {0}")]
    DuplicateAddress(String),

    #[error("target is unknown: {0}")]
    UnknownAddress(String),

    #[error("grpc not init")]
    ConnectionNotInitialized,

    #[error("grpc conn shutdown")]
    ConnectionShutdown,

    #[error("rate limiter wait cancelled")]
    Cancelled,

    #[error("rate limiter wait would exceed deadline")]
    DeadlineExceeded,
}

pub type Result<T> = std::result::Result<T, GrpcxError>;
