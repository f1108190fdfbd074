//! Logging collaborator handed to interceptors at construction.
//!
//! Interceptors never reach for a process-wide logger; they hold a
//! [`SharedLogger`], which defaults to [`TracingLogger`].

use std::fmt;
use std::sync::Arc;

pub trait Logger: Send + Sync {
    fn info(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: fmt::Arguments<'_>);
}

pub type SharedLogger = Arc<dyn Logger>;

/// Forwards to the `tracing` subscriber installed by the application.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "grpcx", "{}", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(target: "grpcx", "{}", args);
    }
}

pub fn default_logger() -> SharedLogger {
    Arc::new(TracingLogger)
}
