//! Shared test helpers

#![allow(dead_code)]

use grpcx::chain::{unary_handler, UnaryHandler};
use grpcx::logger::{Logger, SharedLogger};
use grpcx::CallContext;
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

pub type TestResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Logger that keeps every line for later assertions.
#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

impl RecordingLogger {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(level, _)| *level == Level::Error)
            .map(|(_, line)| line)
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(level, _)| *level == Level::Info)
            .map(|(_, line)| line)
            .collect()
    }

    fn push(&self, level: Level, args: fmt::Arguments<'_>) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, args.to_string()));
    }
}

impl Logger for RecordingLogger {
    fn info(&self, args: fmt::Arguments<'_>) {
        self.push(Level::Info, args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        self.push(Level::Error, args);
    }
}

pub fn as_shared(logger: &Arc<RecordingLogger>) -> SharedLogger {
    Arc::clone(logger) as SharedLogger
}

/// Shared, ordered event log for chain tests.
#[derive(Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

pub fn peer(addr: &str) -> SocketAddr {
    addr.parse().unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 0)))
}

pub fn ctx_from(method: &str, peer_addr: &str) -> CallContext {
    CallContext::new(method).with_peer(peer(peer_addr))
}

/// Terminal handler answering `"echo:<req>"` and recording that it ran.
pub fn echo_handler(trace: Trace) -> UnaryHandler<String, String> {
    unary_handler(move |_ctx: CallContext, req: String| {
        let trace = trace.clone();
        async move {
            trace.push("handler");
            Ok(format!("echo:{req}"))
        }
    })
}
