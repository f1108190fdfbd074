//! Per-call context handed to interceptors and handlers, plus caller-address
//! and method-name helpers.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use std::net::{IpAddr, SocketAddr};

/// Header names used to carry the original client address through a front proxy.
///
/// ```text
/// location / {
///     grpc_pass grpc://127.0.0.1:9091;
///     grpc_set_header X-Real-IP $remote_addr;
/// }
/// ```
pub mod forwarded {
    pub const REAL_IP: &str = "x-real-ip";
    pub const FOR: &str = "x-forwarded-for";
}

/// What the serving runtime knows about one inbound call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    full_method: String,
    peer: Option<SocketAddr>,
    metadata: HeaderMap,
}

impl CallContext {
    pub fn new(full_method: impl Into<String>) -> Self {
        Self { full_method: full_method.into(), peer: None, metadata: HeaderMap::new() }
    }

    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Attach one metadata entry. Invalid names or values are ignored.
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) =
            (HeaderName::from_bytes(key.as_bytes()), HeaderValue::from_str(value))
        {
            self.metadata.append(name, value);
        }
        self
    }

    /// Fully-qualified method, e.g. `/helloworld.Greeter/SayHello`.
    pub fn full_method(&self) -> &str {
        &self.full_method
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn metadata(&self) -> &HeaderMap {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut HeaderMap {
        &mut self.metadata
    }
}

/// Client address set by a trusted front proxy in `x-real-ip`.
pub fn real_addr(ctx: &CallContext) -> Option<String> {
    ctx.metadata()
        .get(forwarded::REAL_IP)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Forwarded client address: `x-real-ip`, else the first `x-forwarded-for` hop.
pub fn forwarded_addr(ctx: &CallContext) -> Option<String> {
    real_addr(ctx).or_else(|| {
        ctx.metadata()
            .get(forwarded::FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Transport-level peer IP, without the port.
pub fn peer_addr(ctx: &CallContext) -> Option<String> {
    ctx.peer().map(|peer| peer.ip().to_string())
}

/// Caller IP used for access control: the forwarded address when it parses as
/// an IP, otherwise the transport peer.
pub fn caller_ip(ctx: &CallContext) -> Option<IpAddr> {
    forwarded_addr(ctx)
        .and_then(|addr| addr.parse::<IpAddr>().ok())
        .or_else(|| ctx.peer().map(|peer| peer.ip()))
}

/// Split `/package.Service/Method` into `("Service", "Method")`.
///
/// Missing parts come back as `"unknown"`.
pub fn parse_method(full: &str) -> (String, String) {
    let parts: Vec<&str> = full.split('/').collect();
    let mut module = "";
    let mut call = "";

    if parts.len() > 2 {
        call = parts[parts.len() - 1];
        module = parts[parts.len() - 2].rsplit('.').next().unwrap_or("");
    }

    let module = if module.is_empty() { "unknown" } else { module };
    let call = if call.is_empty() { "unknown" } else { call };
    (module.to_string(), call.to_string())
}
