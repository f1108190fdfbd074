//! Categorized RPC failures.
//!
//! Every call rejected by an interceptor is reported as a [`Status`]: a [`Code`]
//! plus a human readable message. The free predicates (`is_not_found`, ...)
//! accept any error so callers holding a boxed error can test its kind without
//! downcasting themselves.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

/// Status codes understood by the serving runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    Ok,
    Unknown,
    InvalidArgument,
    NotFound,
    PermissionDenied,
    ResourceExhausted,
    Internal,
    Unavailable,
    Unauthenticated,
}

impl Code {
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::Ok => "OK",
            Code::Unknown => "Unknown",
            Code::InvalidArgument => "InvalidArgument",
            Code::NotFound => "NotFound",
            Code::PermissionDenied => "PermissionDenied",
            Code::ResourceExhausted => "ResourceExhausted",
            Code::Internal => "Internal",
            Code::Unavailable => "Unavailable",
            Code::Unauthenticated => "Unauthenticated",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A categorized failure returned to the caller of an RPC.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rpc error: code = {code} desc = {message}")]
pub struct Status {
    code: Code,
    message: String,
}

impl Status {
    /// Build a status. An empty message is replaced by the code name.
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.is_empty() { code.as_str().to_string() } else { message };
        Self { code, message }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(Code::Unauthenticated, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(Code::PermissionDenied, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Self::new(Code::ResourceExhausted, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(Code::Unavailable, message)
    }

    /// Convert a panic payload into an `Internal` status.
    ///
    /// `panic!` payloads are either `&'static str` or `String`; anything else
    /// has no printable form and gets a generic message.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::internal(panic_message(payload))
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.code == Code::Unauthenticated
    }

    pub fn is_permission_denied(&self) -> bool {
        self.code == Code::PermissionDenied
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.code == Code::InvalidArgument
    }

    pub fn is_not_found(&self) -> bool {
        self.code == Code::NotFound
    }

    pub fn is_resource_exhausted(&self) -> bool {
        self.code == Code::ResourceExhausted
    }

    pub fn is_internal(&self) -> bool {
        self.code == Code::Internal
    }

    pub fn is_unavailable(&self) -> bool {
        self.code == Code::Unavailable
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

fn as_status<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a Status> {
    err.downcast_ref::<Status>()
}

pub fn is_unauthenticated(err: &(dyn StdError + 'static)) -> bool {
    as_status(err).is_some_and(Status::is_unauthenticated)
}

pub fn is_permission_denied(err: &(dyn StdError + 'static)) -> bool {
    as_status(err).is_some_and(Status::is_permission_denied)
}

pub fn is_invalid_argument(err: &(dyn StdError + 'static)) -> bool {
    as_status(err).is_some_and(Status::is_invalid_argument)
}

pub fn is_not_found(err: &(dyn StdError + 'static)) -> bool {
    as_status(err).is_some_and(Status::is_not_found)
}

pub fn is_resource_exhausted(err: &(dyn StdError + 'static)) -> bool {
    as_status(err).is_some_and(Status::is_resource_exhausted)
}

pub fn is_internal(err: &(dyn StdError + 'static)) -> bool {
    as_status(err).is_some_and(Status::is_internal)
}

pub fn is_unavailable(err: &(dyn StdError + 'static)) -> bool {
    as_status(err).is_some_and(Status::is_unavailable)
}

/// Message carried by `err`: the status message for a [`Status`], the
/// `Display` output for anything else.
pub fn error_message(err: &(dyn StdError + 'static)) -> String {
    match as_status(err) {
        Some(status) => status.message().to_string(),
        None => err.to_string(),
    }
}

/// True when `status_err` is a [`Status`] whose message equals `err`'s `Display`.
pub fn is_error(status_err: &(dyn StdError + 'static), err: &dyn StdError) -> bool {
    as_status(status_err).is_some_and(|s| s.message() == err.to_string())
}

/// True when both are absent, or when `status_err` is a [`Status`] whose
/// message contains `err`'s `Display`.
pub fn match_error(
    status_err: Option<&(dyn StdError + 'static)>,
    err: Option<&dyn StdError>,
) -> bool {
    match (status_err, err) {
        (None, None) => true,
        (Some(status_err), Some(err)) => {
            as_status(status_err).is_some_and(|s| s.message().contains(&err.to_string()))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GrpcxError;

    #[test]
    fn test_constructors_set_code() {
        assert!(Status::unauthenticated("x").is_unauthenticated());
        assert!(Status::permission_denied("x").is_permission_denied());
        assert!(Status::invalid_argument("x").is_invalid_argument());
        assert!(Status::not_found("x").is_not_found());
        assert!(Status::resource_exhausted("x").is_resource_exhausted());
        assert!(Status::internal("x").is_internal());
        assert!(Status::unavailable("x").is_unavailable());
        assert!(!Status::internal("x").is_not_found());
    }

    #[test]
    fn test_empty_message_defaults_to_code_name() {
        let status = Status::not_found("");
        assert_eq!(status.message(), "NotFound");
    }

    #[test]
    fn test_display_format() {
        let status = Status::resource_exhausted(format!("host [{}] rejected", "1.2.3.4"));
        assert_eq!(
            status.to_string(),
            "rpc error: code = ResourceExhausted desc = host [1.2.3.4] rejected"
        );
    }

    #[test]
    fn test_predicates_on_plain_errors() {
        let err = GrpcxError::WatcherClosed;
        assert!(!is_not_found(&err));
        assert!(!is_internal(&err));
        assert_eq!(error_message(&err), "watcher has been closed");

        let status = Status::internal("boom");
        assert!(is_internal(&status));
        assert_eq!(error_message(&status), "boom");
    }

    #[test]
    fn test_is_error_and_match_error() {
        let domain = GrpcxError::ConnectionShutdown;
        let exact = Status::unavailable(domain.to_string());
        let wrapped = Status::unavailable(format!("dial failed: {domain}"));

        assert!(is_error(&exact, &domain));
        assert!(!is_error(&wrapped, &domain));
        assert!(match_error(Some(&wrapped), Some(&domain)));
        assert!(match_error(None, None));
        assert!(!match_error(Some(&wrapped), None));
        assert!(!match_error(None, Some(&domain)));
        // Non-status errors never match.
        assert!(!match_error(Some(&domain), Some(&domain)));
    }

    #[test]
    fn test_from_panic_payloads() {
        let s: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(Status::from_panic(s.as_ref()).message(), "static str");

        let s: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(Status::from_panic(s.as_ref()).message(), "owned");

        let s: Box<dyn Any + Send> = Box::new(42_u32);
        let status = Status::from_panic(s.as_ref());
        assert!(status.is_internal());
        assert_eq!(status.message(), "panic with non-string payload");
    }
}
