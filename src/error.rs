//! The closed error-kind taxonomy every provider method raises into, and the
//! error type that carries one kind plus a message through the engine.
//!
//! Grounded on `ResilienceError<E>` (ninelives `src/error.rs`): a small closed
//! enum with `is_*` predicates the engine can match on without downcasting.

use std::backtrace::Backtrace;
use std::fmt;
use std::sync::Arc;

/// One of the eight closed error kinds a provider method call can classify
/// into. See spec.md §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    HttpTimeout,
    HttpError,
    ClientServerError,
    RateLimitReached,
    ContentMalformed,
    ValidationFailed,
    Configuration,
    Unknown,
}

impl ErrorKind {
    /// All kinds that carry a retry-policy table entry (everything but
    /// `Configuration`, which is surfaced to the supervisor at construction
    /// time, and `Unknown`, which is always terminal).
    pub const RETRYABLE: [ErrorKind; 6] = [
        ErrorKind::HttpTimeout,
        ErrorKind::HttpError,
        ErrorKind::ClientServerError,
        ErrorKind::RateLimitReached,
        ErrorKind::ContentMalformed,
        ErrorKind::ValidationFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::HttpTimeout => "http_timeout",
            ErrorKind::HttpError => "http_error",
            ErrorKind::ClientServerError => "client_server_error",
            ErrorKind::RateLimitReached => "rate_limit_reached",
            ErrorKind::ContentMalformed => "content_malformed",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A taxonomy error raised by a provider method, an HTTP fetch, or the engine
/// itself. Carries enough context for the journal (item id / provider /
/// method are attached by the caller, not stored here — see
/// `ti-backend::journal`).
///
/// `backtrace` is captured at construction time and formatted eagerly: a raw
/// `std::backtrace::Backtrace` isn't `Clone`, and this type derives it.
#[derive(Debug, thiserror::Error, Clone)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    kind: ErrorKind,
    message: String,
    backtrace: Arc<str>,
}

impl ProviderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), backtrace: Arc::from(Backtrace::force_capture().to_string()) }
    }

    pub fn http_timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::HttpTimeout, message)
    }

    pub fn http_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::HttpError, message)
    }

    pub fn client_server_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ClientServerError, message)
    }

    pub fn rate_limit_reached(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimitReached, message)
    }

    pub fn content_malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ContentMalformed, message)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailed, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The stack trace captured when this error was constructed (spec.md
    /// §7: the journal records one per entry). Empty unless
    /// `RUST_BACKTRACE` was set at capture time.
    pub fn backtrace(&self) -> &str {
        &self.backtrace
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self.kind, ErrorKind::Configuration)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, ErrorKind::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let e = ProviderError::http_timeout("read timed out after 20s");
        let msg = e.to_string();
        assert!(msg.contains("http_timeout"));
        assert!(msg.contains("read timed out"));
    }

    #[test]
    fn kind_accessors() {
        assert!(ProviderError::configuration("bad").is_configuration());
        assert!(ProviderError::unknown("oops").is_unknown());
        assert!(!ProviderError::unknown("oops").is_configuration());
    }

    #[test]
    fn retryable_set_excludes_configuration_and_unknown() {
        assert!(!ErrorKind::RETRYABLE.contains(&ErrorKind::Configuration));
        assert!(!ErrorKind::RETRYABLE.contains(&ErrorKind::Unknown));
        assert_eq!(ErrorKind::RETRYABLE.len(), 6);
    }

    #[test]
    fn backtrace_is_captured_at_construction() {
        let e = ProviderError::unknown("boom");
        assert!(!e.backtrace().is_empty());
    }
}
