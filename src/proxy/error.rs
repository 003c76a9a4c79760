//! Failure classification for outbound calls.
//!
//! Every failed call is reduced to a [`FetchFailure`] carrying one
//! [`FailureKind`], the upstream status when one was received, and the most
//! specific message available (the upstream's own message when its error body
//! is JSON).

use serde_json::Value;
use thiserror::Error;

/// Classification of a failed outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The HTTP layer itself failed: DNS, TLS, refused connection, proxy rejection.
    Network,
    /// The upstream answered with a client error other than auth/timeout.
    Upstream4xx,
    /// The upstream answered with a server error.
    Upstream5xx,
    /// The transport or a bridging proxy signalled a timeout.
    Timeout,
    /// The upstream rejected the credential (HTTP 401/403).
    Unauthorized,
    /// The request could not be built locally, so nothing was sent.
    InvalidRequest,
}

impl FailureKind {
    /// Stable lowercase label for logs and diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Upstream4xx => "upstream_4xx",
            Self::Upstream5xx => "upstream_5xx",
            Self::Timeout => "timeout",
            Self::Unauthorized => "unauthorized",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified outbound-call failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} failure: {message}")]
pub struct FetchFailure {
    /// Failure classification.
    pub kind: FailureKind,
    /// Upstream HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Upstream message when available, otherwise a generic description.
    pub message: String,
}

impl FetchFailure {
    /// Creates a failure with an explicit classification.
    #[must_use]
    pub fn new(kind: FailureKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    /// Creates a `Network` failure without a status.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Network, None, message)
    }

    /// Creates an `InvalidRequest` failure for a header whose value cannot be sent.
    ///
    /// The value itself is never included; header values carry credentials.
    #[must_use]
    pub fn invalid_header(name: &str) -> Self {
        Self::new(
            FailureKind::InvalidRequest,
            None,
            format!("the '{name}' header contains characters that cannot be sent"),
        )
    }

    /// Classifies an error raised by the HTTP layer.
    ///
    /// The URL is stripped from the error first; catalog URLs carry the API key.
    #[must_use]
    pub fn from_transport(error: reqwest::Error) -> Self {
        let error = error.without_url();
        if error.is_builder() {
            Self::new(
                FailureKind::InvalidRequest,
                None,
                format!("request could not be built: {error}"),
            )
        } else if error.is_timeout() {
            Self::new(FailureKind::Timeout, None, format!("request timed out: {error}"))
        } else {
            Self::network(format!("cannot reach service: {error}"))
        }
    }

    /// Builds the failure for a non-success status and its raw body.
    #[must_use]
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let kind = classify_status(status).unwrap_or(FailureKind::Upstream4xx);
        let message = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|value| extract_upstream_message(&value))
            .unwrap_or_else(|| format!("HTTP {status}"));
        Self::new(kind, Some(status), message)
    }
}

/// Classifies an HTTP status. Returns `None` for 2xx.
///
/// 401/403 are credential rejections; 408 and the gateway/bridge timeout codes
/// 504, 522 and 524 are timeouts; any other non-success status is split by class.
#[must_use]
pub fn classify_status(status: u16) -> Option<FailureKind> {
    match status {
        200..=299 => None,
        401 | 403 => Some(FailureKind::Unauthorized),
        408 | 504 | 522 | 524 => Some(FailureKind::Timeout),
        500..=599 => Some(FailureKind::Upstream5xx),
        _ => Some(FailureKind::Upstream4xx),
    }
}

/// Extracts the upstream's own error message from a JSON error body.
///
/// Recognises `message` (workspace API), `errorMessage` (catalog API), and
/// `error` as either a string or an object with `message`.
#[must_use]
pub fn extract_upstream_message(body: &Value) -> Option<String> {
    let candidates = [
        body.get("message"),
        body.get("errorMessage"),
        body.get("error"),
        body.get("error").and_then(|error| error.get("message")),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(ToString::to_string)
}

/// Errors constructing the HTTP client behind a transport.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// reqwest rejected the builder configuration.
    #[error("HTTP client construction failed: {0}")]
    Build(#[source] reqwest::Error),
    /// Both the system-proxy and env-proxy builders panicked.
    #[error("HTTP client construction panicked while initializing networking")]
    Panicked,
}
