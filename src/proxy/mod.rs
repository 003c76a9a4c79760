//! Outbound-call layer shared by the catalog and database clients.
//!
//! Callers describe *what* to call with a [`FetchRequest`]; a [`Transport`]
//! decides *how* to reach it. The production transport, [`ProxyFetchClient`],
//! routes every call through a configuration-selected [`TransportMode`]:
//!
//! - [`TransportMode::Direct`] - call the target URL as-is
//! - [`TransportMode::Relay`] - call a same-origin relay, naming the target in
//!   the [`RELAY_TARGET_HEADER`] header
//! - [`TransportMode::PublicProxy`] - call a public bridging endpoint with the
//!   target URL as its own query value
//!
//! Every mode yields the same [`FetchOutcome`] for the same upstream answer.
//! Nothing here retries; a failure surfaces immediately, classified.

mod client;
mod error;

pub use client::{HttpSettings, ProxyFetchClient};
pub use error::{
    ClientBuildError, FailureKind, FetchFailure, classify_status, extract_upstream_message,
};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use url::Url;

/// Header through which the relay learns the true upstream URL.
pub const RELAY_TARGET_HEADER: &str = "x-target-url";

/// Query parameter used by public bridging endpoints when none is configured.
pub const DEFAULT_PROXY_PARAM: &str = "url";

/// Public bridging endpoint used when proxy mode is selected without an endpoint.
pub const DEFAULT_PUBLIC_PROXY_ENDPOINT: &str = "https://api.allorigins.win/raw";

/// Result of one outbound call.
pub type FetchOutcome = Result<FetchResponse, FetchFailure>;

/// A successful (2xx) upstream answer.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    /// Upstream HTTP status.
    pub status: u16,
    /// Parsed JSON body (`Null` for an empty body).
    pub body: Value,
}

/// One outbound call as the caller sees it, independent of routing.
#[derive(Clone)]
pub struct FetchRequest {
    /// The upstream URL the caller actually wants.
    pub target_url: String,
    /// HTTP method.
    pub method: Method,
    /// Request headers, forwarded unchanged in every mode.
    pub headers: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<Value>,
}

impl FetchRequest {
    /// Creates a GET request.
    #[must_use]
    pub fn get(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            method: Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Creates a POST request with a JSON body and matching content type.
    #[must_use]
    pub fn post_json(target_url: impl Into<String>, body: Value) -> Self {
        Self {
            target_url: target_url.into(),
            method: Method::POST,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the first header value named `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

// Header values and query strings carry credentials; only their shape is printed.
impl std::fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("FetchRequest")
            .field("target_url", &loggable_url(&self.target_url))
            .field("method", &self.method)
            .field("headers", &header_names)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Strips query and fragment from a URL for logging.
#[must_use]
pub fn loggable_url(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or_default()
}

/// How calls cross the origin boundary. Chosen by configuration, never at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Call the upstream directly.
    #[default]
    Direct,
    /// Call a same-origin relay that forwards to the URL in [`RELAY_TARGET_HEADER`].
    Relay {
        /// Relay endpoint.
        endpoint: Url,
    },
    /// Call a public bridge that takes the upstream URL as a query value.
    PublicProxy {
        /// Bridge endpoint.
        endpoint: Url,
        /// Query parameter that carries the upstream URL.
        param: String,
    },
}

impl TransportMode {
    /// Relay mode for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] when `endpoint` is not an absolute URL.
    pub fn relay(endpoint: &str) -> Result<Self, url::ParseError> {
        Ok(Self::Relay {
            endpoint: Url::parse(endpoint)?,
        })
    }

    /// Public-proxy mode for `endpoint`, carrying the target in `param`.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] when `endpoint` is not an absolute URL.
    pub fn public_proxy(endpoint: &str, param: impl Into<String>) -> Result<Self, url::ParseError> {
        Ok(Self::PublicProxy {
            endpoint: Url::parse(endpoint)?,
            param: param.into(),
        })
    }

    /// Stable name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Relay { .. } => "relay",
            Self::PublicProxy { .. } => "public-proxy",
        }
    }

    /// Computes the URL actually dialled and any headers the mode adds.
    ///
    /// # Errors
    ///
    /// Returns a `Network` [`FetchFailure`] when the target URL is not absolute.
    pub fn route(&self, request: &FetchRequest) -> Result<RoutedRequest, FetchFailure> {
        let target = Url::parse(&request.target_url).map_err(|error| {
            FetchFailure::network(format!(
                "invalid target URL '{}': {error}",
                loggable_url(&request.target_url)
            ))
        })?;

        match self {
            Self::Direct => Ok(RoutedRequest {
                url: target,
                extra_headers: Vec::new(),
            }),
            Self::Relay { endpoint } => Ok(RoutedRequest {
                url: endpoint.clone(),
                extra_headers: vec![(RELAY_TARGET_HEADER.to_string(), target.to_string())],
            }),
            Self::PublicProxy { endpoint, param } => {
                let mut url = endpoint.clone();
                url.query_pairs_mut().append_pair(param, target.as_str());
                Ok(RoutedRequest {
                    url,
                    extra_headers: Vec::new(),
                })
            }
        }
    }
}

/// The concrete request a transport sends after routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedRequest {
    /// URL actually dialled.
    pub url: Url,
    /// Headers added by the routing mode.
    pub extra_headers: Vec<(String, String)>,
}

/// Performs one outbound call and classifies its outcome.
///
/// # Object Safety
///
/// This trait uses `async_trait` so clients can hold `Arc<dyn Transport>`;
/// tests substitute recording transports without touching client code.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes `request` once. Never retries.
    async fn execute(&self, request: FetchRequest) -> FetchOutcome;
}
