//! reqwest-backed [`Transport`] that applies a [`TransportMode`] to every call.
//!
//! Client construction follows the shared networking policy: one User-Agent,
//! gzip, bounded connect timeout, and a panic-free fallback when the platform
//! proxy lookup panics in restricted sandboxes.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Client, ClientBuilder, Proxy};
use serde_json::Value;
use tracing::{debug, warn};

use crate::user_agent;

use super::error::{ClientBuildError, FetchFailure};
use super::{FetchOutcome, FetchRequest, FetchResponse, Transport, TransportMode, loggable_url};

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP client tuning. `read_timeout_secs = None` leaves the total request unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// TCP/TLS connect timeout.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout, if any.
    pub read_timeout_secs: Option<u64>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: None,
        }
    }
}

/// Production transport.
#[derive(Debug, Clone)]
pub struct ProxyFetchClient {
    client: Client,
    mode: TransportMode,
}

impl ProxyFetchClient {
    /// Builds a transport for `mode` with default [`HttpSettings`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] when the HTTP client cannot be constructed.
    pub fn new(mode: TransportMode) -> Result<Self, ClientBuildError> {
        Self::with_settings(mode, HttpSettings::default())
    }

    /// Builds a transport for `mode` with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] when the HTTP client cannot be constructed.
    pub fn with_settings(
        mode: TransportMode,
        settings: HttpSettings,
    ) -> Result<Self, ClientBuildError> {
        let client = build_http_client(settings)?;
        Ok(Self { client, mode })
    }

    /// The routing mode in effect.
    #[must_use]
    pub fn mode(&self) -> &TransportMode {
        &self.mode
    }
}

#[async_trait]
impl Transport for ProxyFetchClient {
    #[tracing::instrument(
        skip(self, request),
        fields(mode = self.mode.name(), method = %request.method, target = loggable_url(&request.target_url))
    )]
    async fn execute(&self, request: FetchRequest) -> FetchOutcome {
        let routed = self.mode.route(&request)?;

        let mut builder = self.client.request(request.method.clone(), routed.url);
        for (name, value) in request.headers.iter().chain(routed.extra_headers.iter()) {
            if HeaderValue::from_str(value).is_err() {
                return Err(FetchFailure::invalid_header(name));
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.map_err(FetchFailure::from_transport)?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(FetchFailure::from_transport)?;

        debug!(status, bytes = bytes.len(), "Upstream responded");
        interpret_response(status, &bytes)
    }
}

/// Turns a received status and body into a [`FetchOutcome`].
///
/// Non-success statuses are classified; a success body must be JSON (or empty).
pub(crate) fn interpret_response(status: u16, body: &[u8]) -> FetchOutcome {
    if !(200..300).contains(&status) {
        return Err(FetchFailure::from_status(status, body));
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(FetchResponse {
            status,
            body: Value::Null,
        });
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(body) => Ok(FetchResponse { status, body }),
        Err(error) => Err(FetchFailure::network(format!(
            "upstream returned a non-JSON body (HTTP {status}): {error}"
        ))),
    }
}

fn build_http_client(settings: HttpSettings) -> Result<Client, ClientBuildError> {
    match try_build_client(settings, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxes panic while querying system proxy settings.
            warn!("HTTP client hit system proxy panic; using env-proxy fallback builder");
            match try_build_client(settings, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(ClientBuildError::Panicked),
                Err(BuildClientFailure::Build(error)) => Err(ClientBuildError::Build(error)),
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(ClientBuildError::Build(error)),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    settings: HttpSettings,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(settings);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(settings: HttpSettings) -> ClientBuilder {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .user_agent(user_agent::default_user_agent())
        .gzip(true);
    if let Some(secs) = settings.read_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
