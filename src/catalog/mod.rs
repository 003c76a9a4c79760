//! Book catalog search client.
//!
//! Searches the catalog's keyword endpoint and ingests each hit as a
//! [`BookRecord`]. The key is validated locally before anything is dispatched.

mod record;

pub use record::{BookRecord, secure_scheme, upgrade_cover_url};

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::proxy::{FailureKind, FetchFailure, FetchRequest, Transport};

use record::RawCatalogItem;

/// Catalog keyword-search endpoint.
pub const DEFAULT_CATALOG_ENDPOINT: &str = "https://www.aladin.co.kr/ttb/api/ItemSearch.aspx";

/// Results requested per search unless configured otherwise.
pub const DEFAULT_MAX_RESULTS: u32 = 20;

/// Upper bound the catalog accepts for `MaxResults`.
pub const MAX_RESULTS_LIMIT: u32 = 100;

const API_VERSION: &str = "20131101";
const UPSTREAM_FALLBACK_MESSAGE: &str = "catalog rejected the request; check your catalog key";

/// Which catalog to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Printed books.
    #[default]
    Book,
    /// Electronic books.
    EBook,
}

impl SearchScope {
    /// Value of the `SearchTarget` query parameter.
    #[must_use]
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Book => "Book",
            Self::EBook => "eBook",
        }
    }
}

/// Errors from a catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The catalog key is empty; nothing was sent.
    #[error("catalog key is not configured")]
    EmptyCredential,

    /// The catalog answered with an application-level error.
    #[error("catalog error: {message}")]
    Upstream {
        /// Catalog error code, when present.
        code: Option<i64>,
        /// Catalog's own message, or a generic hint.
        message: String,
    },

    /// The call itself failed.
    #[error(transparent)]
    Fetch(#[from] FetchFailure),
}

impl CatalogError {
    /// Classification of the underlying call failure, if any.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Fetch(failure) => Some(failure.kind),
            Self::EmptyCredential | Self::Upstream { .. } => None,
        }
    }
}

/// Catalog search client.
pub struct CatalogClient {
    transport: Arc<dyn Transport>,
    endpoint: String,
    max_results: u32,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("endpoint", &self.endpoint)
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Creates a client against the production endpoint.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_endpoint(transport, DEFAULT_CATALOG_ENDPOINT)
    }

    /// Creates a client against a custom endpoint (for testing with mock servers).
    #[must_use]
    pub fn with_endpoint(transport: Arc<dyn Transport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Sets the per-search result count, clamped to `1..=100`.
    #[must_use]
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results.clamp(1, MAX_RESULTS_LIMIT);
        self
    }

    /// Results requested per search.
    #[must_use]
    pub fn max_results(&self) -> u32 {
        self.max_results
    }

    /// Searches the catalog by keyword.
    ///
    /// An empty query yields no results without dispatching.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::EmptyCredential`] when `api_key` is blank (no request is sent)
    /// - [`CatalogError::Upstream`] when the catalog reports an error code
    /// - [`CatalogError::Fetch`] when the call fails
    #[tracing::instrument(skip(self, api_key), fields(scope = scope.as_wire()))]
    pub async fn search(
        &self,
        query: &str,
        api_key: &str,
        scope: SearchScope,
    ) -> Result<Vec<BookRecord>, CatalogError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(CatalogError::EmptyCredential);
        }
        let query = query.trim();
        if query.is_empty() {
            debug!("Empty query; skipping catalog search");
            return Ok(Vec::new());
        }

        let url = build_search_url(
            &self.endpoint,
            query,
            api_key,
            scope,
            self.max_results,
            unix_millis(),
        )?;
        let response = self.transport.execute(FetchRequest::get(url)).await?;

        let records = parse_search_response(&response.body)?;
        info!(count = records.len(), "Catalog search complete");
        Ok(records)
    }
}

/// Builds the keyword-search URL. `cache_bust` is appended as `_ts`.
///
/// # Errors
///
/// Returns a `Network` [`FetchFailure`] when `endpoint` is not an absolute URL.
pub fn build_search_url(
    endpoint: &str,
    query: &str,
    api_key: &str,
    scope: SearchScope,
    max_results: u32,
    cache_bust: u128,
) -> Result<String, FetchFailure> {
    let mut url = Url::parse(endpoint).map_err(|error| {
        FetchFailure::network(format!("invalid catalog endpoint '{endpoint}': {error}"))
    })?;
    url.query_pairs_mut()
        .append_pair("ttbkey", api_key)
        .append_pair("Query", query)
        .append_pair("QueryType", "Keyword")
        .append_pair("MaxResults", &max_results.to_string())
        .append_pair("start", "1")
        .append_pair("SearchTarget", scope.as_wire())
        .append_pair("output", "js")
        .append_pair("Version", API_VERSION)
        .append_pair("_ts", &cache_bust.to_string());
    Ok(url.into())
}

/// Parses a search response body.
///
/// # Errors
///
/// Returns [`CatalogError::Upstream`] when the body carries an `errorCode`.
pub fn parse_search_response(body: &Value) -> Result<Vec<BookRecord>, CatalogError> {
    if let Some(code) = body.get("errorCode").filter(|code| !code.is_null()) {
        let message = body
            .get("errorMessage")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .unwrap_or(UPSTREAM_FALLBACK_MESSAGE)
            .to_string();
        warn!(code = %code, "Catalog returned an error");
        return Err(CatalogError::Upstream {
            code: code
                .as_i64()
                .or_else(|| code.as_str().and_then(|text| text.parse().ok())),
            message,
        });
    }

    let Some(items) = body.get("item").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let records = items
        .iter()
        .filter_map(
            |item| match serde_json::from_value::<RawCatalogItem>(item.clone()) {
                Ok(raw) => Some(BookRecord::from(raw)),
                Err(error) => {
                    warn!(error = %error, "Skipping malformed catalog item");
                    None
                }
            },
        )
        .collect();
    Ok(records)
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}
