//! Workspace database client.
//!
//! Two calls: discover the databases the token can see (with their live
//! schemas), and create one page per archived book.

mod error;
mod payload;

pub use error::DatabaseError;
pub use payload::{EMPTY_DESCRIPTION_PLACEHOLDER, SEARCH_PAGE_SIZE, page_payload, search_payload};

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::catalog::BookRecord;
use crate::proxy::{FetchRequest, Transport};
use crate::schema::{PropertyMap, Schema};

/// Public API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.notion.com/v1";

/// API version header value.
pub const DEFAULT_API_VERSION: &str = "2022-06-28";

/// Display title used when a database has no title text.
pub const UNTITLED: &str = "Untitled";

/// A database the token can write to, with its schema as fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDescriptor {
    pub id: String,
    pub display_title: String,
    pub schema: Schema,
}

/// Acknowledgement of a created page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub page_id: String,
    /// Browser URL of the page, when returned.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDatabase {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: Option<Vec<RawTextRun>>,
    #[serde(default)]
    properties: Option<Schema>,
}

#[derive(Debug, Deserialize)]
struct RawTextRun {
    #[serde(default)]
    plain_text: Option<String>,
}

impl From<RawDatabase> for CollectionDescriptor {
    fn from(raw: RawDatabase) -> Self {
        let title: String = raw
            .title
            .unwrap_or_default()
            .into_iter()
            .filter_map(|run| run.plain_text)
            .collect();
        let display_title = if title.trim().is_empty() {
            UNTITLED.to_string()
        } else {
            title
        };
        Self {
            id: raw.id,
            display_title,
            schema: raw.properties.unwrap_or_default(),
        }
    }
}

/// Database API client.
pub struct DatabaseClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    api_version: String,
}

impl std::fmt::Debug for DatabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl DatabaseClient {
    /// Creates a client against the public API.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_base_url(transport, DEFAULT_API_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with mock servers).
    #[must_use]
    pub fn with_base_url(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Overrides the API version header.
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Lists the databases visible to `access_token`.
    ///
    /// # Errors
    ///
    /// - [`DatabaseError::EmptyCredential`] when the token is blank (no request is sent)
    /// - [`DatabaseError::Fetch`] with the transport's classification unchanged
    /// - [`DatabaseError::InvalidResponse`] when the body has no `results` array
    #[tracing::instrument(skip(self, access_token))]
    pub async fn discover_collections(
        &self,
        access_token: &str,
    ) -> Result<Vec<CollectionDescriptor>, DatabaseError> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(DatabaseError::EmptyCredential);
        }

        let request = self.authorized(
            FetchRequest::post_json(format!("{}/search", self.base_url), search_payload()),
            access_token,
        );
        let response = self.transport.execute(request).await?;

        let collections = parse_collections(&response.body)?;
        info!(count = collections.len(), "Discovered databases");
        Ok(collections)
    }

    /// Creates a page for `book` in `collection_id`, writing only the roles bound in `map`.
    ///
    /// # Errors
    ///
    /// - [`DatabaseError::EmptyCredential`] when the token is blank
    /// - [`DatabaseError::MissingCollection`] when no database id is given
    /// - [`DatabaseError::Fetch`] on any non-success response, carrying the upstream message
    #[tracing::instrument(skip(self, book, access_token, map), fields(item = %book.external_id))]
    pub async fn create_record(
        &self,
        book: &BookRecord,
        access_token: &str,
        collection_id: &str,
        map: &PropertyMap,
    ) -> Result<Receipt, DatabaseError> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(DatabaseError::EmptyCredential);
        }
        let collection_id = collection_id.trim();
        if collection_id.is_empty() {
            return Err(DatabaseError::MissingCollection);
        }

        let request = self.authorized(
            FetchRequest::post_json(
                format!("{}/pages", self.base_url),
                page_payload(book, collection_id, map),
            ),
            access_token,
        );
        let response = self.transport.execute(request).await?;

        let receipt = parse_receipt(&response.body)?;
        info!(page_id = %receipt.page_id, "Created page");
        Ok(receipt)
    }

    fn authorized(&self, request: FetchRequest, access_token: &str) -> FetchRequest {
        request
            .with_header("Authorization", format!("Bearer {access_token}"))
            .with_header("Notion-Version", self.api_version.as_str())
    }
}

fn parse_collections(body: &Value) -> Result<Vec<CollectionDescriptor>, DatabaseError> {
    let results = body
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| DatabaseError::invalid_response("search response has no results array"))?;

    let collections = results
        .iter()
        .filter(|item| item.get("object").and_then(Value::as_str) == Some("database"))
        .filter_map(
            |item| match serde_json::from_value::<RawDatabase>(item.clone()) {
                Ok(raw) => Some(CollectionDescriptor::from(raw)),
                Err(error) => {
                    warn!(error = %error, "Skipping malformed database entry");
                    None
                }
            },
        )
        .collect::<Vec<_>>();

    debug!(
        total = results.len(),
        databases = collections.len(),
        "Filtered search results"
    );
    Ok(collections)
}

fn parse_receipt(body: &Value) -> Result<Receipt, DatabaseError> {
    let page_id = body
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| DatabaseError::invalid_response("page response has no id"))?;
    Ok(Receipt {
        page_id: page_id.to_string(),
        url: body.get("url").and_then(Value::as_str).map(ToString::to_string),
    })
}
