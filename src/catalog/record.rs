//! Catalog item ingestion: raw JSON item to [`BookRecord`].

use serde::Deserialize;
use serde_json::Value;

/// A catalog search hit, normalised once at ingestion.
///
/// `cover_image_url` and `source_link` always use the secure scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookRecord {
    /// Catalog item id.
    pub external_id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    /// High-resolution cover URL, or `""`.
    pub cover_image_url: String,
    /// Catalog detail page, or `""`.
    pub source_link: String,
    pub publisher: String,
    pub pub_date: String,
    /// ISBN-13 when the catalog has one, otherwise ISBN-10.
    pub isbn: String,
    pub category_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawCatalogItem {
    #[serde(default)]
    item_id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    pub_date: Option<String>,
    #[serde(default)]
    isbn: Option<String>,
    #[serde(default)]
    isbn13: Option<String>,
    #[serde(default)]
    category_name: Option<String>,
}

impl From<RawCatalogItem> for BookRecord {
    fn from(raw: RawCatalogItem) -> Self {
        let isbn = raw
            .isbn13
            .filter(|value| !value.trim().is_empty())
            .or(raw.isbn)
            .unwrap_or_default();

        Self {
            external_id: raw.item_id.as_ref().map(id_to_string).unwrap_or_default(),
            title: raw.title.unwrap_or_default(),
            author: raw.author.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            cover_image_url: upgrade_cover_url(&raw.cover.unwrap_or_default()),
            source_link: secure_scheme(&raw.link.unwrap_or_default()),
            publisher: raw.publisher.unwrap_or_default(),
            pub_date: raw.pub_date.unwrap_or_default(),
            isbn,
            category_name: raw.category_name.unwrap_or_default(),
        }
    }
}

fn id_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Rewrites a leading `http://` to `https://`.
#[must_use]
pub fn secure_scheme(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

/// Secure scheme plus the high-resolution variant: the first `sum` size token becomes `500`.
#[must_use]
pub fn upgrade_cover_url(url: &str) -> String {
    secure_scheme(url).replacen("sum", "500", 1)
}
