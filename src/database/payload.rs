//! Request bodies for the database API. Pure functions, no I/O.

use serde_json::{Map, Value, json};

use crate::catalog::BookRecord;
use crate::schema::{PropertyMap, Role};

/// Paragraph text written when a book has no description.
pub const EMPTY_DESCRIPTION_PLACEHOLDER: &str = "설명이 없습니다.";

/// Maximum page size the search endpoint accepts.
pub const SEARCH_PAGE_SIZE: u32 = 100;

/// Body of the database-discovery search.
#[must_use]
pub fn search_payload() -> Value {
    json!({
        "filter": { "property": "object", "value": "database" },
        "page_size": SEARCH_PAGE_SIZE,
    })
}

/// Body of the page-creation request for `book`.
///
/// Only roles bound in `map` are written; an unbound role has no key at all.
/// Icon, cover and the image block are left out when the book has no cover,
/// since the API rejects an empty external URL.
#[must_use]
pub fn page_payload(book: &BookRecord, collection_id: &str, map: &PropertyMap) -> Value {
    let mut properties = Map::new();
    if let Some(column) = map.column(Role::Title) {
        properties.insert(
            column.to_string(),
            json!({ "title": [text_run(&book.title)] }),
        );
    }
    if let Some(column) = map.column(Role::Author) {
        properties.insert(
            column.to_string(),
            json!({ "rich_text": [text_run(&book.author)] }),
        );
    }
    if let Some(column) = map.column(Role::Link) {
        let url = if book.source_link.is_empty() {
            Value::Null
        } else {
            Value::String(book.source_link.clone())
        };
        properties.insert(column.to_string(), json!({ "url": url }));
    }

    let description = if book.description.trim().is_empty() {
        EMPTY_DESCRIPTION_PLACEHOLDER
    } else {
        book.description.as_str()
    };

    let mut children = Vec::with_capacity(2);
    let mut payload = Map::new();
    payload.insert(
        "parent".to_string(),
        json!({ "database_id": collection_id }),
    );

    if !book.cover_image_url.is_empty() {
        let external = external_file(&book.cover_image_url);
        payload.insert("icon".to_string(), external.clone());
        payload.insert("cover".to_string(), external.clone());
        children.push(json!({
            "object": "block",
            "type": "image",
            "image": external,
        }));
    }
    children.push(json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": { "rich_text": [text_run(description)] },
    }));

    payload.insert("properties".to_string(), Value::Object(properties));
    payload.insert("children".to_string(), Value::Array(children));
    Value::Object(payload)
}

fn text_run(content: &str) -> Value {
    json!({ "text": { "content": content } })
}

fn external_file(url: &str) -> Value {
    json!({ "type": "external", "external": { "url": url } })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn book() -> BookRecord {
        BookRecord {
            external_id: "42".to_string(),
            title: "토지 1".to_string(),
            author: "박경리".to_string(),
            description: "대하소설".to_string(),
            cover_image_url: "https://image.example/cover500/1.jpg".to_string(),
            source_link: "https://www.example/42".to_string(),
            ..BookRecord::default()
        }
    }

    #[test]
    fn test_search_payload_shape() {
        assert_eq!(
            search_payload(),
            json!({"filter": {"property": "object", "value": "database"}, "page_size": 100})
        );
    }

    #[test]
    fn test_page_payload_with_all_roles() {
        let payload = page_payload(&book(), "db-1", &PropertyMap::default_columns());

        assert_eq!(payload["parent"]["database_id"], "db-1");
        assert_eq!(
            payload["properties"]["Name"]["title"][0]["text"]["content"],
            "토지 1"
        );
        assert_eq!(
            payload["properties"]["작가"]["rich_text"][0]["text"]["content"],
            "박경리"
        );
        assert_eq!(payload["properties"]["링크"]["url"], "https://www.example/42");
        assert_eq!(
            payload["icon"],
            json!({"type": "external", "external": {"url": "https://image.example/cover500/1.jpg"}})
        );
        assert_eq!(payload["cover"], payload["icon"]);

        let children = payload["children"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0]["type"], "image");
        assert_eq!(children[1]["type"], "paragraph");
        assert_eq!(
            children[1]["paragraph"]["rich_text"][0]["text"]["content"],
            "대하소설"
        );
    }

    #[test]
    fn test_page_payload_omits_unbound_link_key() {
        let map = PropertyMap {
            link_column: String::new(),
            ..PropertyMap::default_columns()
        };
        let payload = page_payload(&book(), "db-1", &map);
        let properties = payload["properties"].as_object().unwrap();

        assert!(!properties.contains_key("링크"));
        assert!(!properties.contains_key(""));
        assert_eq!(properties.len(), 2);
    }

    #[test]
    fn test_page_payload_with_no_roles_has_empty_properties() {
        let payload = page_payload(&book(), "db-1", &PropertyMap::default());
        assert_eq!(payload["properties"], json!({}));
    }

    #[test]
    fn test_page_payload_uses_placeholder_for_empty_description() {
        let mut record = book();
        record.description = "   ".to_string();
        let payload = page_payload(&record, "db-1", &PropertyMap::default_columns());
        assert_eq!(
            payload["children"][1]["paragraph"]["rich_text"][0]["text"]["content"],
            EMPTY_DESCRIPTION_PLACEHOLDER
        );
    }

    #[test]
    fn test_page_payload_without_cover_skips_icon_cover_and_image() {
        let mut record = book();
        record.cover_image_url.clear();
        let payload = page_payload(&record, "db-1", &PropertyMap::default_columns());

        assert!(payload.get("icon").is_none());
        assert!(payload.get("cover").is_none());
        let children = payload["children"].as_array().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["type"], "paragraph");
    }

    #[test]
    fn test_page_payload_empty_link_writes_null_url() {
        let mut record = book();
        record.source_link.clear();
        let payload = page_payload(&record, "db-1", &PropertyMap::default_columns());
        assert_eq!(payload["properties"]["링크"], json!({"url": null}));
    }
}
