//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use std::sync::Arc;

use serde_json::{Value, json};
use shelf_archiver_core::{
    CatalogClient, ConfigStore, DatabaseClient, MemoryKeyValueStore, ProxyFetchClient, Session,
    Transport, TransportMode,
};

/// Session over an in-memory store whose clients call `base_uri` directly.
///
/// The catalog is served at `{base_uri}/ttb/api/ItemSearch.aspx` and the
/// database API at `{base_uri}/v1`.
pub fn direct_session(
    base_uri: &str,
    entries: &[(&str, &str)],
) -> Session<MemoryKeyValueStore> {
    let transport: Arc<dyn Transport> =
        Arc::new(ProxyFetchClient::new(TransportMode::Direct).expect("client builds"));
    session_over(transport, base_uri, entries)
}

/// Session whose clients share `transport`, with service endpoints under `base_uri`.
pub fn session_over(
    transport: Arc<dyn Transport>,
    base_uri: &str,
    entries: &[(&str, &str)],
) -> Session<MemoryKeyValueStore> {
    Session::new(
        ConfigStore::open(MemoryKeyValueStore::with_entries(entries)),
        CatalogClient::with_endpoint(
            Arc::clone(&transport),
            format!("{base_uri}/ttb/api/ItemSearch.aspx"),
        ),
        DatabaseClient::with_base_url(transport, format!("{base_uri}/v1")),
    )
}

/// Database search body with one fully bound database `db-1`.
pub fn database_search_body() -> Value {
    json!({
        "object": "list",
        "results": [
            {
                "object": "database",
                "id": "db-1",
                "title": [{"plain_text": "서재"}],
                "properties": {
                    "Name": {"id": "title", "type": "title", "title": {}},
                    "작가": {"id": "a1", "type": "rich_text", "rich_text": {}},
                    "링크": {"id": "l1", "type": "url", "url": {}}
                }
            },
            {"object": "page", "id": "page-x"}
        ]
    })
}

/// Catalog body with two books.
pub fn catalog_body() -> Value {
    json!({
        "totalResults": 2,
        "item": [
            {
                "itemId": 123,
                "title": "토지 1",
                "author": "박경리",
                "description": "대하소설",
                "cover": "http://image.aladin.co.kr/product/1/coversum/1.jpg",
                "link": "http://www.aladin.co.kr/shop/wproduct.aspx?ItemId=123",
                "publisher": "다산책방",
                "pubDate": "2023-01-01",
                "isbn13": "9791130600000"
            },
            {
                "itemId": "456",
                "title": "토지 2",
                "author": "박경리",
                "cover": "",
                "link": ""
            }
        ]
    })
}
