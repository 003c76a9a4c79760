//! Integration tests for relay and public-proxy routing through the real
//! catalog and database clients.
//!
//! Service hosts are fictional: only the mocked relay or bridge is reachable,
//! so a passing test proves the request was routed.

use std::sync::Arc;

use serde_json::json;
use shelf_archiver_core::{
    ActionError, ProxyFetchClient, SearchScope, Transport, TransportMode,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::{socket_skip_return, start_mock_server_or_skip};
use support::{catalog_body, database_search_body, session_over};

const SERVICE_BASE: &str = "https://services.invalid";

const CREDENTIALS: [(&str, &str); 3] = [
    ("notion_token", "secret_token"),
    ("notion_db_id", "db-1"),
    ("aladdin_ttb_key", "ttb-key"),
];

fn transport(mode: TransportMode) -> Arc<dyn Transport> {
    Arc::new(ProxyFetchClient::new(mode).unwrap())
}

#[tokio::test]
async fn test_relay_routes_catalog_and_database_calls() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/api/relay"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body()))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/relay"))
        .and(header("x-target-url", "https://services.invalid/v1/search"))
        .and(header("authorization", "Bearer secret_token"))
        .and(body_partial_json(
            json!({"filter": {"property": "object", "value": "database"}}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(database_search_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let relay = TransportMode::relay(&format!("{}/api/relay", mock_server.uri())).unwrap();
    let mut session = session_over(transport(relay), SERVICE_BASE, &CREDENTIALS);

    let books = session.search("토지", SearchScope::Book).await.unwrap();
    assert_eq!(books.len(), 2);
    let collections = session.refresh_collections().await.unwrap();
    assert_eq!(collections.len(), 1);

    let requests = mock_server.received_requests().await.unwrap();
    let catalog_target = requests[0]
        .headers
        .get("x-target-url")
        .and_then(|value| value.to_str().ok())
        .unwrap();
    assert!(catalog_target.starts_with("https://services.invalid/ttb/api/ItemSearch.aspx?"));
    assert!(catalog_target.contains("ttbkey=ttb-key"));
}

#[tokio::test]
async fn test_public_proxy_embeds_encoded_target() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/raw"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let bridge =
        TransportMode::public_proxy(&format!("{}/raw", mock_server.uri()), "url").unwrap();
    let session = session_over(transport(bridge), SERVICE_BASE, &CREDENTIALS);

    let books = session.search("토지 박경리", SearchScope::EBook).await.unwrap();
    assert_eq!(books[0].title, "토지 1");

    let requests = mock_server.received_requests().await.unwrap();
    let (_, target) = requests[0]
        .url
        .query_pairs()
        .find(|(name, _)| name == "url")
        .unwrap();
    let target = url::Url::parse(&target).unwrap();
    assert_eq!(target.host_str(), Some("services.invalid"));
    let query: Vec<(String, String)> = target
        .query_pairs()
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    assert!(query.contains(&("Query".to_string(), "토지 박경리".to_string())));
    assert!(query.contains(&("SearchTarget".to_string(), "eBook".to_string())));
}

#[tokio::test]
async fn test_relay_and_proxy_classify_failures_alike() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    let unauthorized = json!({"object": "error", "status": 401, "message": "API token is invalid."});
    Mock::given(method("POST"))
        .and(path("/api/relay"))
        .respond_with(ResponseTemplate::new(401).set_body_json(unauthorized.clone()))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/raw"))
        .respond_with(ResponseTemplate::new(401).set_body_json(unauthorized))
        .mount(&mock_server)
        .await;

    let relay = TransportMode::relay(&format!("{}/api/relay", mock_server.uri())).unwrap();
    let bridge =
        TransportMode::public_proxy(&format!("{}/raw", mock_server.uri()), "url").unwrap();

    for mode in [relay, bridge] {
        let mut session = session_over(transport(mode), SERVICE_BASE, &CREDENTIALS);
        let err = session.refresh_collections().await.unwrap_err();
        let ActionError::Unauthorized { message } = &err else {
            panic!("expected unauthorized, got {err:?}");
        };
        assert_eq!(message, "API token is invalid.");
        assert!(err.status().text.contains("Re-check"));
    }
}

#[tokio::test]
async fn test_bridge_gateway_timeout_is_timeout() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/raw"))
        .respond_with(ResponseTemplate::new(504).set_body_string("gateway timeout"))
        .mount(&mock_server)
        .await;

    let bridge =
        TransportMode::public_proxy(&format!("{}/raw", mock_server.uri()), "url").unwrap();
    let session = session_over(transport(bridge), SERVICE_BASE, &CREDENTIALS);

    let err = session.search("토지", SearchScope::Book).await.unwrap_err();
    assert!(matches!(err, ActionError::Timeout { .. }));
}

#[tokio::test]
async fn test_unreachable_relay_is_network_failure() {
    let relay = TransportMode::relay("http://127.0.0.1:9/api/relay").unwrap();
    let session = session_over(transport(relay), SERVICE_BASE, &CREDENTIALS);

    let err = session.search("토지", SearchScope::Book).await.unwrap_err();
    assert!(matches!(err, ActionError::Network { .. }));
    assert!(err.status().text.contains("Retry later"));
}
