use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use tabsync_core::{HttpRemoteStore, RemoteError, RemoteStore};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store(server: &MockServer) -> HttpRemoteStore {
    HttpRemoteStore::new(server.uri()).with_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn get_returns_stored_blob() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/storage"))
        .and(query_param("key", "production1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"metadata": {}}])))
        .expect(1)
        .mount(&server)
        .await;

    let value = store(&server).get("production1").await.unwrap();

    assert_eq!(value, Some(json!([{"metadata": {}}])));
}

#[tokio::test]
async fn get_of_missing_key_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/storage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    assert_eq!(store(&server).get("tmpProduction").await.unwrap(), None);
}

#[tokio::test]
async fn get_server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "Failed to create storage directory"})),
        )
        .mount(&server)
        .await;

    let err = store(&server).get("production1").await.unwrap_err();

    assert!(matches!(err, RemoteError::Unavailable(ref details) if details.contains("storage directory")));
}

#[tokio::test]
async fn get_with_garbage_body_is_invalid_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops"))
        .mount(&server)
        .await;

    let err = store(&server).get("production1").await.unwrap_err();

    assert!(matches!(err, RemoteError::InvalidPayload(_)));
}

#[tokio::test]
async fn put_posts_body_and_requires_success_marker() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/storage"))
        .and(query_param("key", "production1"))
        .and(body_json(json!([{"request": {"production": []}}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    store(&server)
        .put("production1", &json!([{"request": {"production": []}}]))
        .await
        .unwrap();
}

#[tokio::test]
async fn put_without_success_marker_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "Failed to save data"})))
        .mount(&server)
        .await;

    let err = store(&server)
        .put("production1", &json!([]))
        .await
        .unwrap_err();

    assert_eq!(err, RemoteError::Rejected("Failed to save data".to_string()));
}

#[tokio::test]
async fn put_client_error_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Storage key is required"})))
        .mount(&server)
        .await;

    let err = store(&server)
        .put("production1", &json!([]))
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::Rejected(_)));
}

#[tokio::test]
async fn custom_endpoint_and_delete() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/storage.php"))
        .and(query_param("key", "production1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    HttpRemoteStore::new(server.uri())
        .with_endpoint("/api/storage.php")
        .delete("production1")
        .await
        .unwrap();
}

#[tokio::test]
async fn unreachable_server_is_unavailable() {
    let store = HttpRemoteStore::new("http://127.0.0.1:9").with_timeout(Duration::from_millis(500));

    let err = store.get("production1").await.unwrap_err();

    assert!(err.is_transient());
    assert!(matches!(err, RemoteError::Unavailable(_)));
}

#[tokio::test]
async fn invalid_key_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = store(&server).get("").await.unwrap_err();

    assert_eq!(err, RemoteError::InvalidKey(String::new()));
}
