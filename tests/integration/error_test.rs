// Failure responses: stage-tagged JSON errors, nothing written
use super::test_utils::TestServer;
use axum::body::to_bytes;
use axum::http::StatusCode;
use serde_json::Value;

const TEST_BODY_LIMIT: usize = 1024 * 1024;

async fn error_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), TEST_BODY_LIMIT)
        .await
        .expect("Failed to read error response body");
    serde_json::from_slice(&body).expect("Error response is not valid JSON")
}

#[tokio::test]
async fn test_upstream_error_status() {
    let server = TestServer::with_feed(500, "oops").await;

    let response = server.call(TestServer::make_request("POST", "/")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = error_json(response).await;
    assert_eq!(json["error"]["code"], "fetch_failed");
    assert_eq!(json["error"]["type"], "upstream_error");
    assert!(!server.output_path().exists());
}

#[tokio::test]
async fn test_invalid_sol_key_fails_without_output() {
    let feed = r#"{"sol_keys": ["1", "abc"], "1": {}, "abc": {}}"#;
    let server = TestServer::with_feed(200, feed).await;

    let response = server.call(TestServer::make_request("POST", "/")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = error_json(response).await;
    assert_eq!(json["error"]["code"], "parse_failed");
    assert!(json["error"]["message"].as_str().unwrap().contains("abc"));
    assert!(!server.output_path().exists());
}

#[tokio::test]
async fn test_malformed_feed() {
    let server = TestServer::with_feed(200, "<html>maintenance</html>").await;

    let response = server.call(TestServer::make_request("POST", "/")).await;
    let json = error_json(response).await;
    assert_eq!(json["error"]["code"], "parse_failed");
}

#[tokio::test]
async fn test_get_on_trigger_is_not_allowed() {
    let server = TestServer::new().await;

    let response = server.call(TestServer::make_request("GET", "/")).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(!server.output_path().exists());
}

#[tokio::test]
async fn test_404_not_found() {
    let server = TestServer::new().await;

    let response = server
        .call(TestServer::make_request("GET", "/nonexistent"))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
