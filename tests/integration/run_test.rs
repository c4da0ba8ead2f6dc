// End-to-end pipeline runs through POST /
use super::test_utils::{TestServer, OBJECT_PATH};
use axum::body::to_bytes;
use axum::http::StatusCode;
use insight_etl::models::PeriodRecord;
use serde_json::Value;

/// Reasonable body size limit for tests (1MB)
const TEST_BODY_LIMIT: usize = 1024 * 1024;

#[tokio::test]
async fn test_run_writes_ndjson_file() {
    let server = TestServer::new().await;

    let response = server.call(TestServer::make_request("POST", "/")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), TEST_BODY_LIMIT)
        .await
        .expect("Failed to read run response body");
    let json: Value = serde_json::from_slice(&body).expect("Run response is not valid JSON");
    assert_eq!(json["records"], 2);
    assert!(json["file"].as_str().unwrap().ends_with(OBJECT_PATH));
    assert!(json.get("run_id").is_some());

    let written = std::fs::read_to_string(server.output_path()).expect("Output file missing");
    assert!(written.ends_with('\n'));

    let records: Vec<PeriodRecord> = written
        .lines()
        .map(|line| serde_json::from_str(line).expect("Line is not a record"))
        .collect();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].period, 675);
    assert_eq!(records[0].temp_avg, -62.314);
    assert_eq!(records[0].pressure_max, 768.791);
    assert_eq!(records[0].wind_speed_max, 22.455);
    assert_eq!(records[0].start_time, "2020-10-19T18:32:20Z");

    // Sol 676 has no PRE group.
    assert_eq!(records[1].period, 676);
    assert_eq!(records[1].pressure_avg, 0.0);
    assert_eq!(records[1].pressure_min, 0.0);
    assert_eq!(records[1].pressure_max, 0.0);
    assert_eq!(records[1].end_time, "2020-10-21T19:51:31Z");
}

#[tokio::test]
async fn test_run_with_empty_feed_writes_empty_file() {
    let server = TestServer::with_feed(200, r#"{"sol_keys": []}"#).await;

    let response = server.call(TestServer::make_request("POST", "/")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let written = std::fs::read(server.output_path()).expect("Output file missing");
    assert!(written.is_empty());
}

#[tokio::test]
async fn test_run_fetches_once_per_request() {
    let server = TestServer::new().await;

    for _ in 0..2 {
        let response = server.call(TestServer::make_request("POST", "/")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let requests = server
        .upstream
        .received_requests()
        .await
        .expect("Request recording is enabled");
    assert_eq!(requests.len(), 2);
    assert!(requests
        .iter()
        .all(|r| r.url.query().unwrap_or_default().contains("feedtype=json")));
}
