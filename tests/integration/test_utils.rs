// Test utilities for end-to-end pipeline runs
use axum::{body::Body, http::Request, Router};
use insight_etl::config::{
    AppConfig, LogConfig, ServerConfig, StorageBackend, StorageConfig, UpstreamConfig,
    WarehouseConfig,
};
use insight_etl::handlers;
use insight_etl::services::metrics::Metrics;
use insight_etl::services::pipeline::Pipeline;
use insight_etl::state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const OBJECT_PATH: &str = "insight/latest.ndjson";
pub const FEED_PATH: &str = "/insight_weather/";

/// Trimmed InSight feed: sol 675 is complete, sol 676 has no pressure sensor.
pub const SAMPLE_FEED: &str = r#"{
    "sol_keys": ["675", "676"],
    "675": {
        "AT": {"av": -62.314, "ct": 177556, "mn": -96.872, "mx": -15.908},
        "HWS": {"av": 7.233, "ct": 88628, "mn": 1.051, "mx": 22.455},
        "PRE": {"av": 750.563, "ct": 887776, "mn": 722.0901, "mx": 768.791},
        "First_UTC": "2020-10-19T18:32:20Z",
        "Last_UTC": "2020-10-20T19:11:55Z",
        "Season": "summer"
    },
    "676": {
        "AT": {"av": -62.812, "ct": 177556, "mn": -96.912, "mx": -16.499},
        "HWS": {"av": 8.526, "ct": 88628, "mn": 1.11, "mx": 26.567},
        "First_UTC": "2020-10-20T19:11:55Z",
        "Last_UTC": "2020-10-21T19:51:31Z",
        "Season": "summer"
    },
    "validity_checks": {"sol_hours_required": 18, "sols_checked": ["675", "676"]}
}"#;

pub struct TestServer {
    pub app: Router,
    pub upstream: MockServer,
    pub output: TempDir,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::with_feed(200, SAMPLE_FEED).await
    }

    pub async fn with_feed(status: u16, body: &str) -> Self {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FEED_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&upstream)
            .await;

        let output = tempfile::tempdir().expect("Failed to create output directory");

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                max_request_size: 64 * 1024,
            },
            log: LogConfig {
                level: "error".to_string(), // Quiet during tests
                format: "pretty".to_string(),
            },
            upstream: UpstreamConfig {
                base_url: format!("{}{}", upstream.uri(), FEED_PATH),
                api_key: "DEMO_KEY".to_string(),
                feed_type: "json".to_string(),
                version: "1.0".to_string(),
                timeout_secs: 5,
            },
            storage: StorageConfig {
                backend: StorageBackend::File,
                bucket: None,
                object_path: Some(OBJECT_PATH.to_string()),
                base_url: "http://localhost".to_string(),
                local_dir: Some(output.path().display().to_string()),
                access_token: None,
                timeout_secs: 5,
            },
            warehouse: WarehouseConfig {
                enabled: false,
                project_id: None,
                dataset_id: None,
                table_id: None,
                base_url: "http://localhost".to_string(),
                access_token: None,
                poll_interval_ms: 10,
                max_wait_secs: 1,
            },
        };
        config.check().expect("Test configuration should be valid");

        let pipeline = Pipeline::from_config(&config).expect("Failed to build pipeline");
        let state = AppState {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            metrics: Arc::new(Metrics::new()),
        };

        let app = handlers::routes().with_state(state);

        Self {
            app,
            upstream,
            output,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.path().join(OBJECT_PATH)
    }

    pub async fn call(&self, req: Request<Body>) -> axum::response::Response {
        self.app.clone().oneshot(req).await.unwrap()
    }

    pub fn make_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }
}
