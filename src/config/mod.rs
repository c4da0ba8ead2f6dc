use config::{Config, ConfigError};
use serde::Deserialize;
use std::env;
use validator::Validate;

const DEFAULT_MAX_REQUEST_SIZE: usize = 64 * 1024;
const DEFAULT_UPSTREAM_URL: &str = "https://api.nasa.gov/insight_weather/";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STORAGE_URL: &str = "https://storage.googleapis.com";
const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 120;
const DEFAULT_WAREHOUSE_URL: &str = "https://bigquery.googleapis.com";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_MAX_WAIT_SECS: u64 = 300;

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

fn default_max_request_size() -> usize {
    DEFAULT_MAX_REQUEST_SIZE
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct LogConfig {
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_format() -> String {
    "pretty".to_string()
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct UpstreamConfig {
    #[validate(length(min = 1))]
    pub base_url: String,
    #[validate(length(min = 1))]
    pub api_key: String,
    pub feed_type: String,
    pub version: String,
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Gcs,
    File,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: Option<String>,
    pub object_path: Option<String>,
    #[validate(length(min = 1))]
    pub base_url: String,
    pub local_dir: Option<String>,
    pub access_token: Option<String>,
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct WarehouseConfig {
    pub enabled: bool,
    pub project_id: Option<String>,
    pub dataset_id: Option<String>,
    pub table_id: Option<String>,
    #[validate(length(min = 1))]
    pub base_url: String,
    pub access_token: Option<String>,
    #[validate(range(min = 1))]
    pub poll_interval_ms: u64,
    #[validate(range(min = 1))]
    pub max_wait_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub log: LogConfig,
    #[validate(nested)]
    pub upstream: UpstreamConfig,
    #[validate(nested)]
    pub storage: StorageConfig,
    #[validate(nested)]
    pub warehouse: WarehouseConfig,
}

fn parse_port(value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|e| {
        ConfigError::Message(format!(
            "Invalid port value '{}': {}. Port must be a number between 1 and 65535.",
            value, e
        ))
    })
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Builds from defaults and the process environment. `.env` files are
    /// loaded by the binary before this runs.
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.max_request_size", DEFAULT_MAX_REQUEST_SIZE as i64)?
            .set_default("log.level", "info")?
            .set_default("log.format", "pretty")?
            .set_default("upstream.base_url", DEFAULT_UPSTREAM_URL)?
            .set_default("upstream.api_key", "DEMO_KEY")?
            .set_default("upstream.feed_type", "json")?
            .set_default("upstream.version", "1.0")?
            .set_default("upstream.timeout_secs", DEFAULT_UPSTREAM_TIMEOUT_SECS)?
            .set_default("storage.backend", "gcs")?
            .set_default("storage.base_url", DEFAULT_STORAGE_URL)?
            .set_default("storage.timeout_secs", DEFAULT_STORAGE_TIMEOUT_SECS)?
            .set_default("warehouse.enabled", false)?
            .set_default("warehouse.base_url", DEFAULT_WAREHOUSE_URL)?
            .set_default("warehouse.poll_interval_ms", DEFAULT_POLL_INTERVAL_MS)?
            .set_default("warehouse.max_wait_secs", DEFAULT_MAX_WAIT_SECS)?
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // Variable names used by existing Cloud Run deployments.
            .set_override_option(
                "server.port",
                env::var("PORT").ok().map(|v| parse_port(&v)).transpose()?,
            )?
            .set_override_option("upstream.api_key", env::var("NASA_API_KEY").ok())?
            .set_override_option("storage.bucket", env::var("GCS_BUCKET").ok())?
            .set_override_option("storage.object_path", env::var("GCS_FILE_PATH").ok())?
            .set_override_option("warehouse.project_id", env::var("BQ_PROJECT_ID").ok())?
            .set_override_option("warehouse.dataset_id", env::var("BQ_DATASET_ID").ok())?
            .set_override_option("warehouse.table_id", env::var("BQ_TABLE_ID").ok())?
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Field validation plus the cross-section rules `validator` cannot express.
    pub fn check(&self) -> Result<(), ConfigError> {
        if let Err(e) = self.validate() {
            return Err(ConfigError::Message(format!("Validation error: {}", e)));
        }

        if !non_empty(&self.storage.object_path) {
            return Err(ConfigError::Message(
                "Missing configuration: GCS_FILE_PATH (or APP_STORAGE__OBJECT_PATH) is required"
                    .into(),
            ));
        }

        match self.storage.backend {
            StorageBackend::Gcs if !non_empty(&self.storage.bucket) => {
                return Err(ConfigError::Message(
                    "Missing configuration: GCS_BUCKET is required for the gcs storage backend"
                        .into(),
                ));
            }
            StorageBackend::File if !non_empty(&self.storage.local_dir) => {
                return Err(ConfigError::Message(
                    "Missing configuration: APP_STORAGE__LOCAL_DIR is required for the file storage backend".into(),
                ));
            }
            _ => {}
        }

        if self.warehouse.enabled {
            if self.storage.backend != StorageBackend::Gcs {
                return Err(ConfigError::Message(
                    "Warehouse loading reads from gs:// URIs and requires the gcs storage backend"
                        .into(),
                ));
            }
            if !non_empty(&self.warehouse.project_id)
                || !non_empty(&self.warehouse.dataset_id)
                || !non_empty(&self.warehouse.table_id)
            {
                return Err(ConfigError::Message(
                    "Missing configuration: BQ_PROJECT_ID, BQ_DATASET_ID and BQ_TABLE_ID are required when the warehouse is enabled".into(),
                ));
            }
        }

        Ok(())
    }
}
