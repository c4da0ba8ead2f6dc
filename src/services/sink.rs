use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use crate::config::StorageConfig;

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
    #[error("Storage request failed: {0}")]
    Network(String),
    #[error("Storage returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to write file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Load job failed: {0}")]
    Load(String),
    #[error("Storage misconfigured: {0}")]
    Config(String),
}

/// Destination for serialized records. Receives the bytes verbatim.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn store(&self, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// URI of the object this sink writes.
    fn location(&self) -> String;
}

/// Uploads to a Google Cloud Storage bucket with a single media upload.
pub struct GcsSink {
    client: Client,
    base_url: String,
    bucket: String,
    object_path: String,
    access_token: Option<String>,
}

impl GcsSink {
    pub fn new(config: &StorageConfig) -> Result<Self, StoreError> {
        let bucket = config
            .bucket
            .clone()
            .ok_or_else(|| StoreError::Config("bucket not set".to_string()))?;
        let object_path = config
            .object_path
            .clone()
            .ok_or_else(|| StoreError::Config("object path not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bucket,
            object_path,
            access_token: config.access_token.clone(),
        })
    }
}

#[async_trait]
impl Sink for GcsSink {
    async fn store(&self, bytes: Vec<u8>) -> Result<(), StoreError> {
        let url = format!("{}/upload/storage/v1/b/{}/o", self.base_url, self.bucket);
        let size = bytes.len();

        let mut req = self
            .client
            .post(&url)
            .query(&[("uploadType", "media"), ("name", self.object_path.as_str())])
            .header(reqwest::header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)
            .body(bytes);
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }

        let res = req.send().await.map_err(|e| {
            error!("Storage upload error: {}", e);
            StoreError::Network(e.to_string())
        })?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            error!("Storage upload rejected: {} - {}", status, body);
            return Err(StoreError::Status { status, body });
        }

        info!("Uploaded {} bytes to {}", size, self.location());
        Ok(())
    }

    fn location(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.object_path)
    }
}

/// Writes to the local filesystem, for runs without a bucket.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, StoreError> {
        let dir = config
            .local_dir
            .as_deref()
            .ok_or_else(|| StoreError::Config("local directory not set".to_string()))?;
        let object_path = config
            .object_path
            .as_deref()
            .ok_or_else(|| StoreError::Config("object path not set".to_string()))?;
        Ok(Self::new(PathBuf::from(dir).join(object_path)))
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn store(&self, bytes: Vec<u8>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, &bytes).await?;
        info!("Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
