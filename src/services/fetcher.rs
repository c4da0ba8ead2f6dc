use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

use crate::config::UpstreamConfig;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
    #[error("Request to weather API failed: {0}")]
    Network(String),
    #[error("Weather API returned unexpected status {status}")]
    Status { status: u16 },
    #[error("Failed to read weather API response body: {0}")]
    Body(String),
}

/// Source of the raw, unparsed weather feed.
#[async_trait]
pub trait RawFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError>;
}

/// Fetches the feed from the NASA InSight weather endpoint.
pub struct InsightFetcher {
    client: Client,
    base_url: String,
    api_key: String,
    feed_type: String,
    version: String,
}

impl InsightFetcher {
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            feed_type: config.feed_type.clone(),
            version: config.version.clone(),
        })
    }
}

#[async_trait]
impl RawFetcher for InsightFetcher {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        debug!("Fetching weather feed from {}", self.base_url);

        let res = self
            .client
            .get(&self.base_url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("feedtype", self.feed_type.as_str()),
                ("ver", self.version.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Weather API network error: {}", e);
                FetchError::Network(e.to_string())
            })?;

        if res.status() != reqwest::StatusCode::OK {
            let status = res.status().as_u16();
            error!("Weather API returned status {}", status);
            return Err(FetchError::Status { status });
        }

        let body = res
            .bytes()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        debug!("Fetched {} bytes of weather data", body.len());
        Ok(body.to_vec())
    }
}
