use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::WarehouseConfig;
use crate::models::bigquery::{
    InsertJobRequest, Job, JobConfiguration, LoadConfiguration, TableReference,
};
use crate::services::sink::{Sink, StoreError};

const SOURCE_FORMAT: &str = "NEWLINE_DELIMITED_JSON";
const WRITE_DISPOSITION: &str = "WRITE_TRUNCATE";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Runs BigQuery load jobs from NDJSON objects in Cloud Storage.
pub struct BigQueryLoader {
    client: Client,
    base_url: String,
    table: TableReference,
    access_token: Option<String>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl BigQueryLoader {
    pub fn new(config: &WarehouseConfig) -> Result<Self, StoreError> {
        let field = |value: &Option<String>, name: &str| {
            value
                .clone()
                .ok_or_else(|| StoreError::Config(format!("warehouse {name} not set")))
        };
        let table = TableReference {
            project_id: field(&config.project_id, "project id")?,
            dataset_id: field(&config.dataset_id, "dataset id")?,
            table_id: field(&config.table_id, "table id")?,
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            table,
            access_token: config.access_token.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_wait: Duration::from_secs(config.max_wait_secs),
        })
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn read_job(res: reqwest::Response) -> Result<Job, StoreError> {
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            error!("BigQuery returned {} - {}", status, body);
            return Err(StoreError::Status { status, body });
        }
        res.json::<Job>()
            .await
            .map_err(|e| StoreError::Load(format!("unreadable job resource: {e}")))
    }

    async fn insert_job(&self, source_uri: &str) -> Result<Job, StoreError> {
        let url = format!(
            "{}/bigquery/v2/projects/{}/jobs",
            self.base_url, self.table.project_id
        );
        let body = InsertJobRequest {
            configuration: JobConfiguration {
                load: LoadConfiguration {
                    source_uris: vec![source_uri.to_string()],
                    source_format: SOURCE_FORMAT.to_string(),
                    autodetect: true,
                    write_disposition: WRITE_DISPOSITION.to_string(),
                    destination_table: self.table.clone(),
                },
            },
        };

        let res = self
            .authorize(self.client.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        Self::read_job(res).await
    }

    async fn get_job(&self, job: &Job) -> Result<Job, StoreError> {
        let reference = &job.job_reference;
        let url = format!(
            "{}/bigquery/v2/projects/{}/jobs/{}",
            self.base_url, reference.project_id, reference.job_id
        );

        let mut req = self.client.get(&url);
        if let Some(location) = &reference.location {
            req = req.query(&[("location", location)]);
        }

        let res = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        Self::read_job(res).await
    }

    /// Loads `source_uri` into the configured table and waits for the job to finish.
    pub async fn load(&self, source_uri: &str) -> Result<(), StoreError> {
        let started = Instant::now();
        let mut job = self.insert_job(source_uri).await?;
        info!(
            "Started load job {} for {} into {}.{}",
            job.job_reference.job_id, source_uri, self.table.dataset_id, self.table.table_id
        );

        loop {
            if let Some(status) = job.status.as_ref().filter(|s| s.is_done()) {
                if let Some(err) = &status.error_result {
                    let reason = err.reason.as_deref().unwrap_or("unknown");
                    let message = err.message.as_deref().unwrap_or_default();
                    error!(
                        "Load job {} failed: {} {}",
                        job.job_reference.job_id, reason, message
                    );
                    return Err(StoreError::Load(format!(
                        "job completed with error: {reason}: {message}"
                    )));
                }
                info!(
                    "Load job {} finished in {:?}",
                    job.job_reference.job_id,
                    started.elapsed()
                );
                return Ok(());
            }

            if started.elapsed() >= self.max_wait {
                return Err(StoreError::Load(format!(
                    "job {} did not finish within {:?}",
                    job.job_reference.job_id, self.max_wait
                )));
            }

            debug!("Load job {} still running", job.job_reference.job_id);
            tokio::time::sleep(self.poll_interval).await;
            job = self.get_job(&job).await?;
        }
    }
}

/// Stores through an inner sink, then loads what it wrote into the warehouse.
pub struct WarehouseSink {
    inner: Arc<dyn Sink>,
    loader: BigQueryLoader,
}

impl WarehouseSink {
    pub fn new(inner: Arc<dyn Sink>, loader: BigQueryLoader) -> Self {
        Self { inner, loader }
    }
}

#[async_trait]
impl Sink for WarehouseSink {
    async fn store(&self, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.inner.store(bytes).await?;
        self.loader.load(&self.inner.location()).await
    }

    fn location(&self) -> String {
        self.inner.location()
    }
}
