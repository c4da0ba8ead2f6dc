use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{AppConfig, StorageBackend};
use crate::services::fetcher::{FetchError, InsightFetcher, RawFetcher};
use crate::services::normalizer::{normalize, ParseError};
use crate::services::serializer::{serialize, EncodeError};
use crate::services::sink::{FileSink, GcsSink, Sink, StoreError};
use crate::services::warehouse::{BigQueryLoader, WarehouseSink};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to extract weather data: {0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to transform weather data: {0}")]
    Parse(#[from] ParseError),
    #[error("Failed to convert transformed data to NDJSON: {0}")]
    Encode(#[from] EncodeError),
    #[error("Failed to store weather data: {0}")]
    Store(#[from] StoreError),
}

/// Pipeline step a run failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Parse,
    Encode,
    Store,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Parse => "parse",
            Stage::Encode => "encode",
            Stage::Store => "store",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Fetch(_) => Stage::Fetch,
            PipelineError::Parse(_) => Stage::Parse,
            PipelineError::Encode(_) => Stage::Encode,
            PipelineError::Store(_) => Stage::Store,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub records: usize,
    pub bytes: usize,
    pub location: String,
    pub duration: Duration,
}

/// Fetch, normalize, serialize and store, once per call.
pub struct Pipeline {
    fetcher: Arc<dyn RawFetcher>,
    sink: Arc<dyn Sink>,
}

impl Pipeline {
    pub fn new(fetcher: Arc<dyn RawFetcher>, sink: Arc<dyn Sink>) -> Self {
        Self { fetcher, sink }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let fetcher = Arc::new(InsightFetcher::new(&config.upstream)?);

        let storage: Arc<dyn Sink> = match config.storage.backend {
            StorageBackend::Gcs => Arc::new(GcsSink::new(&config.storage)?) as Arc<dyn Sink>,
            StorageBackend::File => {
                Arc::new(FileSink::from_config(&config.storage)?) as Arc<dyn Sink>
            }
        };

        let sink: Arc<dyn Sink> = if config.warehouse.enabled {
            let loader = BigQueryLoader::new(&config.warehouse)?;
            Arc::new(WarehouseSink::new(storage, loader))
        } else {
            storage
        };

        Ok(Self::new(fetcher, sink))
    }

    pub fn location(&self) -> String {
        self.sink.location()
    }

    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id);
        self.execute(run_id).instrument(span).await
    }

    async fn execute(&self, run_id: Uuid) -> Result<RunSummary, PipelineError> {
        let started = Instant::now();

        let raw = self.fetcher.fetch().await?;
        let records = normalize(&raw).inspect_err(|e| warn!("Rejected weather feed: {}", e))?;
        info!("Normalized {} sols", records.len());

        let bytes = serialize(&records)?;
        let size = bytes.len();
        self.sink.store(bytes).await?;

        let summary = RunSummary {
            run_id,
            records: records.len(),
            bytes: size,
            location: self.sink.location(),
            duration: started.elapsed(),
        };
        info!(
            "Run complete: {} records, {} bytes -> {} in {:?}",
            summary.records, summary.bytes, summary.location, summary.duration
        );
        Ok(summary)
    }
}
