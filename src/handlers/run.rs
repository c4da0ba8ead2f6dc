use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use std::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

use crate::services::pipeline::PipelineError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub message: String,
    pub file: String,
    pub records: usize,
    pub run_id: Uuid,
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Runs the pipeline once: fetch, normalize, serialize, store (and load).
pub async fn run_pipeline(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, PipelineError> {
    let started = Instant::now();
    info!("Pipeline run requested");

    match state.pipeline.run().await {
        Ok(summary) => {
            state
                .metrics
                .record_success(summary.records, elapsed_ms(started))
                .await;

            Ok(Json(RunResponse {
                message: "Successfully uploaded and loaded transformed weather data".to_string(),
                file: summary.location,
                records: summary.records,
                run_id: summary.run_id,
            }))
        }
        Err(e) => {
            error!("Pipeline run failed at {} stage: {}", e.stage(), e);
            state
                .metrics
                .record_failure(e.stage(), elapsed_ms(started))
                .await;
            Err(e)
        }
    }
}
