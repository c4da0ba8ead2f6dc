use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::state::AppState;

const CACHE_CONTROL_NO_CACHE: &str = "no-cache, no-store, must-revalidate";

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.metrics.get_stats().await;

    (
        [(
            header::CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_NO_CACHE),
        )],
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "sink": state.pipeline.location(),
            "warehouse_enabled": state.config.warehouse.enabled,
            "last_run_at": stats.last_run_at,
        })),
    )
}
