pub mod errors;
pub mod health;
pub mod metrics;
pub mod run;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Routes served by the trigger service, without transport layers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(run::run_pipeline))
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .route(
            "/metrics/prometheus",
            get(metrics::prometheus_metrics_handler),
        )
}
