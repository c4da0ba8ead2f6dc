use crate::config::AppConfig;
use crate::services::metrics::Metrics;
use crate::services::pipeline::Pipeline;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<Pipeline>,
    pub metrics: Arc<Metrics>,
}
