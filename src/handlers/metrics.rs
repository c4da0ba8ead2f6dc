use crate::services::metrics::MetricsStats;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

const CACHE_CONTROL_NO_CACHE: &str = "no-cache, no-store, must-revalidate";
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
const METRIC_PREFIX: &str = "insight_etl_";

type MetricDefinition = (&'static str, &'static str, &'static str, String);

fn format_prometheus_metric(name: &str, help: &str, metric_type: &str, value: &str) -> String {
    format!(
        "# HELP {METRIC_PREFIX}{name} {help}\n# TYPE {METRIC_PREFIX}{name} {metric_type}\n{METRIC_PREFIX}{name} {value}\n"
    )
}

fn validate_metric_value(value: f64) -> f64 {
    if value.is_nan() || value.is_infinite() || value < 0.0 {
        0.0
    } else {
        value
    }
}

fn counter(name: &'static str, help: &'static str, value: u64) -> MetricDefinition {
    (name, help, "counter", value.to_string())
}

fn gauge(name: &'static str, help: &'static str, value: f64) -> MetricDefinition {
    (
        name,
        help,
        "gauge",
        format!("{:.2}", validate_metric_value(value)),
    )
}

fn duration_gauge(name: &'static str, help: &'static str, value: u64) -> MetricDefinition {
    (name, help, "gauge", value.to_string())
}

fn create_metric_definitions(stats: &MetricsStats) -> Vec<MetricDefinition> {
    let last_run_seconds = stats
        .last_run_at
        .map(|t| t.timestamp())
        .unwrap_or_default();

    vec![
        counter("runs_total", "Total number of pipeline runs", stats.total_runs),
        counter(
            "runs_failed_total",
            "Total number of failed pipeline runs",
            stats.failed_runs,
        ),
        counter(
            "fetch_failures_total",
            "Runs that failed fetching the weather feed",
            stats.fetch_failures,
        ),
        counter(
            "parse_failures_total",
            "Runs that failed normalizing the weather feed",
            stats.parse_failures,
        ),
        counter(
            "encode_failures_total",
            "Runs that failed encoding records as NDJSON",
            stats.encode_failures,
        ),
        counter(
            "store_failures_total",
            "Runs that failed storing or loading records",
            stats.store_failures,
        ),
        counter(
            "records_written_total",
            "Total number of records written",
            stats.records_written,
        ),
        (
            "last_run_records",
            "Records written by the most recent successful run",
            "gauge",
            stats.last_run_records.to_string(),
        ),
        (
            "last_run_timestamp_seconds",
            "Unix time of the most recent run",
            "gauge",
            last_run_seconds.to_string(),
        ),
        gauge(
            "run_success_rate",
            "Run success rate percentage",
            stats.success_rate,
        ),
        gauge(
            "run_duration_ms",
            "Average run duration in milliseconds",
            stats.avg_run_duration_ms,
        ),
        duration_gauge(
            "run_duration_p50_ms",
            "Median run duration in milliseconds",
            stats.p50_run_duration_ms,
        ),
        duration_gauge(
            "run_duration_p95_ms",
            "95th percentile run duration in milliseconds",
            stats.p95_run_duration_ms,
        ),
        duration_gauge(
            "run_duration_p99_ms",
            "99th percentile run duration in milliseconds",
            stats.p99_run_duration_ms,
        ),
    ]
}

fn build_prometheus_output(metric_definitions: &[MetricDefinition]) -> String {
    metric_definitions
        .iter()
        .map(|(name, help, metric_type, value)| {
            format_prometheus_metric(name, help, metric_type, value)
        })
        .collect()
}

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let metrics_data = state.metrics.get_stats().await;
    (
        [(
            header::CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_NO_CACHE),
        )],
        Json(metrics_data),
    )
}

pub async fn prometheus_metrics_handler(State(state): State<AppState>) -> Response {
    let stats = state.metrics.get_stats().await;
    let body = build_prometheus_output(&create_metric_definitions(&stats));

    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE),
            ),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static(CACHE_CONTROL_NO_CACHE),
            ),
        ],
        body,
    )
        .into_response()
}
