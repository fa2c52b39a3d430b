//! Logging and Prometheus metrics

use axum::{http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize logging: plain text in development, JSON in production
pub fn init_tracing(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "studentpass_server=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Install the Prometheus recorder
pub fn init_metrics() -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )?
        .install_recorder()?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("metrics already initialized"))?;

    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!("http_request_duration_seconds", "HTTP request duration in seconds");
    metrics::describe_counter!("predictions_total", "Records classified or rejected, by outcome");
    metrics::describe_histogram!("prediction_batch_size", "Records per prediction request");
    metrics::describe_counter!("model_load_failures_total", "Failed model loads at startup");

    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

/// GET /metrics
pub async fn handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics not initialized".to_string()),
    }
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

pub fn record_predictions(predicted: usize, rejected: usize) {
    metrics::counter!("predictions_total", "outcome" => "predicted").increment(predicted as u64);
    metrics::counter!("predictions_total", "outcome" => "rejected").increment(rejected as u64);
    metrics::histogram!("prediction_batch_size").record((predicted + rejected) as f64);
}

pub fn record_model_load_failure() {
    metrics::counter!("model_load_failures_total").increment(1);
}
