//! Prometheus export and the domain counters recorded by handlers.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use service_core::error::AppError;
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Call once at startup before any metric
/// is recorded.
pub fn init_metrics() -> Result<(), AppError> {
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("failed to install Prometheus recorder: {}", e))
    })?;

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| AppError::ConfigError(anyhow::anyhow!("metrics already initialized")))
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

pub fn record_fruit_graded(grade: &str, status: &str) {
    counter!("fruits_graded_total", "grade" => grade.to_string(), "status" => status.to_string())
        .increment(1);
}

pub fn record_grading_failure(reason: &'static str) {
    counter!("fruit_grading_failures_total", "reason" => reason).increment(1);
}

pub fn record_order_placed(shipping_method: &str) {
    counter!("orders_placed_total", "shipping" => shipping_method.to_string()).increment(1);
}

pub fn record_login(outcome: &'static str) {
    counter!("auth_logins_total", "outcome" => outcome).increment(1);
}
