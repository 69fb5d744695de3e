//! Observability module for lesionscan.
//!
//! Provides logging and Prometheus metrics.

use crate::config::ObservabilityConfig;
use crate::error::{LesionError, Result};
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use ::tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| LesionError::Internal(format!("Failed to init logging: {}", e)))?;
    } else {
        subscriber
            .with(fmt::layer())
            .try_init()
            .map_err(|e| LesionError::Internal(format!("Failed to init logging: {}", e)))?;
    }

    info!("Observability initialized");
    Ok(())
}

/// Install the global Prometheus recorder.
///
/// Returns `None` when metrics are disabled. The handle renders the scrape
/// output for the `/metrics` route.
pub fn install_metrics(config: &ObservabilityConfig) -> Result<Option<PrometheusHandle>> {
    if !config.metrics_enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| LesionError::Internal(format!("Failed to install metrics recorder: {}", e)))?;

    register_metrics();
    info!("Prometheus metrics enabled");
    Ok(Some(handle))
}

/// Register standard metrics so they appear before the first event.
fn register_metrics() {
    counter!("lesionscan_login_total", "outcome" => "success").absolute(0);
    counter!("lesionscan_login_total", "outcome" => "rejected").absolute(0);
    counter!("lesionscan_auth_rejections_total").absolute(0);
    counter!("lesionscan_predict_errors_total").absolute(0);
}

/// Record a login attempt.
pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "rejected" };
    counter!("lesionscan_login_total", "outcome" => outcome).increment(1);
}

/// Record a rejected bearer token.
pub fn record_auth_rejection() {
    counter!("lesionscan_auth_rejections_total").increment(1);
}

/// Record a completed prediction.
pub fn record_prediction(label: &str) {
    counter!("lesionscan_predictions_total", "class" => label.to_string()).increment(1);
}

/// Record a failed prediction request.
pub fn record_predict_error() {
    counter!("lesionscan_predict_errors_total").increment(1);
}
