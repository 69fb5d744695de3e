//! Liveness and health reports.
//!
//! `/ping` is a fixed liveness check. `/health`
//! describes what the running process serves: the loaded model and whether
//! the frontend bundle is present. A process that is up always has a model,
//! since a failed load aborts startup, so health never reports unavailable.

use crate::config::Device;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed liveness acknowledgment.
pub const PING_MESSAGE: &str = "Hello, I am alive!";

/// Liveness response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}

impl Default for PingResponse {
    fn default() -> Self {
        Self {
            message: PING_MESSAGE.to_string(),
        }
    }
}

/// Overall state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Model loaded and frontend present.
    Healthy,
    /// The API works but `/` cannot be served.
    Degraded,
}

/// The loaded classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub classes: usize,
    pub labels: Vec<String>,
    pub device: Device,
}

/// The static frontend bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontendReport {
    pub dir: String,
    pub index_present: bool,
}

/// `/health` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    /// RFC 3339 time the report was built.
    pub timestamp: String,
    pub model: ModelReport,
    pub frontend: FrontendReport,
}

impl HealthReport {
    /// Build a report; the status follows from the parts.
    pub fn new(uptime: Duration, model: ModelReport, frontend: FrontendReport) -> Self {
        let status = if frontend.index_present {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        Self {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: uptime.as_secs(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            model,
            frontend,
        }
    }
}
