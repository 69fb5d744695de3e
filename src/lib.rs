//! lesionscan - An authenticated HTTP service for skin lesion image classification.
//!
//! A frozen two-class network (`benign` / `malignant`) is loaded once at
//! startup. Clients exchange the admin credentials for a bearer token, then
//! upload an image and receive the predicted class with its confidence.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        lesionscan                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  HTTP: CORS | Router | Static frontend | Health | Metrics   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Auth: Credential check | HS256 tokens | Bearer middleware  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Classifier: Decode/resize | ONNX forward pass | Softmax    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use lesionscan::config::LesionConfig;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> lesionscan::Result<()> {
//!     let config = LesionConfig::from_file(Path::new("lesionscan.json"))?;
//!     lesionscan::run(config).await
//! }
//! ```

pub mod config;
pub mod error;

pub mod auth;
pub mod classifier;
pub mod health;
pub mod server;
pub mod shutdown;

pub mod cli;
pub mod observability;

// Re-exports
pub use error::{LesionError, Result};

use classifier::{ClassLabels, Classifier, OnnxClassifier};
use config::LesionConfig;
use server::AppState;
use shutdown::ShutdownCoordinator;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Run the lesionscan server with the given configuration.
///
/// Returns an error without binding the port if the configuration is
/// invalid or the model cannot be loaded.
pub async fn run(config: LesionConfig) -> Result<()> {
    observability::init(&config.observability)?;
    config.validate()?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting lesionscan");

    let metrics = observability::install_metrics(&config.observability)?;

    let labels = ClassLabels::new(config.model.labels.iter().cloned())?;
    let model: Arc<dyn Classifier> = Arc::new(OnnxClassifier::load(&config.model, &labels)?);

    let state = AppState::from_config(&config, model, metrics)?;
    let router = server::build_router(state, config.server.max_upload_bytes);

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(addr).await?;

    let coordinator = ShutdownCoordinator::new();
    tokio::spawn(shutdown::shutdown_on_signal(coordinator.clone()));

    server::serve(listener, router, coordinator).await
}
