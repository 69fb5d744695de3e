//! HTTP server for lesionscan.
//!
//! Routes:
//! - `GET /` and `GET /static/*path`: the prebuilt frontend
//! - `GET /ping`, `GET /health`, `GET /metrics`
//! - `POST /token`: exchange admin credentials for a bearer token
//! - `POST /predict`: classify an uploaded image (bearer token required)

mod cors;
mod frontend;
mod handlers;
mod validation;

pub use cors::cors_middleware;
pub use frontend::{content_type_for, Asset, FrontendAssets};
pub use handlers::{LoginForm, TokenResponse, UPLOAD_FIELD};
pub use validation::{is_within_base, normalize_path, validate_asset_path};

use crate::auth::{require_bearer, AuthState, Authenticator};
use crate::classifier::{ClassLabels, Classifier, InferenceService, Preprocessor};
use crate::config::LesionConfig;
use crate::error::{LesionError, Result};
use crate::shutdown::ShutdownCoordinator;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Shared state handed to every handler.
///
/// Everything inside is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub inference: InferenceService,
    pub auth: AuthState,
    pub frontend: Arc<FrontendAssets>,
    pub metrics: Option<PrometheusHandle>,
    pub started_at: Instant,
}

impl AppState {
    /// Create the state with the clock started now.
    pub fn new(
        inference: InferenceService,
        auth: AuthState,
        frontend: FrontendAssets,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            inference,
            auth,
            frontend: Arc::new(frontend),
            metrics,
            started_at: Instant::now(),
        }
    }

    /// Wire the state from configuration around an already loaded model.
    pub fn from_config(
        config: &LesionConfig,
        model: Arc<dyn Classifier>,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self> {
        let labels = ClassLabels::new(config.model.labels.iter().cloned())?;
        let preprocessor = Preprocessor::new(config.model.preprocess.clone());
        let inference = InferenceService::new(model, labels, preprocessor)?;

        let authenticator = Authenticator::from_config(&config.auth)?;
        let auth = AuthState::new(Arc::new(authenticator));

        let frontend = FrontendAssets::new(&config.frontend.dir);
        if !frontend.has_index() {
            warn!(dir = %config.frontend.dir.display(), "Frontend bundle not found; GET / will return 404");
        }

        Ok(Self::new(inference, auth, frontend, metrics))
    }
}

/// Build the application router.
///
/// Middleware order (outermost to innermost): CORS -> body limit -> auth
/// (`/predict` only).
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let protected = Router::new()
        .route("/predict", post(handlers::predict))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_bearer,
        ));

    Router::new()
        .route("/", get(handlers::index))
        .route("/static/*path", get(handlers::static_asset))
        .route("/ping", get(handlers::ping))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/token", post(handlers::login))
        .merge(protected)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn(cors_middleware))
}

/// Serve `router` on `listener` until `shutdown` fires.
///
/// In-flight requests get [`ShutdownCoordinator::timeout`] to finish.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: ShutdownCoordinator,
) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(addr = %addr, "lesionscan listening");

    let signal = shutdown.clone();
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move { signal.wait_for_shutdown().await })
        .into_future();
    tokio::pin!(server);

    let drain_deadline = async {
        shutdown.wait_for_shutdown().await;
        tokio::time::sleep(shutdown.timeout()).await;
    };

    tokio::select! {
        result = &mut server => {
            result.map_err(|e| LesionError::Internal(format!("Server error: {}", e)))?;
        }
        _ = drain_deadline => {
            warn!(timeout = ?shutdown.timeout(), "Shutdown timed out with requests in flight");
        }
    }

    info!("lesionscan stopped");
    Ok(())
}
