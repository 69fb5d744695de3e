//! HTTP request handlers.

use super::AppState;
use crate::auth::AuthInfo;
use crate::classifier::Prediction;
use crate::error::{LesionError, Result};
use crate::health::{FrontendReport, HealthReport, ModelReport, PingResponse};
use crate::observability;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::FormRejection,
        Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Multipart field carrying the image.
pub const UPLOAD_FIELD: &str = "file";

/// Form body of `POST /token`.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// `GET /ping`
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse::default())
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let classifier = state.inference.model();

    let model = ModelReport {
        classes: classifier.num_classes(),
        labels: state.inference.labels().iter().map(str::to_string).collect(),
        device: classifier.device(),
    };
    let frontend = FrontendReport {
        dir: state.frontend.root().display().to_string(),
        index_present: state.frontend.has_index(),
    };

    Json(HealthReport::new(state.started_at.elapsed(), model, frontend))
}

/// `POST /token`
pub async fn login(
    State(state): State<AppState>,
    form: std::result::Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<TokenResponse>> {
    let Form(form) = form.map_err(|rejection| {
        debug!(error = %rejection, "Malformed login form");
        LesionError::Unprocessable(rejection.body_text())
    })?;

    let result = state
        .auth
        .authenticator()
        .login(&form.username, &form.password);
    observability::record_login(result.is_ok());

    let token = result?;
    Ok(Json(TokenResponse::bearer(token)))
}

/// `POST /predict`
///
/// The bearer middleware has already run; the upload is only read for
/// authenticated callers.
pub async fn predict(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Prediction>> {
    let result = classify_upload(&state, multipart).await;

    match &result {
        Ok(prediction) => {
            observability::record_prediction(&prediction.label);
            info!(
                subject = %auth.subject,
                class = %prediction.label,
                confidence = prediction.confidence,
                "Prediction served"
            );
        }
        Err(e) => {
            observability::record_predict_error();
            debug!(subject = %auth.subject, error = %e, "Prediction failed");
        }
    }

    result.map(Json)
}

async fn classify_upload(
    state: &AppState,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Prediction> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!(error = %rejection, "Request is not multipart");
        no_upload()
    })?;

    let image = read_upload(&mut multipart).await?;
    state.inference.predict(image).await
}

/// Read the first part named [`UPLOAD_FIELD`].
async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        debug!(filename = ?filename, size = bytes.len(), "Received upload");
        return Ok(bytes.to_vec());
    }

    Err(no_upload())
}

fn multipart_error(e: MultipartError) -> LesionError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        LesionError::PayloadTooLarge(e.body_text())
    } else {
        LesionError::BadRequest(e.body_text())
    }
}

fn no_upload() -> LesionError {
    LesionError::Unprocessable("No file uploaded".to_string())
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Result<Response> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| LesionError::NotFound("metrics are disabled".to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response())
}

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Result<Response> {
    let asset = state.frontend.index().await?;
    Ok(([(header::CONTENT_TYPE, asset.content_type)], asset.bytes).into_response())
}

/// `GET /static/*path`
pub async fn static_asset(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response> {
    let asset = state.frontend.load(&path).await?;
    Ok(([(header::CONTENT_TYPE, asset.content_type)], asset.bytes).into_response())
}
