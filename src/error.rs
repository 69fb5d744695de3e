//! Error types for the lesionscan service.
//!
//! This module provides a unified error type [`LesionError`] for every
//! operation in the crate, along with a convenient [`Result`] type alias.
//!
//! # Error Categories
//!
//! - **Startup**: configuration problems and model load failures. These are
//!   returned from [`crate::run`] before the listener is bound.
//! - **Client input**: undecodable images, missing uploads, malformed forms.
//! - **Authentication**: bad credentials or an invalid bearer token.
//! - **Internal**: inference runtime failures and I/O errors.
//!
//! Every variant renders as an HTTP response with a JSON body of the form
//! `{"detail": "..."}`. Internal variants are logged in full and rendered with
//! a generic message.
//!
//! # Example
//!
//! ```rust
//! use lesionscan::error::{LesionError, Result};
//!
//! fn require_file(bytes: &[u8]) -> Result<&[u8]> {
//!     if bytes.is_empty() {
//!         return Err(LesionError::Unprocessable("No file uploaded".into()));
//!     }
//!     Ok(bytes)
//! }
//!
//! assert_eq!(require_file(&[]).unwrap_err().status_code().as_u16(), 422);
//! ```

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Main error type for lesionscan operations.
#[derive(Error, Debug)]
pub enum LesionError {
    // Startup errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    // Request errors
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // Internal errors
    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LesionError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            LesionError::InvalidImage(_) | LesionError::BadRequest(_) => StatusCode::BAD_REQUEST,
            LesionError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LesionError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            LesionError::NotFound(_) => StatusCode::NOT_FOUND,
            LesionError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            LesionError::Config(_)
            | LesionError::InvalidConfig { .. }
            | LesionError::ModelLoad(_)
            | LesionError::Inference(_)
            | LesionError::Io(_)
            | LesionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error is fatal at startup.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            LesionError::Config(_) | LesionError::InvalidConfig { .. } | LesionError::ModelLoad(_)
        )
    }

    /// The message shown to clients.
    ///
    /// Server-side failures never expose paths or runtime internals.
    pub fn public_detail(&self) -> String {
        if self.status_code().is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<serde_json::Error> for LesionError {
    fn from(e: serde_json::Error) -> Self {
        LesionError::Config(e.to_string())
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable description.
    pub detail: String,
}

impl IntoResponse for LesionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorBody {
            detail: self.public_detail(),
        };
        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

/// Result type alias for lesionscan operations.
pub type Result<T> = std::result::Result<T, LesionError>;
