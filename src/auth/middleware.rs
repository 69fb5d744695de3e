//! Bearer-token middleware for Axum.

use super::{Authenticator, TokenError};
use crate::error::LesionError;
use crate::observability;
use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

/// Shared authentication state.
#[derive(Clone, Debug)]
pub struct AuthState {
    authenticator: Arc<Authenticator>,
}

impl AuthState {
    /// Create new auth state.
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator }
    }

    /// Get the authenticator.
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }
}

/// Reject the request unless it carries a valid bearer token.
///
/// On success the [`super::AuthInfo`] is inserted into request extensions.
/// The request body is not touched before the token is verified.
pub async fn require_bearer(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match auth_header {
        Some(header) => match parse_bearer(header) {
            Some(token) => token,
            None => return reject("Invalid token"),
        },
        None => return reject("Not authenticated"),
    };

    let auth_info = match state.authenticator.verify(token) {
        Ok(info) => info,
        Err(TokenError::WrongSubject) => {
            debug!("Token subject rejected");
            return reject("Invalid credentials");
        }
        Err(e) => {
            debug!(error = %e, "Token rejected");
            return reject("Invalid token");
        }
    };

    request.extensions_mut().insert(auth_info);

    next.run(request).await
}

/// Extract the token from an `Authorization: Bearer <token>` value.
///
/// The scheme is matched case-insensitively.
fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn reject(detail: &str) -> Response {
    observability::record_auth_rejection();
    LesionError::Unauthorized(detail.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(parse_bearer("bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("Basic dXNlcjpwYXNz"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("Bearer"), None);
        assert_eq!(parse_bearer(""), None);
    }
}
