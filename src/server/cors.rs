//! Permissive CORS handling.
//!
//! Any origin may call the API with credentials. The request `Origin` is
//! echoed back rather than `*` since browsers reject a wildcard origin on
//! credentialed requests.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

/// Preflight cache lifetime (in seconds).
pub const MAX_AGE_SECONDS: u32 = 600;

/// Methods advertised in preflight responses.
const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS";

/// CORS middleware.
///
/// Answers OPTIONS preflights directly and decorates every other response
/// that came from a cross-origin request.
pub async fn cors_middleware(request: Request, next: Next) -> Response {
    let origin = match request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok())
    {
        Some(o) => o,
        // Not a CORS request
        None => return next.run(request).await,
    };

    if request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
    {
        return handle_preflight(origin, request.headers());
    }

    let mut response = next.run(request).await;
    add_cors_headers(response.headers_mut(), origin);
    response
}

/// Handle CORS preflight (OPTIONS) request.
fn handle_preflight(origin: HeaderValue, request_headers: &HeaderMap) -> Response {
    debug!(origin = ?origin, "CORS preflight");

    let mut response = StatusCode::OK.into_response();
    let headers = response.headers_mut();
    add_cors_headers(headers, origin);

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(MAX_AGE_SECONDS));

    // Any requested header is allowed
    if let Some(requested) = request_headers.get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
    }

    *response.body_mut() = Body::empty();
    response
}

/// Add CORS headers to a response.
fn add_cors_headers(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
}
