use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use captable_auth::{Principal, TokenCodec};

#[derive(Clone)]
pub struct AuthState {
    pub codec: Arc<dyn TokenCodec>,
}

/// Decodes the bearer token and attaches the caller's [`Principal`] to the
/// request. Requests without a valid, unexpired token never reach a handler.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer(req.headers())?;

    let claims = state
        .codec
        .decode(token, Utc::now())
        .map_err(|_e| StatusCode::UNAUTHORIZED)?;

    req.extensions_mut()
        .insert(Principal::new(claims.sub, claims.role));

    Ok(next.run(req).await)
}

/// Logs every request with method, path, status, and latency, and stamps
/// the latency on the response for clients that time their calls.
pub async fn log_requests(
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = std::time::Instant::now();

    let mut response = next.run(req).await;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        %method,
        path,
        status = response.status().as_u16(),
        elapsed_ms,
        "request"
    );
    if let Ok(value) = axum::http::HeaderValue::from_str(&format!("{elapsed_ms}ms")) {
        response
            .headers_mut()
            .insert(axum::http::HeaderName::from_static("x-process-time"), value);
    }
    response
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}
