use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::services::AppServices;

/// `GET /` — service metadata and entry points.
pub async fn root() -> axum::response::Response {
    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "health_check": "/health",
        "api_base": "/api",
        "endpoints": {
            "login": "/api/token/",
            "shareholders": "/api/shareholders/",
            "issuances": "/api/issuances/",
        },
    }))
    .into_response()
}

/// `GET /health` — liveness plus a storage check.
pub async fn health(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    if services.healthy().await {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "database": "connected",
            })),
        )
            .into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "unhealthy",
                "database": "unavailable",
            })),
        )
            .into_response()
    }
}

/// `GET /health/detailed` — per-component checks plus version info.
pub async fn health_detailed(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let database_ok = services.healthy().await;
    let verdict = |ok: bool| if ok { "healthy" } else { "unhealthy" };
    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(serde_json::json!({
            "status": verdict(database_ok),
            "version": env!("CARGO_PKG_VERSION"),
            "checks": {
                "database": verdict(database_ok),
            },
        })),
    )
        .into_response()
}
