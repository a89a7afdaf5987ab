use std::sync::Arc;

use axum::{
    Json, Router, extract::Extension, http::StatusCode, response::IntoResponse, routing::get,
};

use captable_auth::Principal;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::app::dto;

pub fn router() -> Router {
    Router::new().route("/audit/", get(list_audit))
}

pub async fn list_audit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> Result<axum::response::Response, ApiError> {
    let items = services
        .list_audit(&principal)
        .await?
        .iter()
        .map(dto::audit_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}
