use std::sync::Arc;

use axum::{Form, Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::app::dto;

/// `POST /api/token/` — OAuth2 password grant over a form body.
pub async fn issue_token(
    Extension(services): Extension<Arc<AppServices>>,
    Form(body): Form<dto::LoginForm>,
) -> Result<axum::response::Response, ApiError> {
    let grant = services.authenticate(&body.username, &body.password).await?;
    Ok((StatusCode::OK, Json(dto::grant_to_json(&grant))).into_response())
}
