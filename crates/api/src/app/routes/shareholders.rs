use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use captable_auth::Principal;
use captable_core::{ShareholderId, UserId};

use crate::app::errors::ApiError;
use crate::app::services::{AppServices, NewShareholder};
use crate::app::dto;

pub fn router() -> Router {
    Router::new()
        .route("/shareholders/", post(create_shareholder).get(list_shareholders))
        .route("/shareholders/:id", get(get_shareholder))
        .route("/shareholders/user/:user_id", get(get_shareholder_by_user))
}

pub async fn create_shareholder(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<dto::CreateShareholderRequest>,
) -> Result<axum::response::Response, ApiError> {
    let registered = services
        .create_shareholder(
            &principal,
            NewShareholder {
                full_name: body.full_name,
                email: body.email,
                password: body.password,
                phone: body.phone,
                address: body.address,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(dto::registered_to_json(&registered))).into_response())
}

pub async fn list_shareholders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> Result<axum::response::Response, ApiError> {
    let items = services
        .list_shareholders(&principal)
        .await?
        .iter()
        .map(dto::shareholder_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}

pub async fn get_shareholder(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, ApiError> {
    let id: ShareholderId = id.parse()?;
    let view = services.shareholder_view(&principal, id).await?;
    Ok((StatusCode::OK, Json(dto::shareholder_to_json(&view))).into_response())
}

pub async fn get_shareholder_by_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
) -> Result<axum::response::Response, ApiError> {
    let user_id: UserId = user_id.parse()?;
    let view = services.shareholder_view_by_user(&principal, user_id).await?;
    Ok((StatusCode::OK, Json(dto::shareholder_to_json(&view))).into_response())
}
