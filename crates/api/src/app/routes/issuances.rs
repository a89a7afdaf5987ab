use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};

use captable_auth::Principal;
use captable_core::{IssuanceId, ShareholderId};
use captable_equity::ShareClass;

use crate::app::errors::ApiError;
use crate::app::services::{AppServices, NewIssuance};
use crate::app::dto;

pub fn router() -> Router {
    Router::new()
        .route("/issuances/", post(issue_shares).get(list_issuances))
        .route("/issuances/:id", get(get_issuance))
        .route("/issuances/:id/certificate", get(download_certificate))
        .route("/issuances/:id/preview", get(preview_certificate))
}

pub async fn issue_shares(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<dto::IssueSharesRequest>,
) -> Result<axum::response::Response, ApiError> {
    let shareholder_id: ShareholderId = body.shareholder_id.parse()?;
    let class: ShareClass = body.share_class.parse()?;
    let issuance = services
        .issue_shares(
            &principal,
            NewIssuance {
                shareholder_id,
                class,
                quantity: body.quantity,
                price_per_share_cents: body.price_per_share_cents,
                notes: body.notes,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(dto::issuance_to_json(&issuance))).into_response())
}

pub async fn list_issuances(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> Result<axum::response::Response, ApiError> {
    let items = services
        .list_issuances(&principal)
        .await?
        .iter()
        .map(dto::issuance_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}

pub async fn get_issuance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, ApiError> {
    let id: IssuanceId = id.parse()?;
    let issuance = services.get_issuance(&principal, id).await?;
    Ok((StatusCode::OK, Json(dto::issuance_to_json(&issuance))).into_response())
}

pub async fn download_certificate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, ApiError> {
    certificate_response(services, principal, &id, Disposition::Attachment).await
}

pub async fn preview_certificate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, ApiError> {
    certificate_response(services, principal, &id, Disposition::Inline).await
}

enum Disposition {
    Attachment,
    Inline,
}

async fn certificate_response(
    services: Arc<AppServices>,
    principal: Principal,
    id: &str,
    disposition: Disposition,
) -> Result<axum::response::Response, ApiError> {
    let id: IssuanceId = id.parse()?;
    let (issuance, pdf) = services.render_certificate(&principal, id).await?;

    let disposition = match disposition {
        Disposition::Attachment => {
            format!("attachment; filename=\"{}.pdf\"", issuance.certificate_number)
        }
        Disposition::Inline => "inline".to_string(),
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}
