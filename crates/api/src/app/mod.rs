//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: use-case layer (auth, registry, ledger, certificates)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use captable_auth::{Hs256TokenCodec, TokenCodec};
use captable_store::Store;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig, store: Arc<dyn Store>) -> Router {
    let codec: Arc<dyn TokenCodec> =
        Arc::new(Hs256TokenCodec::new(config.jwt_secret.as_bytes()));
    let services = Arc::new(services::AppServices::new(
        store,
        codec.clone(),
        config.token_ttl_secs,
        config.company_name.clone(),
    ));

    if let Some(admin) = &config.admin {
        if let Err(err) = services.bootstrap_admin(&admin.email, &admin.password).await {
            tracing::error!(error = ?err, "admin bootstrap failed");
        }
    }

    let auth_state = middleware::AuthState { codec };

    // Everything except login and health requires a bearer token.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let api = Router::new()
        .route(
            "/token/",
            axum::routing::post(routes::token::issue_token),
        )
        .merge(protected);

    Router::new()
        .route("/", get(routes::system::root))
        .route("/health", get(routes::system::health))
        .route("/health/detailed", get(routes::system::health_detailed))
        .nest("/api", api)
        .layer(Extension(services))
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::log_requests)))
}
