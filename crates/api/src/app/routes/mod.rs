use axum::Router;

pub mod audit;
pub mod issuances;
pub mod shareholders;
pub mod system;
pub mod token;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .merge(shareholders::router())
        .merge(issuances::router())
        .merge(audit::router())
}
