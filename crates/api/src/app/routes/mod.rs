use axum::Router;

pub mod banking;
pub mod compliance;
pub mod pools;
pub mod system;
pub mod vessel_routes;

/// Router for all engine endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/routes", vessel_routes::router())
        .nest("/compliance", compliance::router())
        .nest("/banking", banking::router())
        .nest("/pools", pools::router())
}
