use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_routes))
        .route("/comparison", get(compare_routes))
        .route("/:id/baseline", post(set_baseline))
}

pub async fn list_routes(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.list_routes().await {
        Ok(routes) => {
            let items = routes.iter().map(dto::route_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn compare_routes(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.compare_routes().await {
        Ok(rows) => (StatusCode::OK, Json(serde_json::json!({ "items": rows }))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn set_baseline(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let route_id = match dto::parse_route_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.set_baseline(&route_id).await {
        Ok(route) => (StatusCode::OK, Json(dto::route_to_json(&route))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
