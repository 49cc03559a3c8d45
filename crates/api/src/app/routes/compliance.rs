use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/cb", get(get_balance))
}

pub async fn get_balance(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::RouteQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::validation_error(e.body_text()),
    };
    let route_id = match dto::require_route_id(query.route_id.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.get_balance(&route_id).await {
        Ok(report) => (StatusCode::OK, Json(dto::balance_to_json(&report))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
