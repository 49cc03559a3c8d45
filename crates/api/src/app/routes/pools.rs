use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", get(list_pools).post(create_pool))
}

pub async fn create_pool(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreatePoolRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::validation_error(e.body_text()),
    };
    let route_ids = match dto::to_route_ids(&body.route_ids) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .pools
        .create_pool(route_ids, body.pool_name, body.year)
        .await
    {
        Ok(result) => (StatusCode::CREATED, Json(dto::pool_result_to_json(&result))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn list_pools(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::YearQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::validation_error(e.body_text()),
    };
    let year = match dto::require_year(query.year) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.pools.list_pools(year).await {
        Ok(pools) => {
            let items = pools.iter().map(dto::pool_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::engine_error_to_response(e),
    }
}
