use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/records", get(list_records))
        .route("/bank", post(bank_surplus))
        .route("/apply", post(apply_banked_surplus))
}

pub async fn list_records(
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

    let entries = match services.ledger.list_entries(&route_id, query.year).await {
        Ok(v) => v,
        Err(e) => return errors::engine_error_to_response(e),
    };
    let available = match services.ledger.available_surplus(&route_id).await {
        Ok(v) => v,
        Err(e) => return errors::engine_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(dto::records_to_json(&route_id, &entries, available)),
    )
        .into_response()
}

pub async fn bank_surplus(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::BankRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::validation_error(e.body_text()),
    };
    let route_id = match dto::parse_route_id(&body.route_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.bank_surplus(&route_id, body.amount).await {
        Ok(entry) => (StatusCode::CREATED, Json(dto::entry_to_json(&entry))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn apply_banked_surplus(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::ApplyRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::validation_error(e.body_text()),
    };
    let route_id = match dto::parse_route_id(&body.route_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .ledger
        .apply_banked_surplus(&route_id, body.apply_year, body.amount)
        .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(dto::apply_outcome_to_json(&route_id, &outcome)),
        )
            .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
