use serde::Deserialize;

use fueleu_compliance::{
    BalanceReport, LedgerEntry, Pool, PoolAllocationResult, Route, calculate_balance,
};
use fueleu_core::RouteId;
use fueleu_infra::ApplyOutcome;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankRequest {
    pub route_id: String,
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub route_id: String,
    pub apply_year: i32,
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolRequest {
    pub route_ids: Vec<String>,
    pub pool_name: String,
    pub year: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteQuery {
    pub route_id: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_route_id(raw: &str) -> Result<RouteId, axum::response::Response> {
    RouteId::new(raw).map_err(|e| errors::validation_error(e.to_string()))
}

pub fn require_route_id(raw: Option<&str>) -> Result<RouteId, axum::response::Response> {
    match raw {
        Some(raw) => parse_route_id(raw),
        None => Err(errors::validation_error("routeId query parameter is required")),
    }
}

pub fn require_year(year: Option<i32>) -> Result<i32, axum::response::Response> {
    year.ok_or_else(|| errors::validation_error("year query parameter is required"))
}

pub fn to_route_ids(raw: &[String]) -> Result<Vec<RouteId>, axum::response::Response> {
    raw.iter().map(|id| parse_route_id(id)).collect()
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn route_to_json(route: &Route) -> serde_json::Value {
    serde_json::json!({
        "routeId": route.id,
        "vesselType": route.vessel_type,
        "fuelType": route.fuel_type,
        "year": route.year,
        "ghgIntensity": route.ghg_intensity,
        "fuelConsumption": route.fuel_consumption,
        "distance": route.distance,
        "totalEmissions": route.total_emissions(),
        "complianceBalance": calculate_balance(route),
        "isBaseline": route.is_baseline,
    })
}

pub fn balance_to_json(report: &BalanceReport) -> serde_json::Value {
    serde_json::json!({
        "routeId": report.route_id,
        "year": report.year,
        "actualCB": report.balance,
        "status": report.status,
    })
}

pub fn entry_to_json(entry: &LedgerEntry) -> serde_json::Value {
    serde_json::json!(entry)
}

pub fn records_to_json(
    route_id: &RouteId,
    entries: &[LedgerEntry],
    available: f64,
) -> serde_json::Value {
    serde_json::json!({
        "routeId": route_id,
        "entries": entries.iter().map(entry_to_json).collect::<Vec<_>>(),
        "available": available,
    })
}

pub fn apply_outcome_to_json(route_id: &RouteId, outcome: &ApplyOutcome) -> serde_json::Value {
    serde_json::json!({
        "routeId": route_id,
        "requested": outcome.requested,
        "consumed": outcome.consumed,
        "appliedEntryIds": outcome.applied_entry_ids,
        "availableAfter": outcome.available_after,
        "cb_after": outcome.available_after,
    })
}

pub fn pool_result_to_json(result: &PoolAllocationResult) -> serde_json::Value {
    serde_json::json!(result)
}

pub fn pool_to_json(pool: &Pool) -> serde_json::Value {
    serde_json::json!({
        "id": pool.id,
        "name": pool.name,
        "year": pool.year,
        "createdAt": pool.created_at,
        "totalSumCB": pool.total_adjusted_cb(),
        "members": pool.members,
    })
}
