//! Demo data for local runs.

use tracing::info;

use fueleu_compliance::{LedgerEntry, Route};
use fueleu_core::RouteId;

use crate::error::EngineResult;
use crate::store::{LedgerStore, RouteStore};

/// Owner, vintage and amount of the seeded banked entry.
const SEEDED_BANK: (&str, i32, f64) = ("R002", 2024, 10_000_000.0);

fn route(
    id: &str,
    vessel_type: &str,
    fuel_type: &str,
    year: i32,
    ghg_intensity: f64,
    fuel_consumption: f64,
    distance: f64,
) -> EngineResult<Route> {
    Ok(Route {
        id: RouteId::new(id)?,
        vessel_type: vessel_type.to_string(),
        fuel_type: fuel_type.to_string(),
        year,
        ghg_intensity,
        fuel_consumption,
        distance,
        is_baseline: false,
    })
}

/// R001..R005; R001 is the baseline.
pub fn demo_routes() -> EngineResult<Vec<Route>> {
    Ok(vec![
        route("R001", "Container", "HFO", 2024, 91.0, 5_000.0, 12_000.0)?.with_baseline(true),
        route("R002", "BulkCarrier", "LNG", 2024, 88.0, 4_800.0, 11_500.0)?,
        route("R003", "Tanker", "MGO", 2024, 93.5, 5_100.0, 12_500.0)?,
        route("R004", "RoRo", "HFO", 2025, 89.2, 4_900.0, 11_800.0)?,
        route("R005", "Container", "LNG", 2025, 90.5, 4_950.0, 11_900.0)?,
    ])
}

/// Seed the demo routes and one banked entry. Does nothing when the route
/// store already holds data. Returns whether anything was written.
pub async fn seed_demo_data<R, L>(routes: &R, ledger: &L) -> EngineResult<bool>
where
    R: RouteStore + ?Sized,
    L: LedgerStore + ?Sized,
{
    if !routes.find_all().await?.is_empty() {
        return Ok(false);
    }

    let demo = demo_routes()?;
    let count = demo.len();
    for route in demo {
        routes.save(route).await?;
    }

    let (owner, year, amount) = SEEDED_BANK;
    ledger
        .save_entry(LedgerEntry::bank(RouteId::new(owner)?, year, amount)?)
        .await?;

    info!(routes = count, "demo data seeded");
    Ok(true)
}
