use serde::{Deserialize, Serialize};

use fueleu_core::{Entity, RouteId};

/// Lower heating value used to convert fuel mass into energy (MJ per tonne).
pub const ENERGY_PER_TONNE_MJ: f64 = 41_000.0;

/// A reported voyage/vessel record.
///
/// Category attributes (`vessel_type`, `fuel_type`) are carried but never
/// interpreted by the compliance rules. Balances are always derived from the
/// current attribute values and never stored on the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: RouteId,
    pub vessel_type: String,
    pub fuel_type: String,
    /// Reporting year.
    pub year: i32,
    /// Measured GHG intensity (gCO2e/MJ).
    pub ghg_intensity: f64,
    /// Fuel consumption (t).
    pub fuel_consumption: f64,
    /// Distance sailed (km). Informational.
    pub distance: f64,
    #[serde(default)]
    pub is_baseline: bool,
}

impl Route {
    /// Energy in scope (MJ): `fuel_consumption * 41 000`.
    pub fn energy_in_scope(&self) -> f64 {
        self.fuel_consumption * ENERGY_PER_TONNE_MJ
    }

    /// Total emissions (t CO2e): `ghg_intensity * energy_in_scope / 1 000 000`.
    pub fn total_emissions(&self) -> f64 {
        self.ghg_intensity * self.energy_in_scope() / 1_000_000.0
    }

    /// Copy of this route with the baseline flag set to `flag`.
    pub fn with_baseline(&self, flag: bool) -> Self {
        Self {
            is_baseline: flag,
            ..self.clone()
        }
    }
}

impl Entity for Route {
    type Id = RouteId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
