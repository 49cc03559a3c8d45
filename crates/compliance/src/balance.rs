//! Balance Calculator.
//!
//! `CB = (target - actual intensity) * energy in scope`. Positive values are a
//! surplus, negative values a deficit, zero is exactly compliant.

use serde::{Deserialize, Serialize};

use fueleu_core::RouteId;

use crate::route::Route;

/// Regulatory GHG intensity target for 2025 (gCO2e/MJ).
pub const TARGET_INTENSITY_2025: f64 = 89.3368;

/// Compliance balance of a route (gCO2e). Pure, no error conditions.
pub fn calculate_balance(route: &Route) -> f64 {
    (TARGET_INTENSITY_2025 - route.ghg_intensity) * route.energy_in_scope()
}

/// A route is compliant when its balance is zero or positive.
pub fn is_compliant(route: &Route) -> bool {
    calculate_balance(route) >= 0.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceStatus {
    Surplus,
    Deficit,
}

impl BalanceStatus {
    pub fn of(balance: f64) -> Self {
        if balance >= 0.0 {
            BalanceStatus::Surplus
        } else {
            BalanceStatus::Deficit
        }
    }
}

/// Result of a balance query for one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    pub route_id: RouteId,
    pub year: i32,
    pub balance: f64,
    pub status: BalanceStatus,
}

impl BalanceReport {
    pub fn for_route(route: &Route) -> Self {
        let balance = calculate_balance(route);
        Self {
            route_id: route.id.clone(),
            year: route.year,
            balance,
            status: BalanceStatus::of(balance),
        }
    }
}

/// One row of the route comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteComparison {
    pub route_id: RouteId,
    pub ghg_intensity: f64,
    pub compliance_balance: f64,
    pub is_compliant: bool,
}

/// Compute the comparison row for every route, preserving input order.
pub fn compare_routes(routes: &[Route]) -> Vec<RouteComparison> {
    routes
        .iter()
        .map(|route| {
            let balance = calculate_balance(route);
            RouteComparison {
                route_id: route.id.clone(),
                ghg_intensity: route.ghg_intensity,
                compliance_balance: balance,
                is_compliant: balance >= 0.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn route(intensity: f64, consumption: f64) -> Route {
        Route {
            id: RouteId::new("R001").unwrap(),
            vessel_type: "Container".to_string(),
            fuel_type: "HFO".to_string(),
            year: 2024,
            ghg_intensity: intensity,
            fuel_consumption: consumption,
            distance: 12_000.0,
            is_baseline: false,
        }
    }

    #[test]
    fn regression_value_for_deficit_route() {
        // (89.3368 - 91.0) * 5 000 t * 41 000 MJ/t
        let cb = calculate_balance(&route(91.0, 5_000.0));
        assert!((cb - (-340_956_000.0)).abs() < 1e-3, "cb = {cb}");
        assert!(!is_compliant(&route(91.0, 5_000.0)));
    }

    #[test]
    fn surplus_route_is_compliant() {
        let r = route(88.0, 4_800.0);
        assert!(calculate_balance(&r) > 0.0);
        assert!(is_compliant(&r));
        assert_eq!(BalanceReport::for_route(&r).status, BalanceStatus::Surplus);
    }

    #[test]
    fn balance_is_zero_exactly_at_target() {
        let r = route(TARGET_INTENSITY_2025, 4_900.0);
        assert_eq!(calculate_balance(&r), 0.0);
        assert!(is_compliant(&r));
    }

    #[test]
    fn zero_and_negative_consumption_are_accepted() {
        assert_eq!(calculate_balance(&route(95.0, 0.0)), 0.0);
        assert!(calculate_balance(&route(95.0, -10.0)) > 0.0);
    }

    #[test]
    fn comparison_keeps_order_and_flags() {
        let mut a = route(91.0, 5_000.0);
        a.id = RouteId::new("A").unwrap();
        let mut b = route(88.0, 4_800.0);
        b.id = RouteId::new("B").unwrap();

        let rows = compare_routes(&[a, b]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].route_id.as_str(), "A");
        assert!(!rows[0].is_compliant);
        assert!(rows[1].is_compliant);
    }

    #[test]
    fn report_serializes_status_as_label() {
        let json = serde_json::to_value(BalanceReport::for_route(&route(91.0, 1.0))).unwrap();
        assert_eq!(json["status"], "Deficit");
        assert_eq!(json["routeId"], "R001");
    }

    proptest! {
        /// Property: the balance is linear in consumption.
        #[test]
        fn balance_is_linear_in_consumption(
            intensity in 50.0f64..150.0,
            consumption in 0.0f64..100_000.0,
            k in 0.0f64..10.0,
        ) {
            let base = calculate_balance(&route(intensity, consumption));
            let scaled = calculate_balance(&route(intensity, consumption * k));
            let tolerance = 1e-9 * base.abs().max(1.0) * k.max(1.0);
            prop_assert!((scaled - base * k).abs() <= tolerance);
        }

        /// Property: the balance scales with the distance from the target.
        #[test]
        fn balance_scales_with_distance_from_target(
            delta in -40.0f64..40.0,
            k in 0.0f64..4.0,
            consumption in 1.0f64..100_000.0,
        ) {
            prop_assume!(delta.abs() > 1e-6);
            let unit = calculate_balance(&route(TARGET_INTENSITY_2025 - delta, consumption));
            let scaled = calculate_balance(&route(TARGET_INTENSITY_2025 - k * delta, consumption));
            let energy = consumption * 41_000.0;
            let tolerance = 1e-9 * energy * (k * delta).abs().max(1.0);
            prop_assert!((scaled - k * unit).abs() <= tolerance);
            prop_assert_eq!(is_compliant(&route(TARGET_INTENSITY_2025 - delta, consumption)), delta > 0.0);
        }
    }
}
