//! Compliance module (balance calculation, surplus banking, pooling).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. Services in
//! `fueleu-infra` load records from the stores, call into this crate and persist
//! whatever it decides.

pub mod balance;
pub mod banking;
pub mod error;
pub mod pooling;
pub mod route;

pub use balance::{
    BalanceReport, BalanceStatus, RouteComparison, TARGET_INTENSITY_2025, calculate_balance,
    compare_routes, is_compliant,
};
pub use banking::{ConsumptionPlan, LedgerEntry, available_surplus, check_bankable, plan_consumption};
pub use error::{ComplianceError, ComplianceResult, ensure_positive_amount};
pub use pooling::{Pool, PoolAllocationResult, PoolMember, allocate};
pub use route::{ENERGY_PER_TONNE_MJ, Route};
