//! Compliance rule violations.
//!
//! Every variant is detected before any write. `AllocationShortfall` and
//! `DonorOverdrawn` are invariant breaches: upstream checks make them
//! unreachable, so seeing one means the engine itself is wrong.

use thiserror::Error;

use fueleu_core::{DomainError, RouteId};

use crate::pooling::PoolMember;

pub type ComplianceResult<T> = Result<T, ComplianceError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComplianceError {
    #[error("route {0} not found")]
    NotFound(RouteId),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("cannot bank surplus for route {route_id}: current CB ({balance:.2}) is not a surplus")]
    Deficit { route_id: RouteId, balance: f64 },

    #[error("bank amount ({requested}) exceeds actual surplus ({surplus:.2})")]
    ExceedsSurplus { requested: f64, surplus: f64 },

    #[error("application amount ({requested}) exceeds available banked surplus ({available:.2})")]
    ExceedsAvailable { requested: f64, available: f64 },

    #[error("banked entries exhausted with {remaining:.2} still to cover")]
    AllocationShortfall { remaining: f64 },

    #[error("one or more route ids were not found: {}", join_ids(.missing))]
    InvalidMembers { missing: Vec<RouteId> },

    #[error("pool is non-compliant: sum CB is {total_sum_cb:.2}")]
    PoolInfeasible {
        total_sum_cb: f64,
        members: Vec<PoolMember>,
    },

    #[error("surplus route {route_id} exited the pool with a negative CB ({adjusted_cb:.2})")]
    DonorOverdrawn { route_id: RouteId, adjusted_cb: f64 },
}

impl ComplianceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for invariant breaches that indicate a defect in the engine rather
    /// than a rejected request.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            ComplianceError::AllocationShortfall { .. } | ComplianceError::DonorOverdrawn { .. }
        )
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ComplianceError::NotFound(_) => "not_found",
            ComplianceError::Validation(_) => "validation_error",
            ComplianceError::Deficit { .. } => "deficit",
            ComplianceError::ExceedsSurplus { .. } => "exceeds_surplus",
            ComplianceError::ExceedsAvailable { .. } => "exceeds_available",
            ComplianceError::AllocationShortfall { .. } => "allocation_shortfall",
            ComplianceError::InvalidMembers { .. } => "invalid_members",
            ComplianceError::PoolInfeasible { .. } => "pool_infeasible",
            ComplianceError::DonorOverdrawn { .. } => "donor_overdrawn",
        }
    }
}

impl From<DomainError> for ComplianceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InvalidId(msg) => ComplianceError::Validation(msg),
            conflict @ DomainError::Conflict(_) => ComplianceError::Validation(conflict.to_string()),
        }
    }
}

fn join_ids(ids: &[RouteId]) -> String {
    ids.iter().map(RouteId::as_str).collect::<Vec<_>>().join(", ")
}

/// Reject non-finite and non-positive amounts.
pub fn ensure_positive_amount(amount: f64) -> ComplianceResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ComplianceError::validation(format!(
            "amount must be a positive number (got {amount})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defect_kinds_are_flagged() {
        assert!(ComplianceError::AllocationShortfall { remaining: 1.0 }.is_defect());
        assert!(
            ComplianceError::DonorOverdrawn {
                route_id: RouteId::new("R1").unwrap(),
                adjusted_cb: -1.0,
            }
            .is_defect()
        );
        assert!(!ComplianceError::validation("x").is_defect());
    }

    #[test]
    fn invalid_members_lists_missing_ids() {
        let err = ComplianceError::InvalidMembers {
            missing: vec![RouteId::new("R8").unwrap(), RouteId::new("R9").unwrap()],
        };
        assert_eq!(err.to_string(), "one or more route ids were not found: R8, R9");
    }

    #[test]
    fn domain_failures_surface_as_validation() {
        let blank = ComplianceError::from(RouteId::new(" ").unwrap_err());
        assert_eq!(blank.code(), "validation_error");

        let twice = ComplianceError::from(DomainError::conflict("entry already applied"));
        assert_eq!(
            twice,
            ComplianceError::Validation("conflict: entry already applied".to_string())
        );
    }

    #[test]
    fn positive_amount_check() {
        assert!(ensure_positive_amount(1.0).is_ok());
        assert!(ensure_positive_amount(0.0).is_err());
        assert!(ensure_positive_amount(-5.0).is_err());
        assert!(ensure_positive_amount(f64::NAN).is_err());
        assert!(ensure_positive_amount(f64::INFINITY).is_err());
    }
}
