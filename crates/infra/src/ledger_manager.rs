//! Ledger Manager: banking and application of surplus against the ledger store.
//!
//! Every mutation runs under the owner's lock from the first ledger read to
//! the last write, and all rule checks happen before anything is written.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use fueleu_compliance::{
    ComplianceError, LedgerEntry, Route, available_surplus, calculate_balance, check_bankable,
    ensure_positive_amount, plan_consumption,
};
use fueleu_core::{LedgerEntryId, RouteId};

use crate::error::{EngineResult, traced};
use crate::owner_locks::OwnerLocks;
use crate::store::{LedgerStore, RouteStore};

/// What an application actually consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    pub requested: f64,
    /// Whole-entry total; at least `requested`.
    pub consumed: f64,
    pub applied_entry_ids: Vec<LedgerEntryId>,
    pub available_after: f64,
}

pub struct LedgerManager<R, L> {
    routes: R,
    ledger: L,
    locks: OwnerLocks,
}

impl<R, L> LedgerManager<R, L>
where
    R: RouteStore,
    L: LedgerStore,
{
    pub fn new(routes: R, ledger: L) -> Self {
        Self {
            routes,
            ledger,
            locks: OwnerLocks::new(),
        }
    }

    async fn require_route(&self, id: &RouteId) -> EngineResult<Route> {
        self.routes
            .find_by_id(id)
            .await?
            .ok_or_else(|| ComplianceError::NotFound(id.clone()).into())
    }

    /// Sum of the owner's unapplied entries.
    pub async fn available_surplus(&self, owner: &RouteId) -> EngineResult<f64> {
        self.require_route(owner).await?;
        let entries = self.ledger.get_entries(owner, None).await?;
        Ok(available_surplus(&entries))
    }

    /// Owner's entries, optionally restricted to one origin year.
    pub async fn list_entries(
        &self,
        owner: &RouteId,
        year: Option<i32>,
    ) -> EngineResult<Vec<LedgerEntry>> {
        self.require_route(owner).await?;
        Ok(self.ledger.get_entries(owner, year).await?)
    }

    /// Bank `amount` out of the route's current surplus. The new entry's
    /// vintage is the route's reporting year.
    #[instrument(skip(self), fields(route_id = %route_id))]
    pub async fn bank_surplus(&self, route_id: &RouteId, amount: f64) -> EngineResult<LedgerEntry> {
        traced("bank_surplus", self.bank_locked(route_id, amount).await)
    }

    async fn bank_locked(&self, route_id: &RouteId, amount: f64) -> EngineResult<LedgerEntry> {
        ensure_positive_amount(amount)?;
        // Unknown owners never reach the lock registry.
        let route = self.require_route(route_id).await?;
        let _guard = self.locks.lock(&route.id).await;

        let balance = calculate_balance(&route);
        check_bankable(&route.id, balance, amount)?;

        let entry = LedgerEntry::bank(route.id.clone(), route.year, amount)?;
        self.ledger.save_entry(entry.clone()).await?;

        info!(amount, balance, year = route.year, "surplus banked");
        Ok(entry)
    }

    /// Consume banked surplus, oldest vintage first, to cover `amount` in
    /// `apply_year`. Entries are consumed whole, so the outcome may report more
    /// consumed than requested.
    #[instrument(skip(self), fields(route_id = %owner))]
    pub async fn apply_banked_surplus(
        &self,
        owner: &RouteId,
        apply_year: i32,
        amount: f64,
    ) -> EngineResult<ApplyOutcome> {
        traced(
            "apply_banked_surplus",
            self.apply_locked(owner, apply_year, amount).await,
        )
    }

    async fn apply_locked(
        &self,
        owner: &RouteId,
        apply_year: i32,
        amount: f64,
    ) -> EngineResult<ApplyOutcome> {
        ensure_positive_amount(amount)?;
        self.require_route(owner).await?;
        let _guard = self.locks.lock(owner).await;

        let entries = self.ledger.get_entries(owner, None).await?;
        let plan = plan_consumption(&entries, amount, apply_year)?;

        let outcome = ApplyOutcome {
            requested: plan.requested,
            consumed: plan.consumed,
            applied_entry_ids: plan.entry_ids(),
            available_after: plan.available_after,
        };
        self.ledger.save_entries(plan.entries).await?;

        info!(
            requested = outcome.requested,
            consumed = outcome.consumed,
            entries = outcome.applied_entry_ids.len(),
            available_after = outcome.available_after,
            "banked surplus applied"
        );
        Ok(outcome)
    }
}
