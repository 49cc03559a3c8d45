//! Banked-surplus ledger rules.
//!
//! Entries are never deleted. Consuming an entry is a one-way state transition
//! (`applied_year: None -> Some(year)`) so the ledger keeps its full history.
//! Consumption is whole-entry and oldest vintage first.

use serde::{Deserialize, Serialize};

use fueleu_core::{DomainError, DomainResult, Entity, LedgerEntryId, RouteId};

use crate::error::{ComplianceError, ComplianceResult, ensure_positive_amount};

/// One banked surplus amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    id: LedgerEntryId,
    route_id: RouteId,
    /// Origin year (vintage) of the surplus.
    year: i32,
    amount: f64,
    applied_year: Option<i32>,
}

impl LedgerEntry {
    /// Create a fresh, unapplied entry with a newly minted id.
    pub fn bank(route_id: RouteId, year: i32, amount: f64) -> ComplianceResult<Self> {
        ensure_positive_amount(amount)?;
        Ok(Self {
            id: LedgerEntryId::new(),
            route_id,
            year,
            amount,
            applied_year: None,
        })
    }

    /// Rebuild an entry from persisted fields.
    pub fn restore(
        id: LedgerEntryId,
        route_id: RouteId,
        year: i32,
        amount: f64,
        applied_year: Option<i32>,
    ) -> Self {
        Self {
            id,
            route_id,
            year,
            amount,
            applied_year,
        }
    }

    pub fn route_id(&self) -> &RouteId {
        &self.route_id
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn applied_year(&self) -> Option<i32> {
        self.applied_year
    }

    pub fn is_available(&self) -> bool {
        self.applied_year.is_none()
    }

    /// Mark the whole entry as consumed against `apply_year`.
    ///
    /// The transition happens at most once.
    pub fn mark_applied(&mut self, apply_year: i32) -> DomainResult<()> {
        if let Some(existing) = self.applied_year {
            return Err(DomainError::conflict(format!(
                "ledger entry {} already applied to {existing}",
                self.id
            )));
        }
        self.applied_year = Some(apply_year);
        Ok(())
    }
}

impl Entity for LedgerEntry {
    type Id = LedgerEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Sum of the amounts of all entries that are still available.
pub fn available_surplus(entries: &[LedgerEntry]) -> f64 {
    entries
        .iter()
        .filter(|e| e.is_available())
        .map(LedgerEntry::amount)
        .sum()
}

/// Check that `amount` may be banked out of a route whose current CB is `balance`.
pub fn check_bankable(route_id: &RouteId, balance: f64, amount: f64) -> ComplianceResult<()> {
    ensure_positive_amount(amount)?;

    if balance <= 0.0 {
        return Err(ComplianceError::Deficit {
            route_id: route_id.clone(),
            balance,
        });
    }
    if amount > balance {
        return Err(ComplianceError::ExceedsSurplus {
            requested: amount,
            surplus: balance,
        });
    }
    Ok(())
}

/// Entries to update for one application, decided up front so that the caller
/// can persist them in a single batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionPlan {
    pub requested: f64,
    /// Total amount of the consumed entries. May exceed `requested` because
    /// entries are never split.
    pub consumed: f64,
    /// Consumed entries with `applied_year` already set, oldest vintage first.
    pub entries: Vec<LedgerEntry>,
    /// Sum of the entries left available once the plan is persisted.
    pub available_after: f64,
}

impl ConsumptionPlan {
    pub fn entry_ids(&self) -> Vec<LedgerEntryId> {
        self.entries.iter().map(|e| *e.id()).collect()
    }
}

/// Plan the consumption of `amount` out of an owner's entries.
///
/// Available entries are taken by ascending origin year (stable for equal years)
/// and each selected entry is consumed in full, until the requested amount is
/// covered.
pub fn plan_consumption(
    entries: &[LedgerEntry],
    amount: f64,
    apply_year: i32,
) -> ComplianceResult<ConsumptionPlan> {
    ensure_positive_amount(amount)?;

    let mut candidates: Vec<&LedgerEntry> = entries.iter().filter(|e| e.is_available()).collect();
    candidates.sort_by_key(|e| e.year());

    // Summed in consumption order, so the loop below reproduces the same
    // partial sums and reaches `available` exactly on the last entry.
    let available: f64 = candidates.iter().map(|e| e.amount()).sum();
    if amount > available {
        return Err(ComplianceError::ExceedsAvailable {
            requested: amount,
            available,
        });
    }

    let mut consumed = 0.0;
    let mut selected = Vec::new();
    let mut untouched = Vec::new();

    for entry in candidates {
        if consumed >= amount {
            untouched.push(entry);
            continue;
        }
        let mut applied = entry.clone();
        applied.mark_applied(apply_year)?;
        consumed += applied.amount();
        selected.push(applied);
    }

    if consumed < amount {
        return Err(ComplianceError::AllocationShortfall {
            remaining: amount - consumed,
        });
    }

    Ok(ConsumptionPlan {
        requested: amount,
        consumed,
        entries: selected,
        available_after: untouched.iter().map(|e| e.amount()).sum(),
    })
}
