//! Pool allocation.
//!
//! Surplus members (donors) cover deficit members (recipients) greedily:
//! recipients are served most-negative first, each drawing from the donor that
//! currently holds the largest remaining surplus. Allocation only moves balance
//! between members; the pool total never changes.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fueleu_core::{Entity, PoolId, RouteId};

use crate::error::{ComplianceError, ComplianceResult};

/// One member of a pool, before and after allocation.
///
/// `allocation_used` is positive for a recipient (received) and negative for a
/// donor (given). `adjusted_cb == initial_cb + allocation_used`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMember {
    pub route_id: RouteId,
    #[serde(rename = "initialCB")]
    pub initial_cb: f64,
    #[serde(rename = "adjustedCB")]
    pub adjusted_cb: f64,
    pub allocation_used: f64,
}

impl PoolMember {
    pub fn new(route_id: RouteId, initial_cb: f64) -> Self {
        Self {
            route_id,
            initial_cb,
            adjusted_cb: initial_cb,
            allocation_used: 0.0,
        }
    }

    fn give(&mut self, amount: f64) {
        self.adjusted_cb -= amount;
        self.allocation_used -= amount;
    }

    fn receive(&mut self, amount: f64) {
        self.adjusted_cb += amount;
        self.allocation_used += amount;
    }
}

/// A finalized pool. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: PoolId,
    pub name: String,
    pub year: i32,
    pub members: Vec<PoolMember>,
    pub created_at: DateTime<Utc>,
}

impl Pool {
    pub fn total_adjusted_cb(&self) -> f64 {
        self.members.iter().map(|m| m.adjusted_cb).sum()
    }
}

impl Entity for Pool {
    type Id = PoolId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Outcome of a successful pool creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolAllocationResult {
    pub pool_id: PoolId,
    pub pool_name: String,
    pub year: i32,
    #[serde(rename = "totalSumCB")]
    pub total_sum_cb: f64,
    pub members: Vec<PoolMember>,
}

impl From<&Pool> for PoolAllocationResult {
    fn from(pool: &Pool) -> Self {
        Self {
            pool_id: pool.id,
            pool_name: pool.name.clone(),
            year: pool.year,
            total_sum_cb: pool.total_adjusted_cb(),
            members: pool.members.clone(),
        }
    }
}

/// Heap entry for a donor. Ordered by remaining surplus, then by position in the
/// descending-CB order (earlier position wins ties).
#[derive(Debug, Clone, Copy)]
struct Donor {
    remaining: f64,
    rank: usize,
    index: usize,
}

impl PartialEq for Donor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Donor {}

impl PartialOrd for Donor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Donor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.remaining
            .total_cmp(&other.remaining)
            .then_with(|| other.rank.cmp(&self.rank))
    }
}

/// Redistribute balance across `members` (route id + initial CB).
///
/// Returns members ordered as: recipients in processing order, donors in
/// descending initial CB order, then zero-balance passengers. Fails with
/// `PoolInfeasible` when total deficit exceeds total surplus and with
/// `DonorOverdrawn` if a donor ends negative.
pub fn allocate(members: Vec<(RouteId, f64)>) -> ComplianceResult<Vec<PoolMember>> {
    let members: Vec<PoolMember> = members
        .into_iter()
        .map(|(route_id, cb)| PoolMember::new(route_id, cb))
        .collect();

    // Stable sorts: equal balances keep request order.
    let mut donors: Vec<usize> = (0..members.len()).filter(|&i| members[i].initial_cb > 0.0).collect();
    donors.sort_by(|&a, &b| members[b].initial_cb.total_cmp(&members[a].initial_cb));

    let mut recipients: Vec<usize> = (0..members.len()).filter(|&i| members[i].initial_cb < 0.0).collect();
    recipients.sort_by(|&a, &b| members[a].initial_cb.total_cmp(&members[b].initial_cb));

    let passengers: Vec<usize> = (0..members.len()).filter(|&i| members[i].initial_cb == 0.0).collect();

    let total_surplus: f64 = donors.iter().map(|&i| members[i].initial_cb).sum();
    let total_deficit: f64 = recipients.iter().map(|&i| members[i].initial_cb).sum();
    let total_sum_cb = total_surplus + total_deficit;

    if total_sum_cb < 0.0 {
        return Err(ComplianceError::PoolInfeasible {
            total_sum_cb,
            members,
        });
    }

    let mut members = members;
    let mut heap: BinaryHeap<Donor> = donors
        .iter()
        .enumerate()
        .map(|(rank, &index)| Donor {
            remaining: members[index].initial_cb,
            rank,
            index,
        })
        .collect();

    for &recipient in &recipients {
        let mut need = -members[recipient].initial_cb;

        while need > 0.0 {
            let Some(mut donor) = heap.pop() else {
                break;
            };

            let transfer = need.min(donor.remaining);
            members[donor.index].give(transfer);
            members[recipient].receive(transfer);
            need -= transfer;

            donor.remaining = members[donor.index].adjusted_cb;
            if donor.remaining > 0.0 {
                heap.push(donor);
            }
        }
    }

    let ordered: Vec<PoolMember> = recipients
        .iter()
        .chain(donors.iter())
        .chain(passengers.iter())
        .map(|&i| members[i].clone())
        .collect();

    if let Some(overdrawn) = ordered.iter().find(|m| m.initial_cb > 0.0 && m.adjusted_cb < 0.0) {
        return Err(ComplianceError::DonorOverdrawn {
            route_id: overdrawn.route_id.clone(),
            adjusted_cb: overdrawn.adjusted_cb,
        });
    }

    Ok(ordered)
}
