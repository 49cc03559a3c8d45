//! Pool Allocator service: validates a pool request, runs the greedy allocation
//! and persists the finalized pool.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{info, instrument};

use fueleu_compliance::{
    ComplianceError, Pool, PoolAllocationResult, allocate, calculate_balance,
};
use fueleu_core::{PoolId, RouteId};

use crate::error::{EngineResult, traced};
use crate::store::{PoolStore, RouteStore};

pub struct PoolAllocator<R, P> {
    routes: R,
    pools: P,
}

impl<R, P> PoolAllocator<R, P>
where
    R: RouteStore,
    P: PoolStore,
{
    pub fn new(routes: R, pools: P) -> Self {
        Self { routes, pools }
    }

    /// Redistribute the members' balances and persist the pool. Nothing is
    /// persisted unless every rule check passes.
    #[instrument(skip(self, route_ids), fields(members = route_ids.len()))]
    pub async fn create_pool(
        &self,
        route_ids: Vec<RouteId>,
        name: String,
        year: i32,
    ) -> EngineResult<PoolAllocationResult> {
        traced("create_pool", self.create(route_ids, name, year).await)
    }

    async fn create(
        &self,
        route_ids: Vec<RouteId>,
        name: String,
        year: i32,
    ) -> EngineResult<PoolAllocationResult> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ComplianceError::validation("pool name must not be empty").into());
        }
        if route_ids.len() < 2 {
            return Err(ComplianceError::validation("a pool needs at least two route ids").into());
        }
        let duplicate = {
            let mut seen = HashSet::new();
            route_ids.iter().find(|id| !seen.insert(*id)).cloned()
        };
        if let Some(dup) = duplicate {
            return Err(ComplianceError::validation(format!("route id {dup} is listed twice")).into());
        }

        let mut balances = Vec::with_capacity(route_ids.len());
        let mut missing = Vec::new();
        for id in route_ids {
            match self.routes.find_by_id(&id).await? {
                Some(route) => balances.push((id, calculate_balance(&route))),
                None => missing.push(id),
            }
        }
        if !missing.is_empty() {
            return Err(ComplianceError::InvalidMembers { missing }.into());
        }

        let members = allocate(balances)?;
        let pool = Pool {
            id: PoolId::new(),
            name,
            year,
            members,
            created_at: Utc::now(),
        };
        let result = PoolAllocationResult::from(&pool);
        self.pools.save_pool(pool).await?;

        info!(
            pool_id = %result.pool_id,
            total_sum_cb = result.total_sum_cb,
            "pool created"
        );
        Ok(result)
    }

    pub async fn list_pools(&self, year: i32) -> EngineResult<Vec<Pool>> {
        Ok(self.pools.find_all_pools(year).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use fueleu_compliance::{Route, TARGET_INTENSITY_2025};

    use crate::error::EngineError;
    use crate::store::{InMemoryPoolStore, InMemoryRouteStore};

    type Allocator = PoolAllocator<Arc<InMemoryRouteStore>, Arc<InMemoryPoolStore>>;

    fn rid(s: &str) -> RouteId {
        RouteId::new(s).unwrap()
    }

    /// Route whose balance is exactly `cb` (energy in scope of 41 000 MJ).
    fn route_with_cb(id: &str, cb: f64) -> Route {
        Route {
            id: rid(id),
            vessel_type: "RoRo".to_string(),
            fuel_type: "HFO".to_string(),
            year: 2025,
            ghg_intensity: TARGET_INTENSITY_2025 - cb / 41_000.0,
            fuel_consumption: 1.0,
            distance: 1_000.0,
            is_baseline: false,
        }
    }

    async fn allocator(routes: &[Route]) -> (Allocator, Arc<InMemoryPoolStore>) {
        let store = Arc::new(InMemoryRouteStore::new());
        for route in routes {
            store.save(route.clone()).await.unwrap();
        }
        let pools = Arc::new(InMemoryPoolStore::new());
        (PoolAllocator::new(store, pools.clone()), pools)
    }

    fn compliance(err: EngineError) -> ComplianceError {
        match err {
            EngineError::Compliance(e) => e,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn balanced_pool_is_persisted() {
        let (allocator, pools) = allocator(&[
            route_with_cb("A", 82_000.0),
            route_with_cb("B", -41_000.0),
        ])
        .await;

        let result = allocator
            .create_pool(vec![rid("A"), rid("B")], "Pair".to_string(), 2025)
            .await
            .unwrap();

        assert_eq!(result.pool_name, "Pair");
        assert_eq!(result.members.len(), 2);
        assert!((result.total_sum_cb - 41_000.0).abs() < 1e-3);
        // Recipient first, fully covered; the donor keeps the rest.
        assert_eq!(result.members[0].route_id, rid("B"));
        assert_eq!(result.members[0].adjusted_cb, 0.0);
        assert!((result.members[1].adjusted_cb - 41_000.0).abs() < 1e-3);

        let stored = pools.find_all_pools(2025).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, result.pool_id);
        assert_eq!(allocator.list_pools(2025).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn infeasible_pool_is_not_persisted() {
        let (allocator, pools) = allocator(&[
            route_with_cb("A", 20_500.0),
            route_with_cb("B", -36_900.0),
        ])
        .await;

        let err = allocator
            .create_pool(vec![rid("A"), rid("B")], "Short".to_string(), 2025)
            .await
            .unwrap_err();
        match compliance(err) {
            ComplianceError::PoolInfeasible { total_sum_cb, members } => {
                assert!(total_sum_cb < 0.0);
                assert_eq!(members.len(), 2);
                assert!(members.iter().all(|m| m.allocation_used == 0.0));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(pools.find_all_pools(2025).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_members_are_listed() {
        let (allocator, pools) = allocator(&[route_with_cb("A", 1.0)]).await;

        let err = allocator
            .create_pool(vec![rid("A"), rid("X"), rid("Y")], "Ghost".to_string(), 2025)
            .await
            .unwrap_err();
        assert_eq!(
            compliance(err),
            ComplianceError::InvalidMembers {
                missing: vec![rid("X"), rid("Y")]
            }
        );
        assert!(pools.find_all_pools(2025).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn request_shape_is_validated() {
        let (allocator, _) = allocator(&[route_with_cb("A", 1.0), route_with_cb("B", 1.0)]).await;

        for (ids, name) in [
            (vec![rid("A")], "Solo"),
            (vec![rid("A"), rid("A")], "Twice"),
            (vec![rid("A"), rid("B")], "   "),
        ] {
            let err = allocator
                .create_pool(ids, name.to_string(), 2025)
                .await
                .unwrap_err();
            assert!(matches!(compliance(err), ComplianceError::Validation(_)));
        }
    }
}
