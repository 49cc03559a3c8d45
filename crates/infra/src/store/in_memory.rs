//! In-memory stores for tests/dev.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use fueleu_compliance::{LedgerEntry, Pool, Route};
use fueleu_core::{Entity, LedgerEntryId, RouteId};

use super::{LedgerStore, PoolStore, RouteStore, StoreError};

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

/// Routes kept in insertion order; saving an existing id replaces it in place.
#[derive(Debug, Default)]
pub struct InMemoryRouteStore {
    inner: RwLock<Vec<Route>>,
}

impl InMemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RouteStore for InMemoryRouteStore {
    async fn save(&self, route: Route) -> Result<(), StoreError> {
        let mut routes = self.inner.write().map_err(poisoned)?;
        match routes.iter_mut().find(|r| r.id == route.id) {
            Some(existing) => *existing = route,
            None => routes.push(route),
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &RouteId) -> Result<Option<Route>, StoreError> {
        let routes = self.inner.read().map_err(poisoned)?;
        Ok(routes.iter().find(|r| &r.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Route>, StoreError> {
        Ok(self.inner.read().map_err(poisoned)?.clone())
    }

    async fn set_baseline(&self, id: &RouteId) -> Result<Option<Route>, StoreError> {
        let mut routes = self.inner.write().map_err(poisoned)?;
        if !routes.iter().any(|r| &r.id == id) {
            return Ok(None);
        }
        let mut updated = None;
        for route in routes.iter_mut() {
            route.is_baseline = &route.id == id;
            if route.is_baseline {
                updated = Some(route.clone());
            }
        }
        Ok(updated)
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    entries: Vec<LedgerEntry>,
    by_id: HashMap<LedgerEntryId, usize>,
}

/// Ledger entries in insertion order with an id index for upserts.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<LedgerState>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn get_entries(
        &self,
        route_id: &RouteId,
        year: Option<i32>,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let state = self.inner.read().map_err(poisoned)?;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.route_id() == route_id)
            .filter(|e| year.is_none_or(|y| e.year() == y))
            .cloned()
            .collect())
    }

    async fn save_entries(&self, entries: Vec<LedgerEntry>) -> Result<(), StoreError> {
        // One write guard for the whole batch.
        let mut state = self.inner.write().map_err(poisoned)?;
        for entry in entries {
            match state.by_id.get(entry.id()).copied() {
                Some(idx) => state.entries[idx] = entry,
                None => {
                    let idx = state.entries.len();
                    state.by_id.insert(*entry.id(), idx);
                    state.entries.push(entry);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPoolStore {
    inner: RwLock<Vec<Pool>>,
}

impl InMemoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PoolStore for InMemoryPoolStore {
    async fn save_pool(&self, pool: Pool) -> Result<(), StoreError> {
        let mut pools = self.inner.write().map_err(poisoned)?;
        if pools.iter().any(|p| p.id == pool.id) {
            return Err(StoreError::Conflict(format!("pool {} already exists", pool.id)));
        }
        pools.push(pool);
        Ok(())
    }

    async fn find_all_pools(&self, year: i32) -> Result<Vec<Pool>, StoreError> {
        let pools = self.inner.read().map_err(poisoned)?;
        Ok(pools.iter().filter(|p| p.year == year).cloned().collect())
    }
}
