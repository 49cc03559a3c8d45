//! Store ports (routes, banked-surplus ledger, pools) and their adapters.
//!
//! Services depend on these traits only. Two adapters ship with the crate:
//! in-memory stores for tests/dev and a SQLite store for durable deployments.

pub mod in_memory;
pub mod sqlite;

use std::sync::Arc;

use thiserror::Error;

use fueleu_compliance::{LedgerEntry, Pool, Route};
use fueleu_core::RouteId;

pub use in_memory::{InMemoryLedgerStore, InMemoryPoolStore, InMemoryRouteStore};
pub use sqlite::SqliteStore;

/// Store operation error.
///
/// These are **infrastructure errors** as opposed to compliance rule violations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage failed (connection, IO, SQL error).
    #[error("backend failure: {0}")]
    Backend(String),

    /// A persisted record could not be turned back into a domain value.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// A write conflicted with existing data (e.g. duplicate pool id).
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Persists route records.
#[async_trait::async_trait]
pub trait RouteStore: Send + Sync {
    /// Insert or replace by route id.
    async fn save(&self, route: Route) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &RouteId) -> Result<Option<Route>, StoreError>;

    /// All routes, in insertion order.
    async fn find_all(&self) -> Result<Vec<Route>, StoreError>;

    /// Flag `id` as the baseline and clear the flag on every other route, as
    /// one atomic write. Returns the updated route, or `None` (and changes
    /// nothing) when `id` is unknown.
    async fn set_baseline(&self, id: &RouteId) -> Result<Option<Route>, StoreError>;
}

/// Persists banked-surplus entries. Entries are upserted by id, never deleted.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Entries owned by `route_id`, optionally restricted to one origin year,
    /// in insertion order.
    async fn get_entries(
        &self,
        route_id: &RouteId,
        year: Option<i32>,
    ) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Insert or replace one entry by id.
    async fn save_entry(&self, entry: LedgerEntry) -> Result<(), StoreError> {
        self.save_entries(vec![entry]).await
    }

    /// Insert or replace a batch of entries. Either every entry is persisted or
    /// none is.
    async fn save_entries(&self, entries: Vec<LedgerEntry>) -> Result<(), StoreError>;
}

/// Persists finalized pools.
#[async_trait::async_trait]
pub trait PoolStore: Send + Sync {
    /// Persist the pool and all of its members atomically.
    async fn save_pool(&self, pool: Pool) -> Result<(), StoreError>;

    /// Pools for `year`, oldest first.
    async fn find_all_pools(&self, year: i32) -> Result<Vec<Pool>, StoreError>;
}

#[async_trait::async_trait]
impl<S> RouteStore for Arc<S>
where
    S: RouteStore + ?Sized,
{
    async fn save(&self, route: Route) -> Result<(), StoreError> {
        (**self).save(route).await
    }

    async fn find_by_id(&self, id: &RouteId) -> Result<Option<Route>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn find_all(&self) -> Result<Vec<Route>, StoreError> {
        (**self).find_all().await
    }

    async fn set_baseline(&self, id: &RouteId) -> Result<Option<Route>, StoreError> {
        (**self).set_baseline(id).await
    }
}

#[async_trait::async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn get_entries(
        &self,
        route_id: &RouteId,
        year: Option<i32>,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        (**self).get_entries(route_id, year).await
    }

    async fn save_entry(&self, entry: LedgerEntry) -> Result<(), StoreError> {
        (**self).save_entry(entry).await
    }

    async fn save_entries(&self, entries: Vec<LedgerEntry>) -> Result<(), StoreError> {
        (**self).save_entries(entries).await
    }
}

#[async_trait::async_trait]
impl<S> PoolStore for Arc<S>
where
    S: PoolStore + ?Sized,
{
    async fn save_pool(&self, pool: Pool) -> Result<(), StoreError> {
        (**self).save_pool(pool).await
    }

    async fn find_all_pools(&self, year: i32) -> Result<Vec<Pool>, StoreError> {
        (**self).find_all_pools(year).await
    }
}
