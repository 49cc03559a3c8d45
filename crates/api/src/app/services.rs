//! Store selection and service wiring.

use std::sync::Arc;

use anyhow::Context;

use fueleu_infra::{
    EngineConfig, InMemoryLedgerStore, InMemoryPoolStore, InMemoryRouteStore, LedgerManager,
    LedgerStore, PoolAllocator, PoolStore, RouteCatalog, RouteStore, SqliteStore, seed_demo_data,
};

pub type SharedRouteStore = Arc<dyn RouteStore>;
pub type SharedLedgerStore = Arc<dyn LedgerStore>;
pub type SharedPoolStore = Arc<dyn PoolStore>;

pub struct AppServices {
    pub catalog: RouteCatalog<SharedRouteStore>,
    pub ledger: LedgerManager<SharedRouteStore, SharedLedgerStore>,
    pub pools: PoolAllocator<SharedRouteStore, SharedPoolStore>,
}

impl AppServices {
    pub fn from_stores(
        routes: SharedRouteStore,
        ledger: SharedLedgerStore,
        pools: SharedPoolStore,
    ) -> Self {
        Self {
            catalog: RouteCatalog::new(routes.clone()),
            ledger: LedgerManager::new(routes.clone(), ledger),
            pools: PoolAllocator::new(routes, pools),
        }
    }

    /// Fresh in-memory stores (dev/test).
    pub fn in_memory() -> Self {
        Self::from_stores(
            Arc::new(InMemoryRouteStore::new()),
            Arc::new(InMemoryLedgerStore::new()),
            Arc::new(InMemoryPoolStore::new()),
        )
    }
}

/// Build services from configuration: SQLite when a database URL is set,
/// in-memory stores otherwise. Seeds demo data when enabled.
pub async fn build_services(config: &EngineConfig) -> anyhow::Result<AppServices> {
    let (routes, ledger, pools) = match &config.database_url {
        Some(url) => {
            let store = Arc::new(
                SqliteStore::connect(url)
                    .await
                    .with_context(|| format!("failed to open database {url}"))?,
            );
            tracing::info!("using sqlite stores");
            let routes: SharedRouteStore = store.clone();
            let ledger: SharedLedgerStore = store.clone();
            let pools: SharedPoolStore = store;
            (routes, ledger, pools)
        }
        None => {
            tracing::info!("using in-memory stores");
            let routes: SharedRouteStore = Arc::new(InMemoryRouteStore::new());
            let ledger: SharedLedgerStore = Arc::new(InMemoryLedgerStore::new());
            let pools: SharedPoolStore = Arc::new(InMemoryPoolStore::new());
            (routes, ledger, pools)
        }
    };

    if config.seed_demo {
        seed_demo_data(&routes, &ledger)
            .await
            .context("failed to seed demo data")?;
    }

    Ok(AppServices::from_stores(routes, ledger, pools))
}
