//! Infrastructure layer: stores, configuration and the application services that
//! drive the compliance rules against them.

pub mod config;
pub mod error;
pub mod ledger_manager;
pub mod owner_locks;
pub mod pool_allocator;
pub mod route_catalog;
pub mod seed;
pub mod store;

pub use config::{ConfigError, EngineConfig, LogFormat};
pub use error::{EngineError, EngineResult};
pub use ledger_manager::{ApplyOutcome, LedgerManager};
pub use pool_allocator::PoolAllocator;
pub use route_catalog::RouteCatalog;
pub use seed::seed_demo_data;
pub use store::{
    InMemoryLedgerStore, InMemoryPoolStore, InMemoryRouteStore, LedgerStore, PoolStore, RouteStore,
    SqliteStore, StoreError,
};
