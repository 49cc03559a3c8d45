//! SQLite-backed stores.
//!
//! One `SqliteStore` implements all three store ports over a shared pool.
//! Identifiers are stored as TEXT; every table carries an autoincrement `seq`
//! column so listings come back in insertion order.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database (unique violation) | `Conflict` |
//! | Database (other) | `Backend` |
//! | PoolClosed / IO / other | `Backend` |
//! | Column decode failure | `Corrupt` |

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::instrument;

use fueleu_compliance::{LedgerEntry, Pool, PoolMember, Route};
use fueleu_core::{Entity, LedgerEntryId, PoolId, RouteId};

use super::{LedgerStore, PoolStore, RouteStore, StoreError};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS routes (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        vessel_type TEXT NOT NULL,
        fuel_type TEXT NOT NULL,
        year INTEGER NOT NULL,
        ghg_intensity REAL NOT NULL,
        fuel_consumption REAL NOT NULL,
        distance REAL NOT NULL,
        is_baseline INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ledger_entries (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        route_id TEXT NOT NULL,
        year INTEGER NOT NULL,
        amount REAL NOT NULL CHECK (amount > 0),
        applied_year INTEGER
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ledger_entries_owner ON ledger_entries (route_id, year)",
    r#"
    CREATE TABLE IF NOT EXISTS pools (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        year INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pool_members (
        pool_id TEXT NOT NULL REFERENCES pools (id),
        position INTEGER NOT NULL,
        route_id TEXT NOT NULL,
        initial_cb REAL NOT NULL,
        adjusted_cb REAL NOT NULL,
        allocation_used REAL NOT NULL,
        PRIMARY KEY (pool_id, position)
    )
    "#,
];

/// SQLite implementation of [`RouteStore`], [`LedgerStore`] and [`PoolStore`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `url` and apply the schema.
    ///
    /// In-memory URLs get a single long-lived connection: every SQLite
    /// connection to `:memory:` would otherwise see its own empty database.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| map_sqlx_error("parse_url", e))?
            .create_if_missing(true);

        let pool_options = if is_in_memory_url(url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Create the tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RouteStore for SqliteStore {
    #[instrument(skip(self, route), fields(route_id = %route.id), err)]
    async fn save(&self, route: Route) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO routes (
                id, vessel_type, fuel_type, year,
                ghg_intensity, fuel_consumption, distance, is_baseline
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (id) DO UPDATE SET
                vessel_type = excluded.vessel_type,
                fuel_type = excluded.fuel_type,
                year = excluded.year,
                ghg_intensity = excluded.ghg_intensity,
                fuel_consumption = excluded.fuel_consumption,
                distance = excluded.distance,
                is_baseline = excluded.is_baseline
            "#,
        )
        .bind(route.id.as_str())
        .bind(&route.vessel_type)
        .bind(&route.fuel_type)
        .bind(route.year)
        .bind(route.ghg_intensity)
        .bind(route.fuel_consumption)
        .bind(route.distance)
        .bind(route.is_baseline)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_route", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(route_id = %id), err)]
    async fn find_by_id(&self, id: &RouteId) -> Result<Option<Route>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, vessel_type, fuel_type, year, ghg_intensity,
                   fuel_consumption, distance, is_baseline
            FROM routes
            WHERE id = ?1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_route", e))?;

        row.as_ref().map(route_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_all(&self) -> Result<Vec<Route>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, vessel_type, fuel_type, year, ghg_intensity,
                   fuel_consumption, distance, is_baseline
            FROM routes
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_routes", e))?;

        rows.iter().map(route_from_row).collect()
    }

    #[instrument(skip(self), fields(route_id = %id), err)]
    async fn set_baseline(&self, id: &RouteId) -> Result<Option<Route>, StoreError> {
        // Single statement: either every flag moves or none does.
        let result = sqlx::query(
            r#"
            UPDATE routes
            SET is_baseline = CASE WHEN id = ?1 THEN 1 ELSE 0 END
            WHERE EXISTS (SELECT 1 FROM routes WHERE id = ?1)
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_baseline", e))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }
}

#[async_trait::async_trait]
impl LedgerStore for SqliteStore {
    #[instrument(skip(self), fields(route_id = %route_id), err)]
    async fn get_entries(
        &self,
        route_id: &RouteId,
        year: Option<i32>,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, route_id, year, amount, applied_year
            FROM ledger_entries
            WHERE route_id = ?1 AND (?2 IS NULL OR year = ?2)
            ORDER BY seq ASC
            "#,
        )
        .bind(route_id.as_str())
        .bind(year)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_entries", e))?;

        rows.iter().map(entry_from_row).collect()
    }

    #[instrument(skip(self, entries), fields(entry_count = entries.len()), err)]
    async fn save_entries(&self, entries: Vec<LedgerEntry>) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Dropping `tx` on an early return rolls the batch back.
        for entry in &entries {
            sqlx::query(
                r#"
                INSERT INTO ledger_entries (id, route_id, year, amount, applied_year)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT (id) DO UPDATE SET
                    route_id = excluded.route_id,
                    year = excluded.year,
                    amount = excluded.amount,
                    applied_year = excluded.applied_year
                "#,
            )
            .bind(entry.id().to_string())
            .bind(entry.route_id().as_str())
            .bind(entry.year())
            .bind(entry.amount())
            .bind(entry.applied_year())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("save_entry", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PoolStore for SqliteStore {
    #[instrument(skip(self, pool), fields(pool_id = %pool.id, member_count = pool.members.len()), err)]
    async fn save_pool(&self, pool: Pool) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("INSERT INTO pools (id, name, year, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(pool.id.to_string())
            .bind(&pool.name)
            .bind(pool.year)
            .bind(pool.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_pool", e))?;

        for (position, member) in pool.members.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO pool_members (
                    pool_id, position, route_id, initial_cb, adjusted_cb, allocation_used
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(pool.id.to_string())
            .bind(position as i64)
            .bind(member.route_id.as_str())
            .bind(member.initial_cb)
            .bind(member.adjusted_cb)
            .bind(member.allocation_used)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_pool_member", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_all_pools(&self, year: i32) -> Result<Vec<Pool>, StoreError> {
        let pool_rows = sqlx::query(
            "SELECT id, name, year, created_at FROM pools WHERE year = ?1 ORDER BY seq ASC",
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_pools", e))?;

        let member_rows = sqlx::query(
            r#"
            SELECT m.pool_id, m.route_id, m.initial_cb, m.adjusted_cb, m.allocation_used
            FROM pool_members m
            JOIN pools p ON p.id = m.pool_id
            WHERE p.year = ?1
            ORDER BY m.pool_id, m.position ASC
            "#,
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_pool_members", e))?;

        let mut members: HashMap<String, Vec<PoolMember>> = HashMap::new();
        for row in &member_rows {
            let pool_id: String = get(row, "pool_id")?;
            members.entry(pool_id).or_default().push(member_from_row(row)?);
        }

        pool_rows
            .iter()
            .map(|row| -> Result<Pool, StoreError> {
                let id: String = get(row, "id")?;
                let created_at: DateTime<Utc> = get(row, "created_at")?;
                Ok(Pool {
                    id: PoolId::from_str(&id).map_err(corrupt)?,
                    name: get(row, "name")?,
                    year: get(row, "year")?,
                    members: members.remove(&id).unwrap_or_default(),
                    created_at,
                })
            })
            .collect()
    }
}

fn get<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Corrupt(format!("failed to read column {column}: {e}")))
}

fn corrupt(err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

fn route_from_row(row: &SqliteRow) -> Result<Route, StoreError> {
    let id: String = get(row, "id")?;
    Ok(Route {
        id: RouteId::new(id).map_err(corrupt)?,
        vessel_type: get(row, "vessel_type")?,
        fuel_type: get(row, "fuel_type")?,
        year: get(row, "year")?,
        ghg_intensity: get(row, "ghg_intensity")?,
        fuel_consumption: get(row, "fuel_consumption")?,
        distance: get(row, "distance")?,
        is_baseline: get(row, "is_baseline")?,
    })
}

fn entry_from_row(row: &SqliteRow) -> Result<LedgerEntry, StoreError> {
    let id: String = get(row, "id")?;
    let route_id: String = get(row, "route_id")?;
    Ok(LedgerEntry::restore(
        LedgerEntryId::from_str(&id).map_err(corrupt)?,
        RouteId::new(route_id).map_err(corrupt)?,
        get(row, "year")?,
        get(row, "amount")?,
        get(row, "applied_year")?,
    ))
}

fn member_from_row(row: &SqliteRow) -> Result<PoolMember, StoreError> {
    let route_id: String = get(row, "route_id")?;
    Ok(PoolMember {
        route_id: RouteId::new(route_id).map_err(corrupt)?,
        initial_cb: get(row, "initial_cb")?,
        adjusted_cb: get(row, "adjusted_cb")?,
        allocation_used: get(row, "allocation_used")?,
    })
}

/// True for `sqlite::memory:`, `sqlite://:memory:` and any URL carrying a
/// `mode=memory` query parameter.
fn is_in_memory_url(url: &str) -> bool {
    let rest = url.strip_prefix("sqlite:").unwrap_or(url);
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let (database, query) = rest.split_once('?').unwrap_or((rest, ""));
    database == ":memory:"
        || query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .any(|(key, value)| key == "mode" && value == "memory")
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if db_err.is_unique_violation() {
                StoreError::Conflict(msg)
            } else {
                StoreError::Backend(msg)
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Corrupt(format!("decode error in {}: {}", operation, err))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    fn rid(s: &str) -> RouteId {
        RouteId::new(s).unwrap()
    }

    fn route(id: &str, ghg: f64, baseline: bool) -> Route {
        Route {
            id: rid(id),
            vessel_type: "Tanker".to_string(),
            fuel_type: "MGO".to_string(),
            year: 2024,
            ghg_intensity: ghg,
            fuel_consumption: 4_800.0,
            distance: 11_500.0,
            is_baseline: baseline,
        }
    }

    #[tokio::test]
    async fn routes_round_trip_in_insertion_order() {
        let store = store().await;
        store.save(route("R002", 88.0, false)).await.unwrap();
        store.save(route("R001", 91.0, true)).await.unwrap();
        store.save(route("R002", 87.5, false)).await.unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], route("R002", 87.5, false));
        assert_eq!(all[1], route("R001", 91.0, true));

        let found = store.find_by_id(&rid("R001")).await.unwrap();
        assert_eq!(found, Some(route("R001", 91.0, true)));
        assert!(store.find_by_id(&rid("R404")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn baseline_switch_is_a_single_write() {
        let store = store().await;
        store.save(route("R001", 91.0, true)).await.unwrap();
        store.save(route("R002", 88.0, false)).await.unwrap();

        assert!(store.set_baseline(&rid("R404")).await.unwrap().is_none());

        let updated = store.set_baseline(&rid("R002")).await.unwrap().unwrap();
        assert_eq!(updated, route("R002", 88.0, true));
        let flags: Vec<bool> = store
            .find_all()
            .await
            .unwrap()
            .iter()
            .map(|r| r.is_baseline)
            .collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn memory_urls_are_recognised() {
        assert!(is_in_memory_url("sqlite::memory:"));
        assert!(is_in_memory_url("sqlite://:memory:"));
        assert!(is_in_memory_url("sqlite://shared?mode=memory&cache=shared"));
        assert!(is_in_memory_url("sqlite:file.db?cache=shared&mode=memory"));
        assert!(!is_in_memory_url("sqlite://fueleu.db?mode=rwc"));
        assert!(!is_in_memory_url("sqlite://memory.db"));
    }

    #[tokio::test]
    async fn ledger_entries_upsert_and_filter_by_year() {
        let store = store().await;
        let mut first = LedgerEntry::bank(rid("R002"), 2024, 10_000_000.0).unwrap();
        let second = LedgerEntry::bank(rid("R002"), 2025, 2_500.0).unwrap();
        store.save_entries(vec![first.clone(), second.clone()]).await.unwrap();
        store
            .save_entry(LedgerEntry::bank(rid("R003"), 2024, 1.0).unwrap())
            .await
            .unwrap();

        first.mark_applied(2025).unwrap();
        store.save_entry(first.clone()).await.unwrap();

        let all = store.get_entries(&rid("R002"), None).await.unwrap();
        assert_eq!(all, vec![first, second.clone()]);

        let only_2025 = store.get_entries(&rid("R002"), Some(2025)).await.unwrap();
        assert_eq!(only_2025, vec![second]);
    }

    #[tokio::test]
    async fn failed_batch_leaves_no_partial_writes() {
        let store = store().await;
        let good = LedgerEntry::bank(rid("R002"), 2024, 5.0).unwrap();
        // Violates the amount CHECK constraint, so the whole batch must roll back.
        let bad = LedgerEntry::restore(LedgerEntryId::new(), rid("R002"), 2024, -1.0, None);

        assert!(store.save_entries(vec![good, bad]).await.is_err());
        assert!(store.get_entries(&rid("R002"), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pools_persist_members_in_order() {
        let store = store().await;
        let pool = Pool {
            id: PoolId::new(),
            name: "Atlantic".to_string(),
            year: 2024,
            members: vec![
                PoolMember {
                    route_id: rid("R2"),
                    initial_cb: -1_000.0,
                    adjusted_cb: 0.0,
                    allocation_used: 1_000.0,
                },
                PoolMember {
                    route_id: rid("R1"),
                    initial_cb: 1_500.0,
                    adjusted_cb: 500.0,
                    allocation_used: -1_000.0,
                },
            ],
            created_at: Utc::now(),
        };
        store.save_pool(pool.clone()).await.unwrap();

        let pools = store.find_all_pools(2024).await.unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].id, pool.id);
        assert_eq!(pools[0].name, "Atlantic");
        assert_eq!(pools[0].members, pool.members);
        assert!(store.find_all_pools(2023).await.unwrap().is_empty());

        assert!(matches!(
            store.save_pool(pool).await,
            Err(StoreError::Conflict(_))
        ));
    }
}
