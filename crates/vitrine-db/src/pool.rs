//! # Database Handle
//!
//! Opens SQLite, applies the embedded migrations and hands out repositories.
//!
//! ## Two Kinds of Database
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig::new("./vitrine.db")          DbConfig::in_memory()           │
//! │       │                                       │                         │
//! │       ▼                                       ▼                         │
//! │  file, created if missing               sqlite::memory:                 │
//! │  WAL journal, NORMAL sync               one connection, never recycled  │
//! │  up to max_connections                  (a second one would see an     │
//! │                                          empty database)                │
//! │       │                                       │                         │
//! │       └──────────────► foreign_keys = ON ◄────┘                         │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                  migrations ─► db.nodes() / db.lists()                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories that open transactions (`insert`, `reparent`, `add_item`,
//! `place_order`) read through the transaction's own connection, so the
//! single in-memory connection never waits on itself.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::list::ListRepository;
use crate::repository::node::NodeRepository;

const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the shop database lives and how many connections it may use.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("./data/vitrine.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, or `:memory:`.
    pub database_path: PathBuf,

    /// Pool size for file databases. In-memory databases always use one.
    pub max_connections: u32,

    /// How long to wait for a free connection.
    pub acquire_timeout: Duration,

    /// Apply pending migrations while connecting.
    pub run_migrations: bool,
}

impl DbConfig {
    /// A file database at `path` with 5 connections.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            run_migrations: true,
        }
    }

    /// A private in-memory database, used by tests and the seeder's dry runs.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            ..DbConfig::new(MEMORY_PATH)
        }
    }

    /// Sets the pool size.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets whether migrations run on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// True for `:memory:` databases.
    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        if self.is_in_memory() {
            SqliteConnectOptions::new()
                .in_memory(true)
                .foreign_keys(true)
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .foreign_keys(true)
        }
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().acquire_timeout(self.acquire_timeout);
        if self.is_in_memory() {
            // dropping the only connection drops the data with it
            options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options.max_connections(self.max_connections)
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the shop database.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./vitrine.db")).await?;
/// let summary = db.nodes().summary(node_id).await?;
/// let order = db.lists().place_order(&cart_id).await?;
/// ```
///
/// Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects and, unless disabled, brings the schema up to date.
    ///
    /// ## Errors
    /// - `Connection` if SQLite cannot open the database
    /// - `Migration` if the schema cannot be applied
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            in_memory = config.is_in_memory(),
            "Opening shop database"
        );

        let pool = config
            .pool_options()
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;
        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    /// Applies pending migrations. Safe to call repeatedly.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await?;
        info!("Schema up to date");
        Ok(())
    }

    /// The underlying pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Catalog tree storage.
    pub fn nodes(&self) -> NodeRepository {
        NodeRepository::new(self.pool.clone())
    }

    /// Carts, wishlists, saved lists and orders.
    pub fn lists(&self) -> ListRepository {
        ListRepository::new(self.pool.clone())
    }

    /// Closes every connection. Repositories fail afterwards.
    pub async fn close(&self) {
        info!("Closing shop database");
        self.pool.close().await;
    }

    /// True if a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_has_schema() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        for table in ["catalog_nodes", "item_lists", "items", "list_statuses"] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = sqlx::query(
            "INSERT INTO items (id, list_id, node_id, quantity, active, created_at) \
             VALUES ('i', 'no-such-list', 1, 1, 1, '2024-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .map_err(DbError::from)
        .unwrap_err();
        assert!(matches!(err, DbError::Query(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_closed_database_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);

        let err = db.nodes().count().await.unwrap_err();
        assert!(matches!(err, DbError::Connection(_)), "{err:?}");
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());

        let memory = DbConfig::in_memory();
        assert!(memory.is_in_memory());
        assert_eq!(memory.max_connections, 1);
        assert!(memory.run_migrations);
    }
}
