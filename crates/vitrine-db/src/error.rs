//! # Database Error Types
//!
//! What can go wrong between the catalog/list rules and SQLite.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  write path                          read path                          │
//! │                                                                         │
//! │  Money::ensure_storable ── no ──►    "USD 3.3333…" in price_fragment    │
//! │       │              Core(Money)          │                             │
//! │       ▼                                   ▼                             │
//! │  sqlx::Error ──► Duplicate / Query   UnreadablePrice { table, row }     │
//! │                                                                         │
//! │  CoreError (vitrine-core) passes through unchanged as DbError::Core    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use vitrine_core::{CoreError, MoneyError};

/// Errors of the storage layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// A node or list id that is not stored.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A UNIQUE index rejected the row, e.g. a slug already in use.
    #[error("Duplicate {field}")]
    Duplicate { field: String },

    /// A Money column holds text that is not in the wire format.
    ///
    /// Rows written by this crate never get here: prices are checked with
    /// `Money::ensure_storable` before every write.
    #[error("Stored price '{value}' in {table} row {row} cannot be read")]
    UnreadablePrice {
        table: &'static str,
        row: String,
        value: String,
        #[source]
        source: MoneyError,
    },

    /// The database could not be opened or the pool is gone.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// An embedded migration did not apply.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Any other SQLite failure, including CHECK constraints.
    #[error("Query failed: {0}")]
    Query(String),

    /// A catalog or list rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl DbError {
    /// Creates a NotFound error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates an UnreadablePrice error for a column that failed to parse.
    pub fn unreadable_price(
        table: &'static str,
        row: impl ToString,
        value: impl Into<String>,
        source: MoneyError,
    ) -> Self {
        DbError::UnreadablePrice {
            table,
            row: row.to_string(),
            value: value.into(),
            source,
        }
    }
}

/// Sorts sqlx failures into the variants above.
///
/// ```text
/// "UNIQUE constraint failed: catalog_nodes.slug"  → Duplicate { field: "catalog_nodes.slug" }
/// other database errors                           → Query
/// pool timed out / closed, I/O                     → Connection
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                match msg.strip_prefix("UNIQUE constraint failed: ") {
                    Some(field) => DbError::Duplicate {
                        field: field.to_string(),
                    },
                    None => DbError::Query(msg.to_string()),
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DbError::Connection(err.to_string())
            }
            _ => DbError::Query(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
