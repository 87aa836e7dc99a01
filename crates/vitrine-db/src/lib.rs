//! # vitrine-db: Database Layer for Vitrine
//!
//! This crate stores the Vitrine catalog and item lists in SQLite, using sqlx
//! for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vitrine Data Flow                                │
//! │                                                                         │
//! │  Storefront request (product page, add to cart, checkout)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    vitrine-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ NodeRepo      │    │ 001_catalog  │  │   │
//! │  │   │ SqlitePool    │◄───│ ListRepo      │    │ 002_lists    │  │   │
//! │  │   │ Settings      │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                $VITRINE_DATABASE_PATH (./vitrine.db)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`settings`] - `VITRINE_*` environment settings
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (nodes, lists)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vitrine_db::{Database, Settings};
//!
//! let settings = Settings::from_env()?;
//! let db = Database::new(settings.db_config()).await?;
//!
//! let price = db.nodes().effective_price(node_id).await?;
//! let order = db.lists().place_order(&cart_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod settings;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use settings::{ConfigError, Settings};

// Repository re-exports for convenience
pub use repository::list::ListRepository;
pub use repository::node::NodeRepository;
