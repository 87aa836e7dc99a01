//! # Repository Module
//!
//! Database repository implementations for Vitrine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request handler                                                       │
//! │       │                                                                 │
//! │       │  db.nodes().summary(id)                                        │
//! │       │  db.lists().place_order(&cart_id)                              │
//! │       ▼                                                                 │
//! │  Repository  ──► loads rows ──► vitrine-core rules ──► writes rows     │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Business rules live in vitrine-core. Repositories own SQL and         │
//! │  transaction boundaries only.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`NodeRepository`] - Catalog tree, nested-set bounds, aggregates
//! - [`ListRepository`] - Carts, wishlists, orders and the status log

pub mod list;
pub mod node;

pub use list::ListRepository;
pub use node::NodeRepository;
