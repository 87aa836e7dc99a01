//! # vitrine-core: Pure Business Logic for Vitrine
//!
//! This crate is the **heart** of Vitrine. It contains the catalog, cart and
//! money rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vitrine Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Storefront (outside this workspace)             │   │
//! │  │    Category page ──► Product page ──► Cart ──► Checkout         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vitrine-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  currency │  │  catalog  │  │   lists   │  │ validation│  │   │
//! │  │   │   money   │  │ tree, agg │  │ cart/order│  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   vitrine-db (Database Layer)                   │   │
//! │  │        SQLite, nested-set tree storage, order placement         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`currency`] - Currency registry
//! - [`money`] - Decimal Money with currency-checked arithmetic
//! - [`catalog`] - Catalog tree and aggregates (price, stock, supplier)
//! - [`lists`] - Carts, wishlists, orders and price freezing
//! - [`tax`] - Percentage taxes by country
//! - [`config`] - Default currency and list limits
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic; time comes in as a parameter
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Decimal Money**: Amounts are `rust_decimal::Decimal`, never floats
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use vitrine_core::catalog::{effective_price, CatalogTree, NodeDraft, NodeId};
//! use vitrine_core::currency::currency;
//!
//! let usd = currency("USD").unwrap();
//! let now = Utc::now();
//! let mut tree = CatalogTree::new();
//!
//! let shoes = NodeDraft::category("Shoes", "shoes", usd).with_price("USD 10".parse().unwrap());
//! let sneaker = NodeDraft::product("Sneaker", "sneaker", "USD 5".parse().unwrap()).under(NodeId(1));
//! let size_42 = NodeDraft::product("Sneaker 42", "sneaker-42", "USD 2".parse().unwrap()).under(NodeId(2));
//!
//! tree.insert(NodeId(1), shoes, now).unwrap();
//! tree.insert(NodeId(2), sneaker, now).unwrap();
//! tree.insert(NodeId(3), size_42, now).unwrap();
//!
//! // Price fragments add up along the ancestor chain
//! assert_eq!(effective_price(&tree, NodeId(3)).unwrap().to_string(), "USD 17");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod config;
pub mod currency;
pub mod error;
pub mod lists;
pub mod money;
pub mod tax;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use vitrine_core::Money` instead of
// `use vitrine_core::money::Money`

pub use catalog::{CatalogIndex, CatalogTree, Node, NodeDraft, NodeId, NodeKind};
pub use config::CoreConfig;
pub use currency::{currency, Currency};
pub use error::{CoreError, CoreResult, MoneyError, MoneyResult, ValidationError};
pub use lists::{Item, ItemList, ItemListKind, OrderStatus, StatusEntry};
pub use money::{Factor, Money};
pub use tax::{CountryCode, Tax};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default maximum of distinct items in one list.
///
/// ## Business Reason
/// Prevents runaway carts. Override per store through `CoreConfig`.
pub const MAX_LIST_ITEMS: usize = 100;

/// Default maximum quantity of a single item.
///
/// ## Business Reason
/// Catches typos such as 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;
