//! # Item Lists
//!
//! Carts, wishlists, saved-for-later lists and orders share one type,
//! `ItemList`, told apart by `kind`.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Cart / Wishlist / Saved                                               │
//! │   ├── add_item, set_quantity, remove_item                               │
//! │   ├── Item.price = LIVE effective price (changes with the catalog)     │
//! │   │                                                                     │
//! │   │   place_order()                                                     │
//! │   │   ├── 1. compute every active item's price (fail → nothing changed) │
//! │   │   ├── 2. stamp them as order_price (FROZEN)                         │
//! │   │   ├── 3. kind = Order                                               │
//! │   │   └── 4. append status New                                          │
//! │   ▼                                                                     │
//! │   Order                                                                 │
//! │   └── status log, append-only:                                          │
//! │       New → Processing → Invoiced → Paid → Sent → Delivered → Finished │
//! │        └──────────┴──────────┴────────┴──────┴────────┴──→ Cancelled    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Once frozen, an item's price never follows catalog edits again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::catalog::{effective_price, is_procurable, stock_available, CatalogIndex, NodeId};
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::validate_quantity;

// =============================================================================
// List Kind
// =============================================================================

/// What a list is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ItemListKind {
    Cart,
    Wishlist,
    /// Saved for later.
    Saved,
    /// A placed order: prices frozen, status log active.
    Order,
}

// =============================================================================
// Order Status
// =============================================================================

/// Order fulfilment states, in their forward order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum OrderStatus {
    New,
    Processing,
    Invoiced,
    Paid,
    Sent,
    Delivered,
    Finished,
    Cancelled,
}

impl OrderStatus {
    fn rank(self) -> u8 {
        self as u8
    }

    /// `Finished` and `Cancelled` end the log.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Finished | OrderStatus::Cancelled)
    }

    /// True if `next` may be appended after `self`.
    ///
    /// ## Example
    /// ```rust
    /// use vitrine_core::lists::OrderStatus;
    ///
    /// assert!(OrderStatus::New.can_transition_to(OrderStatus::Paid));
    /// assert!(OrderStatus::Sent.can_transition_to(OrderStatus::Cancelled));
    /// assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::New));
    /// assert!(!OrderStatus::Finished.can_transition_to(OrderStatus::Cancelled));
    /// ```
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == OrderStatus::Cancelled || next.rank() > self.rank()
    }
}

/// One entry of a list's status log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusEntry {
    pub status: OrderStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Item
// =============================================================================

/// A catalog node in a list, with a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The product or variation.
    pub node_id: NodeId,

    pub quantity: i64,

    /// Price stamped when the order was placed. `None` means the live
    /// catalog price applies. A frozen zero is still frozen.
    #[ts(type = "string | null")]
    pub order_price: Option<Money>,

    /// Removed items stay in the list as inactive rows.
    pub active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Item {
    fn new(node_id: NodeId, quantity: i64, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            node_id,
            quantity,
            order_price: None,
            active: true,
            created_at: at,
        }
    }

    /// True once the price has been frozen.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.order_price.is_some()
    }

    /// Unit price: the frozen price if present, else the live effective price.
    pub fn price<T: CatalogIndex + ?Sized>(&self, tree: &T) -> CoreResult<Money> {
        match self.order_price {
            Some(price) => Ok(price),
            None => effective_price(tree, self.node_id),
        }
    }

    /// Unit price × quantity.
    pub fn total<T: CatalogIndex + ?Sized>(&self, tree: &T) -> CoreResult<Money> {
        Ok(self.price(tree)?.scale(self.quantity)?)
    }

    /// True if the available stock covers the whole quantity.
    pub fn in_stock<T: CatalogIndex + ?Sized>(&self, tree: &T) -> CoreResult<bool> {
        Ok(stock_available(tree, self.node_id)? >= self.quantity)
    }
}

// =============================================================================
// Item List
// =============================================================================

/// A cart, wishlist, saved list or order.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use vitrine_core::lists::{ItemList, ItemListKind};
///
/// let cart = ItemList::new(ItemListKind::Cart, Some("session-42".to_string()), Utc::now());
/// assert_eq!(cart.kind(), ItemListKind::Cart);
/// assert!(cart.current_status().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct ItemList {
    id: String,
    kind: ItemListKind,
    owner: Option<String>,
    items: Vec<Item>,
    statuses: Vec<StatusEntry>,

    #[ts(as = "String")]
    created_at: DateTime<Utc>,

    #[ts(as = "String")]
    updated_at: DateTime<Utc>,
}

impl ItemList {
    /// Creates an empty list with a fresh UUID.
    pub fn new(kind: ItemListKind, owner: Option<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            owner,
            items: Vec::new(),
            statuses: Vec::new(),
            created_at: at,
            updated_at: at,
        }
    }

    /// Reassembles a stored list.
    pub fn from_parts(
        id: String,
        kind: ItemListKind,
        owner: Option<String>,
        items: Vec<Item>,
        statuses: Vec<StatusEntry>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            owner,
            items,
            statuses,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ItemListKind {
        self.kind
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Every item, removed ones included.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The status log in insertion order.
    pub fn statuses(&self) -> &[StatusEntry] {
        &self.statuses
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Items that have not been removed.
    pub fn active_items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.iter().filter(|item| item.active)
    }

    /// Looks up an active item.
    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.active_items().find(|item| item.id == item_id)
    }

    // -------------------------------------------------------------------------
    // Editing
    // -------------------------------------------------------------------------

    /// Adds a node to the list, or raises the quantity if it is already there.
    ///
    /// ## Errors
    /// - `InvalidListKind` for orders
    /// - `NodeNotFound` / `NotProcurable` for nodes that cannot be bought
    /// - `Validation` if the resulting quantity is out of range
    /// - `ListTooLarge` if a new line would exceed `config.max_list_items`
    pub fn add_item<T: CatalogIndex + ?Sized>(
        &mut self,
        tree: &T,
        node_id: NodeId,
        quantity: i64,
        config: &CoreConfig,
        at: DateTime<Utc>,
    ) -> CoreResult<&Item> {
        self.ensure_editable()?;
        validate_quantity(quantity, config.max_item_quantity)?;
        if !is_procurable(tree, node_id)? {
            return Err(CoreError::NotProcurable { node: node_id });
        }

        let idx = match self.items.iter().position(|item| item.node_id == node_id) {
            Some(idx) => {
                let item = &mut self.items[idx];
                let merged = if item.active {
                    item.quantity + quantity
                } else {
                    quantity
                };
                validate_quantity(merged, config.max_item_quantity)?;
                item.quantity = merged;
                item.active = true;
                idx
            }
            None => {
                if self.active_items().count() >= config.max_list_items {
                    return Err(CoreError::ListTooLarge {
                        max: config.max_list_items,
                    });
                }
                self.items.push(Item::new(node_id, quantity, at));
                self.items.len() - 1
            }
        };

        self.updated_at = at;
        Ok(&self.items[idx])
    }

    /// Replaces the quantity of an active item.
    pub fn set_quantity(
        &mut self,
        item_id: &str,
        quantity: i64,
        config: &CoreConfig,
    ) -> CoreResult<()> {
        self.ensure_editable()?;
        validate_quantity(quantity, config.max_item_quantity)?;
        self.active_item_mut(item_id)?.quantity = quantity;
        Ok(())
    }

    /// Deactivates an item. The row is kept.
    pub fn remove_item(&mut self, item_id: &str) -> CoreResult<()> {
        self.ensure_editable()?;
        self.active_item_mut(item_id)?.active = false;
        Ok(())
    }

    fn active_item_mut(&mut self, item_id: &str) -> CoreResult<&mut Item> {
        self.items
            .iter_mut()
            .find(|item| item.active && item.id == item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))
    }

    fn ensure_editable(&self) -> CoreResult<()> {
        if self.kind == ItemListKind::Order {
            return Err(CoreError::InvalidListKind {
                list_id: self.id.clone(),
                kind: self.kind,
            });
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Totals & Stock
    // -------------------------------------------------------------------------

    /// Sum of active item totals; zero in the default currency when empty.
    pub fn total<T: CatalogIndex + ?Sized>(&self, tree: &T, config: &CoreConfig) -> CoreResult<Money> {
        let mut total: Option<Money> = None;
        for item in self.active_items() {
            let line = item.total(tree)?;
            total = Some(match total {
                None => line,
                Some(sum) => sum.add(&line)?,
            });
        }
        Ok(total.unwrap_or_else(|| config.zero()))
    }

    /// Fails with `InsufficientStock` for the first active item whose
    /// quantity exceeds the available stock.
    pub fn check_stock<T: CatalogIndex + ?Sized>(&self, tree: &T) -> CoreResult<()> {
        for item in self.active_items() {
            let available = stock_available(tree, item.node_id)?;
            if available < item.quantity {
                return Err(CoreError::InsufficientStock {
                    node: item.node_id,
                    available,
                    requested: item.quantity,
                });
            }
        }
        Ok(())
    }

    /// True if the list has active items and every one of them is in stock.
    pub fn checkout_possible<T: CatalogIndex + ?Sized>(&self, tree: &T) -> CoreResult<bool> {
        let mut any = false;
        for item in self.active_items() {
            if !item.in_stock(tree)? {
                return Ok(false);
            }
            any = true;
        }
        Ok(any)
    }

    // -------------------------------------------------------------------------
    // Status Log
    // -------------------------------------------------------------------------

    fn latest_entry(&self) -> Option<&StatusEntry> {
        self.statuses
            .iter()
            .enumerate()
            .max_by_key(|(idx, entry)| (entry.created_at, *idx))
            .map(|(_, entry)| entry)
    }

    /// The authoritative status: latest by creation time, later insertion
    /// wins a tie.
    pub fn current_status(&self) -> Option<OrderStatus> {
        self.latest_entry().map(|entry| entry.status)
    }

    fn check_transition(&self, status: OrderStatus, at: DateTime<Utc>) -> CoreResult<()> {
        let Some(latest) = self.latest_entry() else {
            return Ok(());
        };
        if at < latest.created_at {
            return Err(ValidationError::InvalidFormat {
                field: "created_at".to_string(),
                reason: "earlier than the current status".to_string(),
            }
            .into());
        }
        if !latest.status.can_transition_to(status) {
            return Err(CoreError::InvalidStatusTransition {
                list_id: self.id.clone(),
                from: latest.status,
                to: status,
            });
        }
        Ok(())
    }

    /// Appends a status to an order's log.
    ///
    /// ## Errors
    /// - `InvalidListKind` unless the list is an order
    /// - `InvalidStatusTransition` if the status does not move forward
    /// - `Validation` if `at` predates the current status
    pub fn record_status(&mut self, status: OrderStatus, at: DateTime<Utc>) -> CoreResult<()> {
        if self.kind != ItemListKind::Order {
            return Err(CoreError::InvalidListKind {
                list_id: self.id.clone(),
                kind: self.kind,
            });
        }
        self.check_transition(status, at)?;
        self.statuses.push(StatusEntry {
            status,
            created_at: at,
        });
        self.updated_at = at;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Price Freezing
    // -------------------------------------------------------------------------

    /// Stamps every active item with its current price.
    ///
    /// All prices are computed before any item is touched, so on error the
    /// list is unchanged. Already frozen items keep their price.
    pub fn freeze_prices<T: CatalogIndex + ?Sized>(&mut self, tree: &T) -> CoreResult<()> {
        let prices = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.active)
            .map(|(idx, item)| {
                let price = item.price(tree)?;
                price.ensure_storable()?;
                Ok((idx, price))
            })
            .collect::<CoreResult<Vec<_>>>()?;

        for (idx, price) in prices {
            self.items[idx].order_price = Some(price);
        }
        Ok(())
    }

    /// Turns the list into an order.
    ///
    /// ## Steps
    /// ```text
    /// kind == Order?          → InvalidListKind
    /// no active items?        → Validation (items required)
    /// freeze_prices(tree)     → any failure leaves the list unchanged
    /// kind = Order, append New
    /// ```
    pub fn place_order<T: CatalogIndex + ?Sized>(
        &mut self,
        tree: &T,
        at: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.ensure_editable()?;
        if self.active_items().next().is_none() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }
        self.check_transition(OrderStatus::New, at)?;

        self.freeze_prices(tree)?;
        self.kind = ItemListKind::Order;
        self.statuses.push(StatusEntry {
            status: OrderStatus::New,
            created_at: at,
        });
        self.updated_at = at;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
