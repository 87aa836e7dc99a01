//! # Item List Repository
//!
//! Storage for carts, wishlists, saved lists and orders.
//!
//! ## Order Placement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  place_order(list_id)                                                   │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    load list + items + status log                                      │
//! │    load ancestor chains of every active item's node                    │
//! │    ItemList::place_order (vitrine-core)                                │
//! │        ├── effective price of each item ──► order_price                │
//! │        ├── kind = order                                                │
//! │        └── status log += New                                           │
//! │    UPDATE items SET order_price                                        │
//! │    UPDATE item_lists SET kind = 'order'                                │
//! │    INSERT list_statuses ('new')                                        │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure rolls back: an order never mixes frozen and live prices.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation loads the list, applies the rule from `vitrine_core::lists`
//! and writes back only what changed, inside one transaction.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use vitrine_core::catalog::NodeId;
use vitrine_core::lists::{Item, ItemList, ItemListKind, OrderStatus, StatusEntry};
use vitrine_core::{CoreConfig, CoreError, Money};

use crate::error::{DbError, DbResult};
use crate::repository::node::{fetch_branch, fetch_price_tree};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, FromRow)]
struct ListRow {
    id: String,
    kind: ItemListKind,
    owner: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: String,
    node_id: i64,
    quantity: i64,
    order_price: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self) -> DbResult<Item> {
        let order_price = match self.order_price.as_deref() {
            Some(text) => Some(text.parse::<Money>().map_err(|err| {
                DbError::unreadable_price("items", self.id.as_str(), text, err)
            })?),
            None => None,
        };
        Ok(Item {
            id: self.id,
            node_id: NodeId(self.node_id),
            quantity: self.quantity,
            order_price,
            active: self.active,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct StatusRow {
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

// =============================================================================
// Connection-Level Queries
// =============================================================================

async fn fetch_items(conn: &mut SqliteConnection, list_id: &str) -> DbResult<Vec<Item>> {
    let rows = sqlx::query_as::<_, ItemRow>(
        r#"
        SELECT id, node_id, quantity, order_price, active, created_at
        FROM items
        WHERE list_id = ?1
        ORDER BY created_at, rowid
        "#,
    )
    .bind(list_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(ItemRow::into_item).collect()
}

/// The status log in insertion order.
async fn fetch_statuses(conn: &mut SqliteConnection, list_id: &str) -> DbResult<Vec<StatusEntry>> {
    let rows = sqlx::query_as::<_, StatusRow>(
        "SELECT status, created_at FROM list_statuses WHERE list_id = ?1 ORDER BY id",
    )
    .bind(list_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| StatusEntry {
            status: row.status,
            created_at: row.created_at,
        })
        .collect())
}

async fn fetch_list(conn: &mut SqliteConnection, list_id: &str) -> DbResult<Option<ItemList>> {
    let row = sqlx::query_as::<_, ListRow>(
        "SELECT id, kind, owner, created_at, updated_at FROM item_lists WHERE id = ?1",
    )
    .bind(list_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let items = fetch_items(conn, list_id).await?;
    let statuses = fetch_statuses(conn, list_id).await?;
    Ok(Some(ItemList::from_parts(
        row.id,
        row.kind,
        row.owner,
        items,
        statuses,
        row.created_at,
        row.updated_at,
    )))
}

async fn require_list(conn: &mut SqliteConnection, list_id: &str) -> DbResult<ItemList> {
    fetch_list(conn, list_id)
        .await?
        .ok_or_else(|| DbError::not_found("ItemList", list_id))
}

/// Inserts or updates one item row.
async fn save_item(conn: &mut SqliteConnection, list_id: &str, item: &Item) -> DbResult<()> {
    if let Some(price) = &item.order_price {
        price.ensure_storable().map_err(CoreError::from)?;
    }
    sqlx::query(
        r#"
        INSERT INTO items (id, list_id, node_id, quantity, order_price, active, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(id) DO UPDATE SET
            quantity = excluded.quantity,
            order_price = excluded.order_price,
            active = excluded.active
        "#,
    )
    .bind(&item.id)
    .bind(list_id)
    .bind(item.node_id.0)
    .bind(item.quantity)
    .bind(item.order_price.map(|price| price.to_string()))
    .bind(item.active)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn touch_list(conn: &mut SqliteConnection, list: &ItemList) -> DbResult<()> {
    sqlx::query("UPDATE item_lists SET kind = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(list.kind())
        .bind(list.updated_at())
        .bind(list.id())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn insert_status(
    conn: &mut SqliteConnection,
    list_id: &str,
    status: OrderStatus,
    at: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query("INSERT INTO list_statuses (list_id, status, created_at) VALUES (?1, ?2, ?3)")
        .bind(list_id)
        .bind(status)
        .bind(at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for item list operations.
#[derive(Debug, Clone)]
pub struct ListRepository {
    pool: SqlitePool,
}

impl ListRepository {
    /// Creates a new ListRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ListRepository { pool }
    }

    /// Creates an empty list.
    ///
    /// Orders are not created directly: they come from [`Self::place_order`].
    pub async fn create(&self, kind: ItemListKind, owner: Option<&str>) -> DbResult<ItemList> {
        let list = ItemList::new(kind, owner.map(str::to_string), Utc::now());
        if kind == ItemListKind::Order {
            return Err(CoreError::InvalidListKind {
                list_id: list.id().to_string(),
                kind,
            }
            .into());
        }

        sqlx::query(
            "INSERT INTO item_lists (id, kind, owner, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(list.id())
        .bind(list.kind())
        .bind(list.owner())
        .bind(list.created_at())
        .bind(list.updated_at())
        .execute(&self.pool)
        .await?;

        debug!(list_id = %list.id(), kind = ?kind, "Item list created");
        Ok(list)
    }

    /// Gets a list with its items and status log.
    pub async fn get(&self, list_id: &str) -> DbResult<Option<ItemList>> {
        debug!(list_id = %list_id, "Getting item list");
        let mut conn = self.pool.acquire().await?;
        fetch_list(&mut conn, list_id).await
    }

    /// Lists of one owner and kind, most recently updated first.
    pub async fn for_owner(&self, owner: &str, kind: ItemListKind) -> DbResult<Vec<ItemList>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM item_lists WHERE owner = ?1 AND kind = ?2 ORDER BY updated_at DESC",
        )
        .bind(owner)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        let mut conn = self.pool.acquire().await?;
        let mut lists = Vec::with_capacity(ids.len());
        for id in ids {
            lists.push(require_list(&mut conn, &id).await?);
        }
        Ok(lists)
    }

    /// Adds a node to a list, merging with an existing item for the same node.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown list or node
    /// - `Core(InvalidListKind)` for orders
    /// - `Core(NotProcurable)` for categories and products with variations
    /// - `Core(Validation)` / `Core(ListTooLarge)` for limit violations
    pub async fn add_item(
        &self,
        list_id: &str,
        node_id: NodeId,
        quantity: i64,
        config: &CoreConfig,
    ) -> DbResult<Item> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut list = require_list(&mut tx, list_id).await?;
        let branch = fetch_branch(&mut tx, node_id).await?;
        let item = list.add_item(&branch, node_id, quantity, config, now)?.clone();

        save_item(&mut tx, list_id, &item).await?;
        touch_list(&mut tx, &list).await?;
        tx.commit().await?;

        debug!(
            list_id = %list_id,
            node_id = %node_id,
            quantity = item.quantity,
            "Item added"
        );
        Ok(item)
    }

    /// Replaces the quantity of an active item.
    pub async fn set_quantity(
        &self,
        list_id: &str,
        item_id: &str,
        quantity: i64,
        config: &CoreConfig,
    ) -> DbResult<Item> {
        let mut tx = self.pool.begin().await?;
        let mut list = require_list(&mut tx, list_id).await?;
        list.set_quantity(item_id, quantity, config)?;

        let item = list
            .item(item_id)
            .cloned()
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        save_item(&mut tx, list_id, &item).await?;
        tx.commit().await?;

        debug!(list_id = %list_id, item_id = %item_id, quantity, "Item quantity set");
        Ok(item)
    }

    /// Deactivates an item. The row stays for history.
    pub async fn remove_item(&self, list_id: &str, item_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        let mut list = require_list(&mut tx, list_id).await?;
        list.remove_item(item_id)?;

        let item = list
            .item(item_id)
            .cloned()
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        save_item(&mut tx, list_id, &item).await?;
        tx.commit().await?;

        debug!(list_id = %list_id, item_id = %item_id, "Item removed");
        Ok(())
    }

    /// Items of a list, inactive ones included.
    pub async fn items(&self, list_id: &str) -> DbResult<Vec<Item>> {
        let mut conn = self.pool.acquire().await?;
        fetch_items(&mut conn, list_id).await
    }

    /// Sum of active item totals: frozen prices for orders, live prices otherwise.
    pub async fn total(&self, list_id: &str, config: &CoreConfig) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        let list = require_list(&mut conn, list_id).await?;
        let node_ids: Vec<NodeId> = list.active_items().map(|item| item.node_id).collect();
        let tree = fetch_price_tree(&mut conn, node_ids).await?;
        Ok(list.total(&tree, config)?)
    }

    /// Appends a status to an order's log.
    ///
    /// ## Errors
    /// - `Core(InvalidListKind)` for lists that are not orders
    /// - `Core(InvalidStatusTransition)` for moves the log does not allow
    pub async fn record_status(&self, list_id: &str, status: OrderStatus) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut list = require_list(&mut tx, list_id).await?;
        let from = list.current_status();
        list.record_status(status, now)?;

        insert_status(&mut tx, list_id, status, now).await?;
        touch_list(&mut tx, &list).await?;
        tx.commit().await?;

        info!(list_id = %list_id, from = ?from, to = ?status, "Order status recorded");
        Ok(())
    }

    /// The status log in insertion order.
    pub async fn statuses(&self, list_id: &str) -> DbResult<Vec<StatusEntry>> {
        let mut conn = self.pool.acquire().await?;
        fetch_statuses(&mut conn, list_id).await
    }

    /// The most recent status, `None` when the log is empty.
    pub async fn current_status(&self, list_id: &str) -> DbResult<Option<OrderStatus>> {
        let status = sqlx::query_scalar::<_, OrderStatus>(
            r#"
            SELECT status FROM list_statuses
            WHERE list_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(list_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(status)
    }

    /// Turns a cart (or any editable list) into an order.
    ///
    /// Freezes every active item's effective price, switches the kind to
    /// `order` and starts the status log with `New`, all in one transaction.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown list
    /// - `Core(InvalidListKind)` if the list already is an order
    /// - `Core(Validation)` if the list has no active items
    /// - `Core(CurrencyAggregationConflict)` if a price cannot be computed
    /// - `Core(Money(InvalidAmount))` if a price does not fit the wire format
    pub async fn place_order(&self, list_id: &str) -> DbResult<ItemList> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut list = require_list(&mut tx, list_id).await?;
        let node_ids: Vec<NodeId> = list.active_items().map(|item| item.node_id).collect();
        let tree = fetch_price_tree(&mut tx, node_ids).await?;
        list.place_order(&tree, now)?;

        let frozen: Vec<Item> = list.active_items().cloned().collect();
        for item in &frozen {
            save_item(&mut tx, list_id, item).await?;
        }
        touch_list(&mut tx, &list).await?;
        insert_status(&mut tx, list_id, OrderStatus::New, now).await?;
        tx.commit().await?;

        info!(list_id = %list_id, items = frozen.len(), "Order placed");
        Ok(list)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use vitrine_core::catalog::NodeDraft;
    use vitrine_core::currency::Currency;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    struct Shop {
        db: Database,
        shoes: NodeId,
        sneaker: NodeId,
        size_42: NodeId,
        size_43: NodeId,
    }

    /// Shoes (USD 10) ─► Sneaker (USD 5) ─┬─ 42 (USD 2, stock 3)
    ///                                    └─ 43 (USD 3, stock 4)
    async fn shop() -> Shop {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let nodes = db.nodes();

        let shoes = nodes
            .insert(NodeDraft::category("Shoes", "shoes", Currency::USD).with_price(money("USD 10")))
            .await
            .unwrap()
            .id;
        let sneaker = nodes
            .insert(NodeDraft::product("Sneaker", "sneaker", money("USD 5")).under(shoes))
            .await
            .unwrap()
            .id;
        let size_42 = nodes
            .insert(
                NodeDraft::product("Sneaker 42", "sneaker-42", money("USD 2"))
                    .under(sneaker)
                    .with_stock(3),
            )
            .await
            .unwrap()
            .id;
        let size_43 = nodes
            .insert(
                NodeDraft::product("Sneaker 43", "sneaker-43", money("USD 3"))
                    .under(sneaker)
                    .with_stock(4),
            )
            .await
            .unwrap()
            .id;

        Shop {
            db,
            shoes,
            sneaker,
            size_42,
            size_43,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let shop = shop().await;
        let lists = shop.db.lists();

        let cart = lists.create(ItemListKind::Cart, Some("session-1")).await.unwrap();
        let loaded = lists.get(cart.id()).await.unwrap().unwrap();

        assert_eq!(loaded.kind(), ItemListKind::Cart);
        assert_eq!(loaded.owner(), Some("session-1"));
        assert!(loaded.items().is_empty());
        assert!(lists.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_order_directly_rejected() {
        let shop = shop().await;
        let err = shop
            .db
            .lists()
            .create(ItemListKind::Order, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidListKind { .. })));
    }

    #[tokio::test]
    async fn test_add_item_merges_quantity() {
        let shop = shop().await;
        let lists = shop.db.lists();
        let config = CoreConfig::default();
        let cart = lists.create(ItemListKind::Cart, None).await.unwrap();

        let first = lists.add_item(cart.id(), shop.size_42, 1, &config).await.unwrap();
        let second = lists.add_item(cart.id(), shop.size_42, 2, &config).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 3);
        assert_eq!(lists.items(cart.id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_item_rejects_non_procurable() {
        let shop = shop().await;
        let lists = shop.db.lists();
        let config = CoreConfig::default();
        let cart = lists.create(ItemListKind::Cart, None).await.unwrap();

        for node in [shop.shoes, shop.sneaker] {
            let err = lists.add_item(cart.id(), node, 1, &config).await.unwrap_err();
            assert!(matches!(err, DbError::Core(CoreError::NotProcurable { .. })), "{err:?}");
        }

        let err = lists
            .add_item(cart.id(), NodeId(404), 1, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_and_readd_reactivates() {
        let shop = shop().await;
        let lists = shop.db.lists();
        let config = CoreConfig::default();
        let cart = lists.create(ItemListKind::Cart, None).await.unwrap();

        let item = lists.add_item(cart.id(), shop.size_42, 2, &config).await.unwrap();
        lists.remove_item(cart.id(), &item.id).await.unwrap();
        assert!(!lists.items(cart.id()).await.unwrap()[0].active);

        let again = lists.add_item(cart.id(), shop.size_42, 1, &config).await.unwrap();
        assert_eq!(again.id, item.id);
        assert!(again.active);
        assert_eq!(again.quantity, 1);

        let updated = lists
            .set_quantity(cart.id(), &item.id, 4, &config)
            .await
            .unwrap();
        assert_eq!(updated.quantity, 4);
    }

    #[tokio::test]
    async fn test_total_uses_live_prices() {
        let shop = shop().await;
        let lists = shop.db.lists();
        let config = CoreConfig::default();
        let cart = lists.create(ItemListKind::Cart, None).await.unwrap();

        lists.add_item(cart.id(), shop.size_42, 2, &config).await.unwrap();
        lists.add_item(cart.id(), shop.size_43, 1, &config).await.unwrap();

        // 2 × USD 17 + 1 × USD 18
        assert_eq!(lists.total(cart.id(), &config).await.unwrap(), money("USD 52"));

        let empty = lists.create(ItemListKind::Wishlist, None).await.unwrap();
        assert!(lists.total(empty.id(), &config).await.unwrap().is_zero());
    }

    #[tokio::test]
    async fn test_place_order_freezes_prices() {
        let shop = shop().await;
        let lists = shop.db.lists();
        let nodes = shop.db.nodes();
        let config = CoreConfig::default();
        let cart = lists.create(ItemListKind::Cart, Some("session-9")).await.unwrap();

        lists.add_item(cart.id(), shop.size_42, 2, &config).await.unwrap();
        let order = lists.place_order(cart.id()).await.unwrap();

        assert_eq!(order.kind(), ItemListKind::Order);
        assert_eq!(order.items()[0].order_price, Some(money("USD 17")));
        assert_eq!(lists.current_status(cart.id()).await.unwrap(), Some(OrderStatus::New));

        // The catalog price changes after placement
        let mut fragments = nodes.get(shop.shoes).await.unwrap().unwrap().fragments;
        fragments.price = money("USD 100");
        nodes.update_fragments(shop.shoes, &fragments).await.unwrap();
        assert_eq!(nodes.effective_price(shop.size_42).await.unwrap(), money("USD 107"));

        // The order keeps its frozen price
        let stored = lists.items(cart.id()).await.unwrap();
        assert_eq!(stored[0].order_price, Some(money("USD 17")));
        assert_eq!(lists.total(cart.id(), &config).await.unwrap(), money("USD 34"));
    }

    #[tokio::test]
    async fn test_frozen_price_from_arithmetic_reads_back() {
        let shop = shop().await;
        let lists = shop.db.lists();
        let nodes = shop.db.nodes();
        let config = CoreConfig::default();

        let mut fragments = nodes.get(shop.shoes).await.unwrap().unwrap().fragments;
        fragments.price = money("USD 100").divide(3).unwrap().round_to_cents();
        nodes.update_fragments(shop.shoes, &fragments).await.unwrap();

        let cart = lists.create(ItemListKind::Cart, None).await.unwrap();
        lists.add_item(cart.id(), shop.size_42, 3, &config).await.unwrap();
        lists.place_order(cart.id()).await.unwrap();

        let stored = lists.get(cart.id()).await.unwrap().unwrap();
        assert_eq!(stored.items()[0].order_price, Some(money("USD 40.33")));
        assert_eq!(lists.total(cart.id(), &config).await.unwrap(), money("USD 120.99"));
    }

    /// Frozen prices as stored, plus kind and status log count.
    async fn placement_state(
        lists: &ListRepository,
        list_id: &str,
    ) -> (Vec<Option<Money>>, ItemListKind, usize) {
        let list = lists.get(list_id).await.unwrap().unwrap();
        let prices = list.items().iter().map(|item| item.order_price).collect();
        let statuses = lists.statuses(list_id).await.unwrap().len();
        (prices, list.kind(), statuses)
    }

    #[tokio::test]
    async fn test_mixed_currency_cart_places_nothing() {
        let shop = shop().await;
        let lists = shop.db.lists();
        let nodes = shop.db.nodes();
        let config = CoreConfig::default();

        let hats = nodes
            .insert(NodeDraft::category("Hats", "hats", Currency::from_code("EUR").unwrap()))
            .await
            .unwrap();
        let cap = nodes
            .insert(NodeDraft::product("Cap", "cap", money("USD 12")).under(hats.id))
            .await
            .unwrap();

        let cart = lists.create(ItemListKind::Cart, None).await.unwrap();
        lists.add_item(cart.id(), shop.size_42, 1, &config).await.unwrap();
        lists.add_item(cart.id(), cap.id, 1, &config).await.unwrap();

        let err = lists.place_order(cart.id()).await.unwrap_err();
        assert!(
            matches!(err, DbError::Core(CoreError::CurrencyAggregationConflict { .. })),
            "{err:?}"
        );
        assert_eq!(
            placement_state(&lists, cart.id()).await,
            (vec![None, None], ItemListKind::Cart, 0)
        );

        // once the category is priced in USD the same cart goes through
        let mut fragments = hats.fragments.clone();
        fragments.price = money("USD 0");
        nodes.update_fragments(hats.id, &fragments).await.unwrap();

        lists.place_order(cart.id()).await.unwrap();
        assert_eq!(
            placement_state(&lists, cart.id()).await,
            (
                vec![Some(money("USD 17")), Some(money("USD 12"))],
                ItemListKind::Order,
                1
            )
        );
    }

    #[tokio::test]
    async fn test_over_range_price_places_nothing() {
        let shop = shop().await;
        let lists = shop.db.lists();
        let nodes = shop.db.nodes();
        let config = CoreConfig::default();

        let yacht = nodes
            .insert(NodeDraft::product("Yacht", "yacht", money("USD 999999999999999.99")))
            .await
            .unwrap();
        let deluxe = nodes
            .insert(
                NodeDraft::product("Yacht Deluxe", "yacht-deluxe", money("USD 1")).under(yacht.id),
            )
            .await
            .unwrap();

        let cart = lists.create(ItemListKind::Cart, None).await.unwrap();
        lists.add_item(cart.id(), shop.size_43, 1, &config).await.unwrap();
        lists.add_item(cart.id(), deluxe.id, 1, &config).await.unwrap();

        let err = lists.place_order(cart.id()).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Money(_))), "{err:?}");
        assert_eq!(
            placement_state(&lists, cart.id()).await,
            (vec![None, None], ItemListKind::Cart, 0)
        );
    }

    #[tokio::test]
    async fn test_unreadable_order_price_is_reported() {
        let shop = shop().await;
        let lists = shop.db.lists();
        let config = CoreConfig::default();
        let cart = lists.create(ItemListKind::Cart, None).await.unwrap();
        let item = lists.add_item(cart.id(), shop.size_42, 1, &config).await.unwrap();

        sqlx::query("UPDATE items SET order_price = 'USD 1.005' WHERE id = ?1")
            .bind(&item.id)
            .execute(shop.db.pool())
            .await
            .unwrap();

        match lists.items(cart.id()).await {
            Err(DbError::UnreadablePrice { table, row, .. }) => {
                assert_eq!(table, "items");
                assert_eq!(row, item.id);
            }
            other => panic!("expected UnreadablePrice, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_place_order_twice_rejected() {
        let shop = shop().await;
        let lists = shop.db.lists();
        let config = CoreConfig::default();
        let cart = lists.create(ItemListKind::Cart, None).await.unwrap();

        lists.add_item(cart.id(), shop.size_43, 1, &config).await.unwrap();
        lists.place_order(cart.id()).await.unwrap();

        let err = lists.place_order(cart.id()).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidListKind { .. })));

        let err = lists
            .add_item(cart.id(), shop.size_42, 1, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidListKind { .. })));
        assert_eq!(lists.statuses(cart.id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_place_empty_order_rejected() {
        let shop = shop().await;
        let lists = shop.db.lists();
        let cart = lists.create(ItemListKind::Cart, None).await.unwrap();

        let err = lists.place_order(cart.id()).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let stored = lists.get(cart.id()).await.unwrap().unwrap();
        assert_eq!(stored.kind(), ItemListKind::Cart);
        assert!(lists.statuses(cart.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_log() {
        let shop = shop().await;
        let lists = shop.db.lists();
        let config = CoreConfig::default();
        let cart = lists.create(ItemListKind::Cart, None).await.unwrap();

        // Carts have no status log
        let err = lists.record_status(cart.id(), OrderStatus::Paid).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidListKind { .. })));

        lists.add_item(cart.id(), shop.size_42, 1, &config).await.unwrap();
        lists.place_order(cart.id()).await.unwrap();
        lists.record_status(cart.id(), OrderStatus::Paid).await.unwrap();

        let err = lists.record_status(cart.id(), OrderStatus::New).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidStatusTransition { .. })
        ));

        lists.record_status(cart.id(), OrderStatus::Cancelled).await.unwrap();
        let log: Vec<_> = lists
            .statuses(cart.id())
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.status)
            .collect();
        assert_eq!(log, vec![OrderStatus::New, OrderStatus::Paid, OrderStatus::Cancelled]);
        assert_eq!(
            lists.current_status(cart.id()).await.unwrap(),
            Some(OrderStatus::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_for_owner() {
        let shop = shop().await;
        let lists = shop.db.lists();
        lists.create(ItemListKind::Cart, Some("alice")).await.unwrap();
        lists.create(ItemListKind::Wishlist, Some("alice")).await.unwrap();
        lists.create(ItemListKind::Cart, Some("bob")).await.unwrap();

        let carts = lists.for_owner("alice", ItemListKind::Cart).await.unwrap();
        assert_eq!(carts.len(), 1);
        assert_eq!(carts[0].owner(), Some("alice"));
    }
}
