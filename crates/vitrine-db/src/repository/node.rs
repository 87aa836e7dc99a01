//! # Node Repository
//!
//! Storage for the catalog tree.
//!
//! ## Two Views of One Tree
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  parent_id      adjacency list, the source of truth for shape          │
//! │  lft/rght/level nested-set bounds, rewritten after every shape change  │
//! │                                                                         │
//! │  insert / reparent                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    write parent_id                                                      │
//! │    load all rows ──► CatalogTree (vitrine-core) ──► kinds + bounds     │
//! │    UPDATE rows whose kind or bounds changed                            │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Reads use the bounds:                                                  │
//! │    ancestors   : lft <= n.lft AND rght >= n.rght ORDER BY lft          │
//! │    descendants : lft >= n.lft AND rght <= n.rght ORDER BY lft          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Aggregates (price, stock, supplier) are never stored. They are computed
//! by `vitrine_core::catalog` on a branch loaded at call time.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};
use vitrine_core::catalog::{
    self, derive_kind, Bounds, CatalogTree, Fragments, Node, NodeDraft, NodeId, NodeKind,
    NodeSummary,
};
use vitrine_core::validation::{validate_node_name, validate_slug};
use vitrine_core::{CoreError, Money};

use crate::error::{DbError, DbResult};

const NODE_COLUMNS: &str = "id, parent_id, name, slug, description, active, kind, \
     price_fragment, stock_fragment, pending_customer_fragment, pending_supplier_fragment, \
     supplier, lft, rght, level, created_at, updated_at";

// =============================================================================
// Row Mapping
// =============================================================================

/// One row of `catalog_nodes`.
#[derive(Debug, FromRow)]
struct NodeRow {
    id: i64,
    parent_id: Option<i64>,
    name: String,
    slug: String,
    description: String,
    active: bool,
    kind: NodeKind,
    price_fragment: String,
    stock_fragment: i64,
    pending_customer_fragment: i64,
    pending_supplier_fragment: i64,
    supplier: Option<String>,
    lft: i64,
    rght: i64,
    level: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NodeRow {
    fn bounds(&self) -> Bounds {
        Bounds {
            lft: self.lft,
            rght: self.rght,
            level: self.level,
        }
    }

    fn into_node(self) -> DbResult<Node> {
        let price: Money = self.price_fragment.parse().map_err(|err| {
            DbError::unreadable_price("catalog_nodes", self.id, self.price_fragment.as_str(), err)
        })?;
        Ok(Node {
            id: NodeId(self.id),
            parent: self.parent_id.map(NodeId),
            name: self.name,
            slug: self.slug,
            description: self.description,
            active: self.active,
            kind: self.kind,
            fragments: Fragments {
                price,
                stock: self.stock_fragment,
                pending_customer: self.pending_customer_fragment,
                pending_supplier: self.pending_supplier_fragment,
            },
            supplier: self.supplier,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn into_nodes(rows: Vec<NodeRow>) -> DbResult<Vec<Node>> {
    rows.into_iter().map(NodeRow::into_node).collect()
}

// =============================================================================
// Connection-Level Queries
// =============================================================================
// Shared with the list repository so that reads inside a transaction use the
// transaction's connection.

async fn fetch_row(conn: &mut SqliteConnection, id: NodeId) -> DbResult<Option<NodeRow>> {
    let sql = format!("SELECT {NODE_COLUMNS} FROM catalog_nodes WHERE id = ?1");
    let row = sqlx::query_as::<_, NodeRow>(&sql)
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

async fn require_row(conn: &mut SqliteConnection, id: NodeId) -> DbResult<NodeRow> {
    fetch_row(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Node", id.to_string()))
}

async fn fetch_all_rows(conn: &mut SqliteConnection) -> DbResult<Vec<NodeRow>> {
    let sql = format!("SELECT {NODE_COLUMNS} FROM catalog_nodes ORDER BY lft, id");
    let rows = sqlx::query_as::<_, NodeRow>(&sql)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Ancestor chain of `id` in root → node order.
pub(crate) async fn fetch_ancestors(
    conn: &mut SqliteConnection,
    id: NodeId,
    include_self: bool,
) -> DbResult<Vec<Node>> {
    let bounds = require_row(conn, id).await?.bounds();
    let sql = if include_self {
        format!("SELECT {NODE_COLUMNS} FROM catalog_nodes WHERE lft <= ?1 AND rght >= ?2 ORDER BY lft")
    } else {
        format!("SELECT {NODE_COLUMNS} FROM catalog_nodes WHERE lft < ?1 AND rght > ?2 ORDER BY lft")
    };
    let rows = sqlx::query_as::<_, NodeRow>(&sql)
        .bind(bounds.lft)
        .bind(bounds.rght)
        .fetch_all(&mut *conn)
        .await?;
    into_nodes(rows)
}

/// Subtree of `id` in pre-order.
pub(crate) async fn fetch_descendants(
    conn: &mut SqliteConnection,
    id: NodeId,
    include_self: bool,
) -> DbResult<Vec<Node>> {
    let bounds = require_row(conn, id).await?.bounds();
    let sql = if include_self {
        format!("SELECT {NODE_COLUMNS} FROM catalog_nodes WHERE lft >= ?1 AND rght <= ?2 ORDER BY lft")
    } else {
        format!("SELECT {NODE_COLUMNS} FROM catalog_nodes WHERE lft > ?1 AND rght < ?2 ORDER BY lft")
    };
    let rows = sqlx::query_as::<_, NodeRow>(&sql)
        .bind(bounds.lft)
        .bind(bounds.rght)
        .fetch_all(&mut *conn)
        .await?;
    into_nodes(rows)
}

/// Ancestors and subtree of `id` as one tree.
///
/// Siblings of the ancestors are not loaded, so only aggregates of `id` and
/// its descendants are meaningful on the result.
pub(crate) async fn fetch_branch(conn: &mut SqliteConnection, id: NodeId) -> DbResult<CatalogTree> {
    let mut nodes = fetch_ancestors(conn, id, false).await?;
    nodes.extend(fetch_descendants(conn, id, true).await?);
    Ok(CatalogTree::from_nodes(nodes)?)
}

/// Union of the ancestor chains of `ids`: enough to price every one of them.
pub(crate) async fn fetch_price_tree(
    conn: &mut SqliteConnection,
    ids: impl IntoIterator<Item = NodeId>,
) -> DbResult<CatalogTree> {
    let mut chains: HashMap<NodeId, Node> = HashMap::new();
    for id in ids {
        if chains.contains_key(&id) {
            continue;
        }
        for node in fetch_ancestors(conn, id, true).await? {
            chains.entry(node.id).or_insert(node);
        }
    }
    Ok(CatalogTree::from_nodes(chains.into_values().collect())?)
}

type StoredLayout = HashMap<i64, (Bounds, NodeKind)>;

fn stored_layout(rows: &[NodeRow]) -> StoredLayout {
    rows.iter().map(|row| (row.id, (row.bounds(), row.kind))).collect()
}

/// Writes kind and bounds of every node whose stored values differ.
async fn write_layout(
    conn: &mut SqliteConnection,
    tree: &CatalogTree,
    stored: &StoredLayout,
) -> DbResult<usize> {
    let mut written = 0;
    for node in tree.iter() {
        let Some(bounds) = tree.bounds(node.id) else {
            continue;
        };
        if stored.get(&node.id.0) == Some(&(bounds, node.kind)) {
            continue;
        }

        sqlx::query("UPDATE catalog_nodes SET lft = ?1, rght = ?2, level = ?3, kind = ?4 WHERE id = ?5")
            .bind(bounds.lft)
            .bind(bounds.rght)
            .bind(bounds.level)
            .bind(node.kind)
            .bind(node.id.0)
            .execute(&mut *conn)
            .await?;
        written += 1;
    }

    debug!(written, "Catalog layout written");
    Ok(written)
}

/// Reloads the whole tree and rewrites stale kinds and bounds.
async fn rebuild_layout(conn: &mut SqliteConnection) -> DbResult<usize> {
    let rows = fetch_all_rows(conn).await?;
    let stored = stored_layout(&rows);
    let tree = CatalogTree::from_nodes(into_nodes(rows)?)?;
    write_layout(conn, &tree, &stored).await
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog node operations.
#[derive(Debug, Clone)]
pub struct NodeRepository {
    pool: SqlitePool,
}

impl NodeRepository {
    /// Creates a new NodeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NodeRepository { pool }
    }

    /// Inserts a node and returns it with its derived kind.
    ///
    /// ## What This Does
    /// 1. Validates name and slug
    /// 2. Derives the kind from the stored parent's kind
    /// 3. Inserts the row
    /// 4. Rewrites nested-set bounds, all in one transaction
    ///
    /// ## Errors
    /// - `NotFound` if the parent does not exist
    /// - `Duplicate` if the slug is taken
    /// - `Core(Validation)` for a bad name or slug
    /// - `Core(Money(InvalidAmount))` for a price the wire format cannot hold
    pub async fn insert(&self, draft: NodeDraft) -> DbResult<Node> {
        validate_node_name(&draft.name).map_err(CoreError::from)?;
        validate_slug(draft.slug.trim()).map_err(CoreError::from)?;
        draft.fragments.price.ensure_storable().map_err(CoreError::from)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let parent_kind = match draft.parent {
            Some(parent) => Some(require_row(&mut tx, parent).await?.kind),
            None => None,
        };
        let kind = derive_kind(draft.as_category, parent_kind);
        let node = Node::from_draft(NodeId(0), draft, now);

        let result = sqlx::query(
            r#"
            INSERT INTO catalog_nodes (
                parent_id, name, slug, description, active, kind,
                price_fragment, stock_fragment, pending_customer_fragment,
                pending_supplier_fragment, supplier, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(node.parent.map(|p| p.0))
        .bind(&node.name)
        .bind(&node.slug)
        .bind(&node.description)
        .bind(node.active)
        .bind(kind)
        .bind(node.fragments.price.to_string())
        .bind(node.fragments.stock)
        .bind(node.fragments.pending_customer)
        .bind(node.fragments.pending_supplier)
        .bind(node.supplier())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let id = NodeId(result.last_insert_rowid());
        rebuild_layout(&mut tx).await?;
        let stored = require_row(&mut tx, id).await?.into_node()?;
        tx.commit().await?;

        info!(id = %id, slug = %stored.slug, kind = ?stored.kind, "Catalog node created");
        Ok(stored)
    }

    /// Gets a node by ID.
    pub async fn get(&self, id: NodeId) -> DbResult<Option<Node>> {
        debug!(id = %id, "Getting node");
        let mut conn = self.pool.acquire().await?;
        fetch_row(&mut conn, id)
            .await?
            .map(NodeRow::into_node)
            .transpose()
    }

    /// Gets a node by slug.
    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Node>> {
        debug!(slug = %slug, "Getting node by slug");
        let sql = format!("SELECT {NODE_COLUMNS} FROM catalog_nodes WHERE slug = ?1");
        sqlx::query_as::<_, NodeRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .map(NodeRow::into_node)
            .transpose()
    }

    /// Root nodes in tree order.
    pub async fn roots(&self) -> DbResult<Vec<Node>> {
        let sql = format!("SELECT {NODE_COLUMNS} FROM catalog_nodes WHERE parent_id IS NULL ORDER BY lft");
        let rows = sqlx::query_as::<_, NodeRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        into_nodes(rows)
    }

    /// Direct children ordered by name.
    pub async fn children(&self, id: NodeId) -> DbResult<Vec<Node>> {
        debug!(id = %id, "Listing children");
        let sql = format!(
            "SELECT {NODE_COLUMNS} FROM catalog_nodes WHERE parent_id = ?1 ORDER BY name, id"
        );
        let rows = sqlx::query_as::<_, NodeRow>(&sql)
            .bind(id.0)
            .fetch_all(&self.pool)
            .await?;
        into_nodes(rows)
    }

    /// Ancestor chain in root → node order.
    pub async fn ancestors(&self, id: NodeId, include_self: bool) -> DbResult<Vec<Node>> {
        debug!(id = %id, include_self, "Listing ancestors");
        let mut conn = self.pool.acquire().await?;
        fetch_ancestors(&mut conn, id, include_self).await
    }

    /// Subtree in pre-order.
    pub async fn descendants(&self, id: NodeId, include_self: bool) -> DbResult<Vec<Node>> {
        debug!(id = %id, include_self, "Listing descendants");
        let mut conn = self.pool.acquire().await?;
        fetch_descendants(&mut conn, id, include_self).await
    }

    /// Number of nodes in the catalog.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog_nodes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Replaces the fragments of a node.
    ///
    /// A price with more than two decimals (e.g. from `Money::divide`) is
    /// rejected; round it with `Money::round_to_cents` first.
    pub async fn update_fragments(&self, id: NodeId, fragments: &Fragments) -> DbResult<()> {
        debug!(id = %id, price = %fragments.price, stock = fragments.stock, "Updating fragments");
        fragments.price.ensure_storable().map_err(CoreError::from)?;

        let result = sqlx::query(
            r#"
            UPDATE catalog_nodes SET
                price_fragment = ?1,
                stock_fragment = ?2,
                pending_customer_fragment = ?3,
                pending_supplier_fragment = ?4,
                updated_at = ?5
            WHERE id = ?6
            "#,
        )
        .bind(fragments.price.to_string())
        .bind(fragments.stock)
        .bind(fragments.pending_customer)
        .bind(fragments.pending_supplier)
        .bind(Utc::now())
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Node", id.to_string()));
        }
        Ok(())
    }

    /// Sets or clears the supplier. Blank values are stored as NULL.
    pub async fn set_supplier(&self, id: NodeId, supplier: Option<&str>) -> DbResult<()> {
        let supplier = supplier.map(str::trim).filter(|s| !s.is_empty());
        debug!(id = %id, supplier = ?supplier, "Setting supplier");

        let result = sqlx::query("UPDATE catalog_nodes SET supplier = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(supplier)
            .bind(Utc::now())
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Node", id.to_string()));
        }
        Ok(())
    }

    /// Moves a node (with its subtree) under a new parent, or to the top level.
    ///
    /// Kinds of the moved subtree and all bounds are recomputed in the same
    /// transaction.
    ///
    /// ## Errors
    /// - `Core(NodeNotFound)` for an unknown node or parent
    /// - `Core(InvalidParent)` when the new parent is inside the moved subtree
    pub async fn reparent(&self, id: NodeId, new_parent: Option<NodeId>) -> DbResult<Node> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let rows = fetch_all_rows(&mut tx).await?;
        let stored = stored_layout(&rows);
        let mut tree = CatalogTree::from_nodes(into_nodes(rows)?)?;
        tree.reparent(id, new_parent, now)?;

        sqlx::query("UPDATE catalog_nodes SET parent_id = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(new_parent.map(|p| p.0))
            .bind(now)
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        let written = write_layout(&mut tx, &tree, &stored).await?;
        let moved = require_row(&mut tx, id).await?.into_node()?;
        tx.commit().await?;

        info!(
            id = %id,
            parent = ?new_parent.map(|p| p.0),
            rows_rewritten = written,
            "Catalog node moved"
        );
        Ok(moved)
    }

    /// Loads the node's ancestors and subtree as an in-memory tree.
    pub async fn load_branch(&self, id: NodeId) -> DbResult<CatalogTree> {
        debug!(id = %id, "Loading branch");
        let mut conn = self.pool.acquire().await?;
        fetch_branch(&mut conn, id).await
    }

    /// Loads the whole catalog.
    pub async fn load_tree(&self) -> DbResult<CatalogTree> {
        let mut conn = self.pool.acquire().await?;
        let rows = fetch_all_rows(&mut conn).await?;
        Ok(CatalogTree::from_nodes(into_nodes(rows)?)?)
    }

    /// Effective price: the node's price fragment plus all its ancestors'.
    pub async fn effective_price(&self, id: NodeId) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        let tree = fetch_price_tree(&mut conn, [id]).await?;
        Ok(catalog::effective_price(&tree, id)?)
    }

    /// Every aggregate of a node.
    pub async fn summary(&self, id: NodeId) -> DbResult<NodeSummary> {
        let tree = self.load_branch(id).await?;
        Ok(catalog::summarize(&tree, id)?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
