//! # Catalog Nodes
//!
//! The single record type of the catalog tree and its kind derivation.
//!
//! ## Fragments
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every node carries PARTIAL values ("fragments"). Aggregates are       │
//! │  computed on read by summing fragments over the tree:                  │
//! │                                                                         │
//! │    price    ── summed UP the ancestor chain   (root → node)            │
//! │    stock    ── summed DOWN the subtree        (node → leaves)          │
//! │    pending  ── summed DOWN the subtree                                  │
//! │    supplier ── nearest non-blank walking UP                             │
//! │                                                                         │
//! │  Shoes (USD 10) ─► Sneaker (USD 5) ─► Sneaker 42 (USD 2)               │
//! │                                        effective price = USD 17        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::currency::Currency;
use crate::money::Money;

// =============================================================================
// Node Identity
// =============================================================================

/// Identifier of a catalog node (the database row id).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
#[ts(export)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self {
        NodeId(id)
    }
}

// =============================================================================
// Node Kind
// =============================================================================

/// What a node is, derived from its position in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum NodeKind {
    /// Groups products, never purchased directly.
    Category,
    /// A purchasable item, or the parent of variations.
    Product,
    /// A concrete variant (size, color) of its parent product.
    Variation,
}

/// Computes the kind of a node from its parent's kind.
///
/// ## Rules (first match wins)
/// ```text
/// parent is a Product          → Variation
/// caller asked for a Category  → Category
/// otherwise                    → Product
/// ```
///
/// A root has no parent kind, so it is a category only when asked to be.
///
/// ## Example
/// ```rust
/// use vitrine_core::catalog::{derive_kind, NodeKind};
///
/// assert_eq!(derive_kind(true, Some(NodeKind::Product)), NodeKind::Variation);
/// assert_eq!(derive_kind(true, None), NodeKind::Category);
/// assert_eq!(derive_kind(false, Some(NodeKind::Category)), NodeKind::Product);
/// ```
pub fn derive_kind(requested_category: bool, parent_kind: Option<NodeKind>) -> NodeKind {
    match parent_kind {
        Some(NodeKind::Product) => NodeKind::Variation,
        _ if requested_category => NodeKind::Category,
        _ => NodeKind::Product,
    }
}

// =============================================================================
// Fragments
// =============================================================================

/// The per-node partial values that aggregates are summed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Fragments {
    /// Added to every descendant's price.
    #[ts(type = "string")]
    pub price: Money,

    /// Units held for this node itself.
    pub stock: i64,

    /// Units sold but not yet shipped to customers.
    pub pending_customer: i64,

    /// Units ordered from the supplier but not yet received.
    pub pending_supplier: i64,
}

impl Fragments {
    /// All-zero fragments in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::priced(Money::zero(currency))
    }

    /// Fragments carrying only a price.
    pub fn priced(price: Money) -> Self {
        Self {
            price,
            stock: 0,
            pending_customer: 0,
            pending_supplier: 0,
        }
    }
}

// =============================================================================
// Node
// =============================================================================

/// A category, product or variation.
///
/// `kind` is recomputed by [`crate::catalog::CatalogTree`] whenever the node
/// enters the tree or the tree's shape changes. A stored `Category` kind is
/// read back as the request to stay a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub active: bool,
    pub kind: NodeKind,
    pub fragments: Fragments,
    pub supplier: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Materializes a draft. The kind is provisional until the node is
    /// placed in a tree.
    pub fn from_draft(id: NodeId, draft: NodeDraft, at: DateTime<Utc>) -> Self {
        let kind = if draft.as_category {
            NodeKind::Category
        } else {
            NodeKind::Product
        };
        Self {
            id,
            parent: draft.parent,
            name: draft.name.trim().to_string(),
            slug: draft.slug.trim().to_string(),
            description: draft.description,
            active: draft.active,
            kind,
            fragments: draft.fragments,
            supplier: draft.supplier,
            created_at: at,
            updated_at: at,
        }
    }

    /// Supplier with blank values treated as absent.
    pub fn supplier(&self) -> Option<&str> {
        self.supplier
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    #[inline]
    pub fn is_category(&self) -> bool {
        self.kind == NodeKind::Category
    }
}

// =============================================================================
// Node Draft
// =============================================================================

/// Input for creating a node.
///
/// ## Example
/// ```rust
/// use vitrine_core::catalog::{NodeDraft, NodeId};
///
/// let price = "USD 5.00".parse().unwrap();
/// let draft = NodeDraft::product("Sneaker", "sneaker", price)
///     .under(NodeId(1))
///     .with_stock(12)
///     .with_supplier("Acme");
/// assert!(!draft.as_category);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NodeDraft {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub parent: Option<NodeId>,
    /// Ask for a category. Ignored under a product (the node becomes a variation).
    #[serde(default)]
    pub as_category: bool,
    pub fragments: Fragments,
    pub supplier: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl NodeDraft {
    /// A category draft with a zero price fragment.
    pub fn category(name: impl Into<String>, slug: impl Into<String>, currency: Currency) -> Self {
        Self::new(name, slug, true, Fragments::zero(currency))
    }

    /// A product draft with the given price fragment.
    pub fn product(name: impl Into<String>, slug: impl Into<String>, price: Money) -> Self {
        Self::new(name, slug, false, Fragments::priced(price))
    }

    fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        as_category: bool,
        fragments: Fragments,
    ) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            description: String::new(),
            parent: None,
            as_category,
            fragments,
            supplier: None,
            active: true,
        }
    }

    pub fn under(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.fragments.price = price;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.fragments.stock = stock;
        self
    }

    pub fn with_pending(mut self, to_customer: i64, from_supplier: i64) -> Self {
        self.fragments.pending_customer = to_customer;
        self.fragments.pending_supplier = from_supplier;
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::currency;

    #[test]
    fn test_derive_kind_table() {
        use NodeKind::*;
        for requested in [true, false] {
            assert_eq!(derive_kind(requested, Some(Product)), Variation);
        }
        assert_eq!(derive_kind(true, Some(Category)), Category);
        assert_eq!(derive_kind(false, Some(Category)), Product);
        assert_eq!(derive_kind(true, Some(Variation)), Category);
        assert_eq!(derive_kind(false, Some(Variation)), Product);
        assert_eq!(derive_kind(true, None), Category);
        assert_eq!(derive_kind(false, None), Product);
    }

    #[test]
    fn test_supplier_blank_is_absent() {
        let usd = currency("USD").unwrap();
        let mut node = Node::from_draft(
            NodeId(1),
            NodeDraft::category("Shoes", "shoes", usd).with_supplier("  "),
            Utc::now(),
        );
        assert_eq!(node.supplier(), None);

        node.supplier = Some(" Acme ".to_string());
        assert_eq!(node.supplier(), Some("Acme"));
    }

    #[test]
    fn test_from_draft_provisional_kind() {
        let usd = currency("USD").unwrap();
        let now = Utc::now();
        let category = Node::from_draft(NodeId(1), NodeDraft::category(" Shoes ", "shoes", usd), now);
        assert_eq!(category.kind, NodeKind::Category);
        assert_eq!(category.name, "Shoes");

        let product = Node::from_draft(
            NodeId(2),
            NodeDraft::product("Sneaker", "sneaker", "USD 5".parse().unwrap()),
            now,
        );
        assert_eq!(product.kind, NodeKind::Product);
        assert_eq!(product.created_at, now);
    }

    #[test]
    fn test_node_id_serializes_as_number() {
        assert_eq!(serde_json::to_string(&NodeId(42)).unwrap(), "42");
        assert_eq!(NodeId(42).to_string(), "42");
    }
}
