//! # Catalog Aggregates
//!
//! Effective values computed from fragments, plus the structural predicates
//! the storefront needs. Nothing here is cached: every call walks the tree.
//!
//! ## Direction of Each Aggregate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   effective_price     ▲ ancestors + self  (Money sum, root first)      │
//! │   effective_supplier  ▲ nearest non-blank, self first                  │
//! │                       │                                                 │
//! │                     [node]                                              │
//! │                       │                                                 │
//! │   effective_stock     ▼ self + descendants                              │
//! │   effective_pending_* ▼ self + descendants                              │
//! │                                                                         │
//! │   stock_available = effective_stock − effective_pending_customer       │
//! │   in_stock        = stock_available > 0                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All functions take any [`CatalogIndex`], so they work the same on an
//! in-memory [`crate::catalog::CatalogTree`] and on a branch loaded from the
//! database.

use serde::Serialize;
use ts_rs::TS;

use super::node::{Node, NodeId, NodeKind};
use super::tree::CatalogIndex;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;

fn require<T: CatalogIndex + ?Sized>(tree: &T, id: NodeId) -> CoreResult<&Node> {
    tree.node(id).ok_or(CoreError::NodeNotFound(id))
}

// =============================================================================
// Price
// =============================================================================

/// Sum of the price fragments of the node and all its ancestors.
///
/// Every fragment must be in the root's currency, zero amounts included.
///
/// ## Errors
/// - `NodeNotFound` for an unknown id
/// - `CurrencyAggregationConflict` if a fragment uses another currency
pub fn effective_price<T: CatalogIndex + ?Sized>(tree: &T, id: NodeId) -> CoreResult<Money> {
    require(tree, id)?;
    let chain = tree.ancestors(id, true);
    let root = chain.first().ok_or(CoreError::NodeNotFound(id))?;
    let expected = root.fragments.price.currency();

    chain
        .iter()
        .map(|node| node.fragments.price)
        .try_fold(Money::zero(expected), |sum, fragment| {
            if fragment.currency() != expected {
                return Err(CoreError::CurrencyAggregationConflict {
                    node: id,
                    expected,
                    found: fragment.currency(),
                });
            }
            Ok(sum.add(&fragment)?)
        })
}

// =============================================================================
// Stock
// =============================================================================

fn subtree_sum<T, F>(tree: &T, id: NodeId, field: F) -> CoreResult<i64>
where
    T: CatalogIndex + ?Sized,
    F: Fn(&Node) -> i64,
{
    require(tree, id)?;
    tree.descendants(id, true)
        .into_iter()
        .try_fold(0_i64, |sum, node| {
            sum.checked_add(field(node))
                .ok_or(CoreError::StockOverflow { node: id })
        })
}

/// Stock fragments of the node and all descendants.
pub fn effective_stock<T: CatalogIndex + ?Sized>(tree: &T, id: NodeId) -> CoreResult<i64> {
    subtree_sum(tree, id, |n| n.fragments.stock)
}

/// Units sold but not yet delivered, over the subtree.
pub fn effective_pending_customer<T: CatalogIndex + ?Sized>(
    tree: &T,
    id: NodeId,
) -> CoreResult<i64> {
    subtree_sum(tree, id, |n| n.fragments.pending_customer)
}

/// Units on order from suppliers, over the subtree.
pub fn effective_pending_supplier<T: CatalogIndex + ?Sized>(
    tree: &T,
    id: NodeId,
) -> CoreResult<i64> {
    subtree_sum(tree, id, |n| n.fragments.pending_supplier)
}

/// Stock not yet promised to a customer.
pub fn stock_available<T: CatalogIndex + ?Sized>(tree: &T, id: NodeId) -> CoreResult<i64> {
    available(id, effective_stock(tree, id)?, effective_pending_customer(tree, id)?)
}

fn available(id: NodeId, stock: i64, pending_customer: i64) -> CoreResult<i64> {
    stock
        .checked_sub(pending_customer)
        .ok_or(CoreError::StockOverflow { node: id })
}

/// True if at least one unit is available.
pub fn in_stock<T: CatalogIndex + ?Sized>(tree: &T, id: NodeId) -> CoreResult<bool> {
    Ok(stock_available(tree, id)? > 0)
}

// =============================================================================
// Supplier
// =============================================================================

/// The supplier of the node, or of its nearest ancestor that has one.
pub fn effective_supplier<T: CatalogIndex + ?Sized>(
    tree: &T,
    id: NodeId,
) -> CoreResult<Option<&str>> {
    require(tree, id)?;
    Ok(tree
        .ancestors(id, true)
        .into_iter()
        .rev()
        .find_map(Node::supplier))
}

// =============================================================================
// Structural Predicates
// =============================================================================

/// True for leaf products and variations: the nodes that can go into a list.
pub fn is_procurable<T: CatalogIndex + ?Sized>(tree: &T, id: NodeId) -> CoreResult<bool> {
    let node = require(tree, id)?;
    Ok(node.kind != NodeKind::Category && tree.is_leaf(id))
}

/// True for a leaf whose parent is a product. Roots never are.
pub fn is_variation<T: CatalogIndex + ?Sized>(tree: &T, id: NodeId) -> CoreResult<bool> {
    require(tree, id)?;
    let parent_is_product = tree
        .parent(id)
        .map_or(false, |p| p.kind == NodeKind::Product);
    Ok(parent_is_product && tree.is_leaf(id))
}

/// True for a product that has children.
pub fn has_variations<T: CatalogIndex + ?Sized>(tree: &T, id: NodeId) -> CoreResult<bool> {
    let node = require(tree, id)?;
    Ok(node.kind == NodeKind::Product && !tree.is_leaf(id))
}

/// The node a storefront link should land on.
///
/// A variation is shown on its product's page; everything else on its own.
pub fn landing_node<T: CatalogIndex + ?Sized>(tree: &T, id: NodeId) -> CoreResult<&Node> {
    let node = require(tree, id)?;
    if is_variation(tree, id)? {
        if let Some(parent) = tree.parent(id) {
            return Ok(parent);
        }
    }
    Ok(node)
}

/// Children of a node grouped by kind.
#[derive(Debug, Default)]
pub struct ChildPartition<'a> {
    pub categories: Vec<&'a Node>,
    pub products: Vec<&'a Node>,
    pub variations: Vec<&'a Node>,
}

/// Splits a node's children into categories, products and variations,
/// keeping the name order within each group.
pub fn child_partition<T: CatalogIndex + ?Sized>(
    tree: &T,
    id: NodeId,
) -> CoreResult<ChildPartition<'_>> {
    require(tree, id)?;
    let mut partition = ChildPartition::default();
    for child in tree.children(id) {
        match child.kind {
            NodeKind::Category => partition.categories.push(child),
            NodeKind::Product => partition.products.push(child),
            NodeKind::Variation => partition.variations.push(child),
        }
    }
    Ok(partition)
}

// =============================================================================
// Summary
// =============================================================================

/// Every aggregate of one node, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct NodeSummary {
    pub id: NodeId,
    pub name: String,
    pub slug: String,
    pub kind: NodeKind,
    #[ts(type = "string")]
    pub price: Money,
    pub stock: i64,
    pub pending_customer: i64,
    pub pending_supplier: i64,
    pub stock_available: i64,
    pub in_stock: bool,
    pub supplier: Option<String>,
    pub procurable: bool,
    pub is_variation: bool,
    pub has_variations: bool,
}

/// Computes a [`NodeSummary`].
pub fn summarize<T: CatalogIndex + ?Sized>(tree: &T, id: NodeId) -> CoreResult<NodeSummary> {
    let node = require(tree, id)?;
    let stock = effective_stock(tree, id)?;
    let pending_customer = effective_pending_customer(tree, id)?;
    let stock_available = available(id, stock, pending_customer)?;

    Ok(NodeSummary {
        id,
        name: node.name.clone(),
        slug: node.slug.clone(),
        kind: node.kind,
        price: effective_price(tree, id)?,
        stock,
        pending_customer,
        pending_supplier: effective_pending_supplier(tree, id)?,
        stock_available,
        in_stock: stock_available > 0,
        supplier: effective_supplier(tree, id)?.map(str::to_string),
        procurable: is_procurable(tree, id)?,
        is_variation: is_variation(tree, id)?,
        has_variations: has_variations(tree, id)?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{shoe_tree, BOOTS, SHOES, SNEAKER, SNEAKER_42, SNEAKER_43};
    use crate::catalog::{CatalogTree, NodeDraft};
    use crate::currency::currency;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, currency("USD").unwrap())
    }

    #[test]
    fn test_effective_price_sums_ancestors() {
        let tree = shoe_tree();
        // 10 + 5 + 2
        assert_eq!(effective_price(&tree, SNEAKER_42).unwrap(), usd(dec!(17)));
        assert_eq!(effective_price(&tree, SNEAKER_43).unwrap(), usd(dec!(18)));
        assert_eq!(effective_price(&tree, SNEAKER).unwrap(), usd(dec!(15)));
        assert_eq!(effective_price(&tree, SHOES).unwrap(), usd(dec!(10)));
    }

    #[test]
    fn test_effective_price_unknown_node() {
        let tree = shoe_tree();
        assert!(matches!(
            effective_price(&tree, NodeId(99)),
            Err(CoreError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_effective_price_currency_conflict() {
        let mut tree = shoe_tree();
        {
            let edit = tree.node_mut(SNEAKER, Utc::now()).unwrap();
            edit.fragments.price = "EUR 5".parse().unwrap();
        }
        match effective_price(&tree, SNEAKER_42) {
            Err(CoreError::CurrencyAggregationConflict {
                node,
                expected,
                found,
            }) => {
                assert_eq!(node, SNEAKER_42);
                assert_eq!(expected.code(), "USD");
                assert_eq!(found.code(), "EUR");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_fragment_in_other_currency_conflicts() {
        let eur = currency("EUR").unwrap();
        let now = Utc::now();
        let mut tree = CatalogTree::new();
        tree.insert(NodeId(1), NodeDraft::category("Outlet", "outlet", eur), now)
            .unwrap();
        tree.insert(
            NodeId(2),
            NodeDraft::product("Scarf", "scarf", usd(dec!(12.50))).under(NodeId(1)),
            now,
        )
        .unwrap();

        match effective_price(&tree, NodeId(2)) {
            Err(CoreError::CurrencyAggregationConflict { expected, found, .. }) => {
                assert_eq!(expected.code(), "EUR");
                assert_eq!(found.code(), "USD");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        // a zero-priced root alone is fine
        let root = effective_price(&tree, NodeId(1)).unwrap();
        assert!(root.is_zero());
        assert_eq!(root.currency().code(), "EUR");
    }

    #[test]
    fn test_effective_stock_sums_descendants() {
        let tree = shoe_tree();
        // 5 + 3 + 4
        assert_eq!(effective_stock(&tree, SNEAKER).unwrap(), 12);
        assert_eq!(effective_stock(&tree, SHOES).unwrap(), 12);
        assert_eq!(effective_stock(&tree, SNEAKER_42).unwrap(), 3);
        assert_eq!(effective_pending_customer(&tree, SNEAKER).unwrap(), 1);
        assert_eq!(effective_pending_supplier(&tree, SHOES).unwrap(), 6);
    }

    #[test]
    fn test_stock_available_and_in_stock() {
        let tree = shoe_tree();
        assert_eq!(stock_available(&tree, SNEAKER).unwrap(), 11);
        assert_eq!(stock_available(&tree, SNEAKER_43).unwrap(), 3);
        assert!(in_stock(&tree, SNEAKER_42).unwrap());
        assert!(!in_stock(&tree, BOOTS).unwrap());
    }

    #[test]
    fn test_stock_overflow_is_reported() {
        let mut tree = shoe_tree();
        {
            let edit = tree.node_mut(SNEAKER_42, Utc::now()).unwrap();
            edit.fragments.stock = i64::MAX;
        }
        assert!(matches!(
            effective_stock(&tree, SNEAKER),
            Err(CoreError::StockOverflow { node }) if node == SNEAKER
        ));
        assert_eq!(effective_stock(&tree, SNEAKER_42).unwrap(), i64::MAX);

        let mut tree = shoe_tree();
        {
            let edit = tree.node_mut(SNEAKER_42, Utc::now()).unwrap();
            edit.fragments.stock = i64::MIN;
            edit.fragments.pending_customer = 1;
        }
        assert!(matches!(
            stock_available(&tree, SNEAKER_42),
            Err(CoreError::StockOverflow { .. })
        ));
        assert!(summarize(&tree, SNEAKER_42).is_err());
    }

    #[test]
    fn test_effective_supplier_inherits() {
        let tree = shoe_tree();
        assert_eq!(effective_supplier(&tree, SNEAKER_42).unwrap(), Some("Acme"));
        assert_eq!(effective_supplier(&tree, BOOTS).unwrap(), Some("Boot Co"));

        let mut tree = shoe_tree();
        {
            let edit = tree.node_mut(SHOES, Utc::now()).unwrap();
            *edit.supplier = None;
        }
        assert_eq!(effective_supplier(&tree, SNEAKER_42).unwrap(), None);
    }

    #[test]
    fn test_structural_predicates() {
        let tree = shoe_tree();

        assert!(!is_procurable(&tree, SHOES).unwrap());
        assert!(!is_procurable(&tree, SNEAKER).unwrap());
        assert!(is_procurable(&tree, SNEAKER_42).unwrap());
        assert!(is_procurable(&tree, BOOTS).unwrap());

        assert!(is_variation(&tree, SNEAKER_42).unwrap());
        assert!(!is_variation(&tree, BOOTS).unwrap());
        assert!(!is_variation(&tree, SHOES).unwrap());

        assert!(has_variations(&tree, SNEAKER).unwrap());
        assert!(!has_variations(&tree, BOOTS).unwrap());
        assert!(!has_variations(&tree, SHOES).unwrap());
    }

    #[test]
    fn test_empty_category_is_not_procurable() {
        let mut tree = CatalogTree::new();
        let usd_c = currency("USD").unwrap();
        tree.insert(NodeId(1), NodeDraft::category("Empty", "empty", usd_c), Utc::now())
            .unwrap();
        assert!(!is_procurable(&tree, NodeId(1)).unwrap());
    }

    #[test]
    fn test_landing_node() {
        let tree = shoe_tree();
        assert_eq!(landing_node(&tree, SNEAKER_42).unwrap().id, SNEAKER);
        assert_eq!(landing_node(&tree, BOOTS).unwrap().id, BOOTS);
        assert_eq!(landing_node(&tree, SHOES).unwrap().id, SHOES);
    }

    #[test]
    fn test_child_partition() {
        let tree = shoe_tree();
        let partition = child_partition(&tree, SHOES).unwrap();
        assert!(partition.categories.is_empty());
        assert_eq!(partition.products.len(), 2);

        let partition = child_partition(&tree, SNEAKER).unwrap();
        assert_eq!(partition.variations.len(), 2);
    }

    #[test]
    fn test_summarize() {
        let tree = shoe_tree();
        let summary = summarize(&tree, SNEAKER).unwrap();
        assert_eq!(summary.price, usd(dec!(15)));
        assert_eq!(summary.stock, 12);
        assert_eq!(summary.stock_available, 11);
        assert!(summary.in_stock);
        assert_eq!(summary.supplier.as_deref(), Some("Acme"));
        assert!(!summary.procurable);
        assert!(summary.has_variations);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["price"], "USD 15");
        assert_eq!(json["kind"], "product");
    }
}
