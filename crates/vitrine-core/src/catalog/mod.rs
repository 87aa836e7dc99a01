//! # Catalog
//!
//! The product catalog as a single-parent tree of categories, products and
//! variations.
//!
//! ## Modules
//! - [`node`] - `Node`, `NodeDraft`, `NodeKind` and `derive_kind`
//! - [`tree`] - the `CatalogIndex` capability and the `CatalogTree` arena
//! - [`aggregate`] - effective price/stock/supplier and structural predicates
//! - [`variance`] - size/color style variances and the variants nodes carry

pub mod aggregate;
pub mod node;
pub mod tree;
pub mod variance;

pub use aggregate::{
    child_partition, effective_pending_customer, effective_pending_supplier, effective_price,
    effective_stock, effective_supplier, has_variations, in_stock, is_procurable, is_variation,
    landing_node, stock_available, summarize, ChildPartition, NodeSummary,
};
pub use node::{derive_kind, Fragments, Node, NodeDraft, NodeId, NodeKind};
pub use tree::{Bounds, CatalogIndex, CatalogTree, NodeEdit};
pub use variance::{Variance, VarianceId, Variances, Variant, VariantId};

/// A small shoe shop shared by the catalog and list tests.
///
/// ```text
/// Shoes (cat, USD 10, supplier Acme)
/// ├── Boots (USD 20, stock 0, supplier Boot Co)
/// └── Sneaker (USD 5, stock 5, pending from supplier 6)
///     ├── Sneaker 42 (USD 2, stock 3)
///     └── Sneaker 43 (USD 3, stock 4, pending to customer 1)
/// ```
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::currency::currency;
    use crate::money::Money;
    use chrono::Utc;

    pub const SHOES: NodeId = NodeId(1);
    pub const SNEAKER: NodeId = NodeId(2);
    pub const SNEAKER_42: NodeId = NodeId(3);
    pub const SNEAKER_43: NodeId = NodeId(4);
    pub const BOOTS: NodeId = NodeId(5);

    fn usd(amount: &str) -> Money {
        format!("USD {amount}").parse().unwrap()
    }

    pub fn shoe_tree() -> CatalogTree {
        let now = Utc::now();
        let mut tree = CatalogTree::new();
        let drafts = [
            (
                SHOES,
                NodeDraft::category("Shoes", "shoes", currency("USD").unwrap())
                    .with_price(usd("10"))
                    .with_supplier("Acme"),
            ),
            (
                SNEAKER,
                NodeDraft::product("Sneaker", "sneaker", usd("5"))
                    .under(SHOES)
                    .with_stock(5)
                    .with_pending(0, 6),
            ),
            (
                SNEAKER_42,
                NodeDraft::product("Sneaker 42", "sneaker-42", usd("2"))
                    .under(SNEAKER)
                    .with_stock(3),
            ),
            (
                SNEAKER_43,
                NodeDraft::product("Sneaker 43", "sneaker-43", usd("3"))
                    .under(SNEAKER)
                    .with_stock(4)
                    .with_pending(1, 0),
            ),
            (
                BOOTS,
                NodeDraft::product("Boots", "boots", usd("20"))
                    .under(SHOES)
                    .with_supplier("Boot Co"),
            ),
        ];
        for (id, draft) in drafts {
            tree.insert(id, draft, now).unwrap();
        }
        tree
    }
}
