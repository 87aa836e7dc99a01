//! # Variances
//!
//! What tells the variations of one product apart: a *variance* is a
//! dimension such as "Size" or "Color", a *variant* one value of it such as
//! "42" or "red".
//!
//! ```text
//! Variance "Size" (internal "Shoe size EU")      Variance "Color"
//!   ├── Variant "42"                               ├── Variant "red" (internal "RD-01")
//!   └── Variant "43"                               └── Variant "black"
//!
//! Sneaker (product)
//!   ├── Sneaker 42 red    ◄── Size=42, Color=red
//!   └── Sneaker 43 black  ◄── Size=43, Color=black
//! ```
//!
//! A node carries at most one variant per variance. Categories carry none.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::node::{Node, NodeId, NodeKind};
use super::tree::CatalogIndex;
use crate::error::{CoreError, CoreResult};
use crate::validation::{validate_required_text, ValidationResult};

/// Longest variance or variant name accepted.
pub const MAX_VARIANCE_NAME_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarianceId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariantId(pub i64);

impl fmt::Display for VarianceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Internal name if set, otherwise the customer-facing one.
fn label<'a>(name: &'a str, internal_name: &'a str) -> &'a str {
    if internal_name.trim().is_empty() {
        name
    } else {
        internal_name
    }
}

/// A dimension products vary in, e.g. "Size".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variance {
    pub id: VarianceId,
    /// Shown to customers.
    pub name: String,
    /// Shown in back-office lists; blank if unused.
    pub internal_name: String,
    pub description: String,
}

impl Variance {
    /// The name for internal use: `internal_name`, or `name` when blank.
    pub fn label(&self) -> &str {
        label(&self.name, &self.internal_name)
    }
}

/// One value of a variance, e.g. "42".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub id: VariantId,
    pub variance: VarianceId,
    pub name: String,
    pub internal_name: String,
    pub active: bool,
}

impl Variant {
    /// The name for internal use: `internal_name`, or `name` when blank.
    pub fn label(&self) -> &str {
        label(&self.name, &self.internal_name)
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Variance definitions plus the variants assigned to catalog nodes.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use vitrine_core::catalog::{CatalogTree, NodeDraft, NodeId, Variances};
///
/// let mut tree = CatalogTree::new();
/// tree.insert(NodeId(1), NodeDraft::product("Sneaker", "sneaker", "USD 35".parse().unwrap()), Utc::now()).unwrap();
/// tree.insert(NodeId(2), NodeDraft::product("Sneaker 42", "sneaker-42", "USD 0".parse().unwrap()).under(NodeId(1)), Utc::now()).unwrap();
///
/// let mut variances = Variances::new();
/// let size = variances.add_variance("Size", "Shoe size EU").unwrap();
/// let eu_42 = variances.add_variant(size, "42", "").unwrap();
/// variances.assign(&tree, NodeId(2), eu_42).unwrap();
///
/// let found = variances.find_variation(&tree, NodeId(1), &[eu_42]).unwrap();
/// assert_eq!(found.map(|n| n.id), Some(NodeId(2)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Variances {
    variances: BTreeMap<VarianceId, Variance>,
    variants: BTreeMap<VariantId, Variant>,
    assigned: HashMap<NodeId, BTreeMap<VarianceId, VariantId>>,
    next_id: i64,
}

impl Variances {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Defines a variance. `internal_name` may be blank.
    pub fn add_variance(&mut self, name: &str, internal_name: &str) -> ValidationResult<VarianceId> {
        validate_required_text("name", name, MAX_VARIANCE_NAME_LEN)?;
        let id = VarianceId(self.next_id());
        self.variances.insert(
            id,
            Variance {
                id,
                name: name.trim().to_string(),
                internal_name: internal_name.trim().to_string(),
                description: String::new(),
            },
        );
        Ok(id)
    }

    /// Defines an active variant of `variance`.
    ///
    /// ## Errors
    /// - `VarianceNotFound` for an unknown variance
    /// - `Validation` for a blank or overlong name
    pub fn add_variant(
        &mut self,
        variance: VarianceId,
        name: &str,
        internal_name: &str,
    ) -> CoreResult<VariantId> {
        if !self.variances.contains_key(&variance) {
            return Err(CoreError::VarianceNotFound(variance));
        }
        validate_required_text("name", name, MAX_VARIANCE_NAME_LEN)?;
        let id = VariantId(self.next_id());
        self.variants.insert(
            id,
            Variant {
                id,
                variance,
                name: name.trim().to_string(),
                internal_name: internal_name.trim().to_string(),
                active: true,
            },
        );
        Ok(id)
    }

    pub fn variance(&self, id: VarianceId) -> Option<&Variance> {
        self.variances.get(&id)
    }

    pub fn variant(&self, id: VariantId) -> Option<&Variant> {
        self.variants.get(&id)
    }

    /// Sets the description of a variance.
    pub fn describe_variance(&mut self, id: VarianceId, description: &str) -> CoreResult<()> {
        let variance = self
            .variances
            .get_mut(&id)
            .ok_or(CoreError::VarianceNotFound(id))?;
        variance.description = description.to_string();
        Ok(())
    }

    /// Activates or retires a variant. Retired variants stay on the nodes
    /// that already carry them but cannot be assigned anew.
    pub fn set_active(&mut self, id: VariantId, active: bool) -> CoreResult<()> {
        let variant = self
            .variants
            .get_mut(&id)
            .ok_or(CoreError::VariantNotFound(id))?;
        variant.active = active;
        Ok(())
    }

    /// Active variants of a variance, by name.
    pub fn variants_of(&self, variance: VarianceId) -> Vec<&Variant> {
        let mut found: Vec<&Variant> = self
            .variants
            .values()
            .filter(|v| v.variance == variance && v.active)
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        found
    }

    /// Gives `node` the `variant`, replacing any other variant of the same
    /// variance.
    ///
    /// ## Errors
    /// - `NodeNotFound` if the node is not in `tree`
    /// - `VariantNotAllowed` for categories
    /// - `VariantNotFound` / `VariantInactive` for the variant
    pub fn assign<T: CatalogIndex + ?Sized>(
        &mut self,
        tree: &T,
        node: NodeId,
        variant: VariantId,
    ) -> CoreResult<()> {
        let target = tree.node(node).ok_or(CoreError::NodeNotFound(node))?;
        if target.kind == NodeKind::Category {
            return Err(CoreError::VariantNotAllowed { node });
        }
        let variant = self
            .variants
            .get(&variant)
            .ok_or(CoreError::VariantNotFound(variant))?;
        if !variant.active {
            return Err(CoreError::VariantInactive(variant.id));
        }

        self.assigned
            .entry(node)
            .or_default()
            .insert(variant.variance, variant.id);
        Ok(())
    }

    /// Drops the node's variant of `variance`, if any.
    pub fn unassign(&mut self, node: NodeId, variance: VarianceId) {
        if let Some(assigned) = self.assigned.get_mut(&node) {
            assigned.remove(&variance);
            if assigned.is_empty() {
                self.assigned.remove(&node);
            }
        }
    }

    /// Variance and variant pairs of a node, in variance order.
    pub fn variants_for(&self, node: NodeId) -> Vec<(&Variance, &Variant)> {
        let Some(assigned) = self.assigned.get(&node) else {
            return Vec::new();
        };
        assigned
            .iter()
            .filter_map(|(variance, variant)| {
                Some((self.variances.get(variance)?, self.variants.get(variant)?))
            })
            .collect()
    }

    /// The child of `product` carrying every one of `wanted`.
    ///
    /// `None` when no child matches. With several matches the first in name
    /// order wins.
    pub fn find_variation<'t, T: CatalogIndex + ?Sized>(
        &self,
        tree: &'t T,
        product: NodeId,
        wanted: &[VariantId],
    ) -> CoreResult<Option<&'t Node>> {
        tree.node(product).ok_or(CoreError::NodeNotFound(product))?;
        Ok(tree.children(product).into_iter().find(|child| {
            self.assigned.get(&child.id).map_or(false, |assigned| {
                wanted.iter().all(|w| assigned.values().any(|v| v == w))
            })
        }))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{shoe_tree, BOOTS, SHOES, SNEAKER, SNEAKER_42, SNEAKER_43};

    struct Sizes {
        variances: Variances,
        size: VarianceId,
        color: VarianceId,
        eu_42: VariantId,
        eu_43: VariantId,
        red: VariantId,
    }

    fn sizes() -> Sizes {
        let mut variances = Variances::new();
        let size = variances.add_variance("Size", "Shoe size EU").unwrap();
        let color = variances.add_variance("Color", "").unwrap();
        let eu_42 = variances.add_variant(size, "42", "").unwrap();
        let eu_43 = variances.add_variant(size, "43", "").unwrap();
        let red = variances.add_variant(color, "red", "RD-01").unwrap();
        Sizes {
            variances,
            size,
            color,
            eu_42,
            eu_43,
            red,
        }
    }

    #[test]
    fn test_label_prefers_internal_name() {
        let s = sizes();
        assert_eq!(s.variances.variance(s.size).unwrap().label(), "Shoe size EU");
        assert_eq!(s.variances.variance(s.color).unwrap().label(), "Color");
        assert_eq!(s.variances.variant(s.red).unwrap().label(), "RD-01");
        assert_eq!(s.variances.variant(s.eu_42).unwrap().label(), "42");
        assert_eq!(s.variances.variant(s.red).unwrap().name, "red");

        let mut variances = s.variances;
        variances.describe_variance(s.size, "EU sizes").unwrap();
        assert_eq!(variances.variance(s.size).unwrap().description, "EU sizes");
        assert!(variances.describe_variance(VarianceId(99), "").is_err());
    }

    #[test]
    fn test_add_variant_requires_variance() {
        let mut variances = Variances::new();
        assert!(matches!(
            variances.add_variant(VarianceId(9), "XL", ""),
            Err(CoreError::VarianceNotFound(VarianceId(9)))
        ));
        assert!(variances.add_variance("  ", "").is_err());
    }

    #[test]
    fn test_variants_of_skips_retired() {
        let mut s = sizes();
        let names: Vec<_> = s.variances.variants_of(s.size).iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["42", "43"]);

        s.variances.set_active(s.eu_43, false).unwrap();
        assert_eq!(s.variances.variants_of(s.size).len(), 1);
        assert!(s.variances.set_active(VariantId(99), true).is_err());
    }

    #[test]
    fn test_assign_and_replace() {
        let tree = shoe_tree();
        let mut s = sizes();

        s.variances.assign(&tree, SNEAKER_42, s.eu_42).unwrap();
        s.variances.assign(&tree, SNEAKER_42, s.red).unwrap();
        // same variance: replaces 42
        s.variances.assign(&tree, SNEAKER_42, s.eu_43).unwrap();

        let labels: Vec<_> = s
            .variances
            .variants_for(SNEAKER_42)
            .into_iter()
            .map(|(variance, variant)| (variance.name.as_str(), variant.name.as_str()))
            .collect();
        assert_eq!(labels, vec![("Size", "43"), ("Color", "red")]);

        s.variances.unassign(SNEAKER_42, s.color);
        assert_eq!(s.variances.variants_for(SNEAKER_42).len(), 1);
        assert!(s.variances.variants_for(BOOTS).is_empty());
    }

    #[test]
    fn test_assign_rejections() {
        let tree = shoe_tree();
        let mut s = sizes();

        assert!(matches!(
            s.variances.assign(&tree, SHOES, s.eu_42),
            Err(CoreError::VariantNotAllowed { node }) if node == SHOES
        ));
        assert!(matches!(
            s.variances.assign(&tree, NodeId(99), s.eu_42),
            Err(CoreError::NodeNotFound(_))
        ));
        assert!(matches!(
            s.variances.assign(&tree, SNEAKER_42, VariantId(99)),
            Err(CoreError::VariantNotFound(_))
        ));

        s.variances.set_active(s.eu_42, false).unwrap();
        assert!(matches!(
            s.variances.assign(&tree, SNEAKER_42, s.eu_42),
            Err(CoreError::VariantInactive(_))
        ));
    }

    #[test]
    fn test_find_variation() {
        let tree = shoe_tree();
        let mut s = sizes();
        s.variances.assign(&tree, SNEAKER_42, s.eu_42).unwrap();
        s.variances.assign(&tree, SNEAKER_42, s.red).unwrap();
        s.variances.assign(&tree, SNEAKER_43, s.eu_43).unwrap();

        let pick = |wanted: &[VariantId]| {
            s.variances
                .find_variation(&tree, SNEAKER, wanted)
                .unwrap()
                .map(|node| node.id)
        };
        assert_eq!(pick(&[s.eu_42]), Some(SNEAKER_42));
        assert_eq!(pick(&[s.eu_43]), Some(SNEAKER_43));
        assert_eq!(pick(&[s.eu_42, s.red]), Some(SNEAKER_42));
        assert_eq!(pick(&[s.eu_43, s.red]), None);

        assert!(s.variances.find_variation(&tree, NodeId(99), &[]).is_err());
    }
}
