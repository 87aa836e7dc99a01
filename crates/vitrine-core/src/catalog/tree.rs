//! # Catalog Tree
//!
//! The tree capability (`CatalogIndex`) and its in-memory arena
//! implementation (`CatalogTree`).
//!
//! ## Arena Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  nodes:    [ Shoes, Sneaker, Sneaker 42, Sneaker 43 ]   (flat Vec)      │
//! │  parents:  [ None,  0,       1,          1          ]   (indices)       │
//! │                                                                         │
//! │  Nested-set bounds, recomputed after every structural edit:            │
//! │                                                                         │
//! │    1 Shoes 8                                                            │
//! │     └── 2 Sneaker 7                                                     │
//! │          ├── 3 Sneaker 42 4                                             │
//! │          └── 5 Sneaker 43 6                                             │
//! │                                                                         │
//! │  descendants(X) = every node with X.lft < lft < X.rght                  │
//! │                 = one contiguous slice of the pre-order vector          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bounds are numbered with one counter across all roots, so ranges of
//! different trees never overlap and the storage layer can use them in SQL
//! range queries without a tree id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use ts_rs::TS;

use super::node::{derive_kind, Fragments, Node, NodeDraft, NodeId, NodeKind};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation::{validate_node_name, validate_slug};

// =============================================================================
// Tree Capability
// =============================================================================

/// Read access to a catalog tree.
///
/// Every aggregate in [`crate::catalog::aggregate`] is written against this
/// trait. Unknown ids yield `None` or an empty list; aggregates turn that
/// into `CoreError::NodeNotFound`.
pub trait CatalogIndex {
    /// Looks up a node.
    fn node(&self, id: NodeId) -> Option<&Node>;

    /// The node's parent, `None` for roots.
    fn parent(&self, id: NodeId) -> Option<&Node>;

    /// Direct children, ordered by name then id.
    fn children(&self, id: NodeId) -> Vec<&Node>;

    /// The ancestor chain in root → node order.
    fn ancestors(&self, id: NodeId, include_self: bool) -> Vec<&Node>;

    /// The whole subtree in pre-order.
    fn descendants(&self, id: NodeId, include_self: bool) -> Vec<&Node>;

    /// True if the node has no children.
    fn is_leaf(&self, id: NodeId) -> bool {
        self.children(id).is_empty()
    }
}

// =============================================================================
// Nested-Set Bounds
// =============================================================================

/// Position of a node in the nested-set numbering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Bounds {
    pub lft: i64,
    pub rght: i64,
    /// Depth, 0 for roots.
    pub level: i64,
}

impl Bounds {
    /// True if `other` lies inside (or is) this node's subtree.
    #[inline]
    pub fn contains(&self, other: &Bounds) -> bool {
        self.lft <= other.lft && other.rght <= self.rght
    }

    /// Number of nodes strictly below this one.
    #[inline]
    pub fn descendant_count(&self) -> usize {
        ((self.rght - self.lft - 1) / 2) as usize
    }
}

// =============================================================================
// Node Edit Handle
// =============================================================================

/// Mutable view of the fields that may change without reshaping the tree.
///
/// Kind, parent, name and slug are not reachable from here: they change
/// through [`CatalogTree::reparent`] or by re-inserting.
#[derive(Debug)]
pub struct NodeEdit<'a> {
    pub fragments: &'a mut Fragments,
    pub supplier: &'a mut Option<String>,
    pub description: &'a mut String,
    pub active: &'a mut bool,
}

// =============================================================================
// Arena Tree
// =============================================================================

/// In-memory catalog tree.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use vitrine_core::catalog::{CatalogIndex, CatalogTree, NodeDraft, NodeId, NodeKind};
/// use vitrine_core::currency::currency;
///
/// let usd = currency("USD").unwrap();
/// let now = Utc::now();
/// let mut tree = CatalogTree::new();
/// tree.insert(NodeId(1), NodeDraft::category("Shoes", "shoes", usd), now).unwrap();
/// tree.insert(
///     NodeId(2),
///     NodeDraft::product("Sneaker", "sneaker", "USD 5".parse().unwrap()).under(NodeId(1)),
///     now,
/// ).unwrap();
///
/// assert_eq!(tree.node(NodeId(2)).unwrap().kind, NodeKind::Product);
/// assert_eq!(tree.descendants(NodeId(1), true).len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CatalogTree {
    nodes: Vec<Node>,
    layout: Layout,
}

/// Everything derived from `nodes`; rebuilt wholesale after edits.
#[derive(Debug, Clone, Default)]
struct Layout {
    index: HashMap<NodeId, usize>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    bounds: Vec<Bounds>,
    preorder: Vec<usize>,
    position: Vec<usize>,
    kinds: Vec<NodeKind>,
}

impl CatalogTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from stored nodes.
    ///
    /// Kinds are re-derived top-down; a stored `Category` counts as a request
    /// to be a category.
    ///
    /// ## Errors
    /// - `NodeNotFound` if a node references a parent that is not in `nodes`
    /// - `InvalidParent` if the parent links form a cycle
    /// - `Validation` for duplicate ids
    pub fn from_nodes(nodes: Vec<Node>) -> CoreResult<Self> {
        let layout = Layout::compute(&nodes)?;
        let mut tree = Self { nodes, layout };
        tree.apply_kinds();
        Ok(tree)
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.layout.index.contains_key(&id)
    }

    /// Root nodes, ordered by name then id.
    pub fn roots(&self) -> Vec<&Node> {
        self.layout.roots.iter().map(|&i| &self.nodes[i]).collect()
    }

    /// All nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
        self.layout.preorder.iter().map(move |&i| &self.nodes[i])
    }

    /// Nested-set bounds of a node.
    pub fn bounds(&self, id: NodeId) -> Option<Bounds> {
        self.layout.index.get(&id).map(|&i| self.layout.bounds[i])
    }

    /// Finds a node by its slug.
    pub fn find_by_slug(&self, slug: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.slug == slug)
    }

    /// Adds a node.
    ///
    /// ## Errors
    /// - `Validation` for a bad name or slug, or an id/slug already in use
    /// - `NodeNotFound` if the draft's parent is not in the tree
    pub fn insert(&mut self, id: NodeId, draft: NodeDraft, at: DateTime<Utc>) -> CoreResult<&Node> {
        validate_node_name(&draft.name)?;
        validate_slug(&draft.slug)?;

        if self.contains(id) {
            return Err(ValidationError::InvalidFormat {
                field: "id".to_string(),
                reason: format!("node {id} already exists"),
            }
            .into());
        }
        if let Some(parent) = draft.parent {
            if !self.contains(parent) {
                return Err(CoreError::NodeNotFound(parent));
            }
        }
        if self.find_by_slug(draft.slug.trim()).is_some() {
            return Err(ValidationError::InvalidFormat {
                field: "slug".to_string(),
                reason: "already in use".to_string(),
            }
            .into());
        }

        self.nodes.push(Node::from_draft(id, draft, at));
        if let Err(err) = self.relayout() {
            self.nodes.pop();
            return Err(err);
        }
        self.node(id).ok_or(CoreError::NodeNotFound(id))
    }

    /// Moves a node (with its subtree) under a new parent, or to the root
    /// level with `None`.
    ///
    /// Kinds of the moved node and all its descendants are re-derived.
    ///
    /// ## Errors
    /// - `NodeNotFound` for an unknown node or parent
    /// - `InvalidParent` if `new_parent` is the node itself or one of its
    ///   descendants
    pub fn reparent(
        &mut self,
        id: NodeId,
        new_parent: Option<NodeId>,
        at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let idx = self.index_of(id)?;
        if let Some(parent) = new_parent {
            let parent_idx = self.index_of(parent)?;
            if self.layout.bounds[idx].contains(&self.layout.bounds[parent_idx]) {
                return Err(CoreError::InvalidParent { node: id, parent });
            }
        }

        let old_parent = std::mem::replace(&mut self.nodes[idx].parent, new_parent);
        if let Err(err) = self.relayout() {
            self.nodes[idx].parent = old_parent;
            return Err(err);
        }
        self.nodes[idx].updated_at = at;
        Ok(())
    }

    /// Removes a node without children and returns it.
    pub fn remove_leaf(&mut self, id: NodeId) -> CoreResult<Node> {
        let idx = self.index_of(id)?;
        if !self.layout.children[idx].is_empty() {
            return Err(CoreError::HasChildren(id));
        }

        let removed = self.nodes.remove(idx);
        self.relayout()?;
        Ok(removed)
    }

    /// Edit handle for fragments, supplier, description and active flag.
    pub fn node_mut(&mut self, id: NodeId, at: DateTime<Utc>) -> CoreResult<NodeEdit<'_>> {
        let idx = self.index_of(id)?;
        let node = &mut self.nodes[idx];
        node.updated_at = at;
        Ok(NodeEdit {
            fragments: &mut node.fragments,
            supplier: &mut node.supplier,
            description: &mut node.description,
            active: &mut node.active,
        })
    }

    fn index_of(&self, id: NodeId) -> CoreResult<usize> {
        self.layout
            .index
            .get(&id)
            .copied()
            .ok_or(CoreError::NodeNotFound(id))
    }

    fn relayout(&mut self) -> CoreResult<()> {
        self.layout = Layout::compute(&self.nodes)?;
        self.apply_kinds();
        Ok(())
    }

    fn apply_kinds(&mut self) {
        for (node, kind) in self.nodes.iter_mut().zip(&self.layout.kinds) {
            node.kind = *kind;
        }
    }
}

impl CatalogIndex for CatalogTree {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.layout.index.get(&id).map(|&i| &self.nodes[i])
    }

    fn parent(&self, id: NodeId) -> Option<&Node> {
        let idx = *self.layout.index.get(&id)?;
        self.layout.parents[idx].map(|p| &self.nodes[p])
    }

    fn children(&self, id: NodeId) -> Vec<&Node> {
        match self.layout.index.get(&id) {
            Some(&idx) => self.layout.children[idx]
                .iter()
                .map(|&c| &self.nodes[c])
                .collect(),
            None => Vec::new(),
        }
    }

    fn ancestors(&self, id: NodeId, include_self: bool) -> Vec<&Node> {
        let Some(&start) = self.layout.index.get(&id) else {
            return Vec::new();
        };

        let mut chain = Vec::with_capacity(self.layout.bounds[start].level as usize + 1);
        let mut cursor = if include_self {
            Some(start)
        } else {
            self.layout.parents[start]
        };
        while let Some(idx) = cursor {
            chain.push(&self.nodes[idx]);
            cursor = self.layout.parents[idx];
        }
        chain.reverse();
        chain
    }

    fn descendants(&self, id: NodeId, include_self: bool) -> Vec<&Node> {
        let Some(&idx) = self.layout.index.get(&id) else {
            return Vec::new();
        };

        let pos = self.layout.position[idx];
        let end = pos + 1 + self.layout.bounds[idx].descendant_count();
        let start = if include_self { pos } else { pos + 1 };
        self.layout.preorder[start..end]
            .iter()
            .map(|&i| &self.nodes[i])
            .collect()
    }

    fn is_leaf(&self, id: NodeId) -> bool {
        self.layout
            .index
            .get(&id)
            .map_or(true, |&idx| self.layout.children[idx].is_empty())
    }
}

// =============================================================================
// Layout Computation
// =============================================================================

enum Visit {
    Enter(usize, i64),
    Exit(usize),
}

fn by_name(nodes: &[Node], a: usize, b: usize) -> Ordering {
    (nodes[a].name.as_str(), nodes[a].id).cmp(&(nodes[b].name.as_str(), nodes[b].id))
}

impl Layout {
    fn compute(nodes: &[Node]) -> CoreResult<Layout> {
        let count = nodes.len();

        let mut index = HashMap::with_capacity(count);
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id, i).is_some() {
                return Err(ValidationError::InvalidFormat {
                    field: "id".to_string(),
                    reason: format!("node {} appears twice", node.id),
                }
                .into());
            }
        }

        let mut parents = Vec::with_capacity(count);
        let mut children = vec![Vec::new(); count];
        let mut roots = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            match node.parent {
                None => {
                    parents.push(None);
                    roots.push(i);
                }
                Some(parent_id) => {
                    let parent = *index
                        .get(&parent_id)
                        .ok_or(CoreError::NodeNotFound(parent_id))?;
                    parents.push(Some(parent));
                    children[parent].push(i);
                }
            }
        }
        roots.sort_by(|&a, &b| by_name(nodes, a, b));
        for siblings in &mut children {
            siblings.sort_by(|&a, &b| by_name(nodes, a, b));
        }

        // Iterative DFS: numbers bounds, records pre-order, derives kinds
        // (a parent is always entered before its children).
        let mut bounds = vec![Bounds::default(); count];
        let mut kinds = vec![NodeKind::Product; count];
        let mut preorder = Vec::with_capacity(count);
        let mut position = vec![usize::MAX; count];
        let mut counter = 0_i64;

        let mut stack: Vec<Visit> = roots.iter().rev().map(|&r| Visit::Enter(r, 0)).collect();
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(i, level) => {
                    counter += 1;
                    bounds[i].lft = counter;
                    bounds[i].level = level;
                    let kind = derive_kind(
                        nodes[i].kind == NodeKind::Category,
                        parents[i].map(|p| kinds[p]),
                    );
                    kinds[i] = kind;
                    position[i] = preorder.len();
                    preorder.push(i);

                    stack.push(Visit::Exit(i));
                    for &child in children[i].iter().rev() {
                        stack.push(Visit::Enter(child, level + 1));
                    }
                }
                Visit::Exit(i) => {
                    counter += 1;
                    bounds[i].rght = counter;
                }
            }
        }

        // Anything not reached from a root sits on a parent cycle.
        if let Some(stray) = position.iter().position(|&p| p == usize::MAX) {
            let node = &nodes[stray];
            return Err(CoreError::InvalidParent {
                node: node.id,
                parent: node.parent.unwrap_or(node.id),
            });
        }

        Ok(Layout {
            index,
            parents,
            children,
            roots,
            bounds,
            preorder,
            position,
            kinds,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{shoe_tree, BOOTS, SHOES, SNEAKER, SNEAKER_42, SNEAKER_43};
    use crate::currency::currency;

    fn ids(nodes: Vec<&Node>) -> Vec<NodeId> {
        nodes.into_iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_kinds_are_derived() {
        let tree = shoe_tree();
        assert_eq!(tree.node(SHOES).unwrap().kind, NodeKind::Category);
        assert_eq!(tree.node(SNEAKER).unwrap().kind, NodeKind::Product);
        assert_eq!(tree.node(SNEAKER_42).unwrap().kind, NodeKind::Variation);
        assert_eq!(tree.node(BOOTS).unwrap().kind, NodeKind::Product);
    }

    #[test]
    fn test_ancestors_root_to_leaf() {
        let tree = shoe_tree();
        assert_eq!(ids(tree.ancestors(SNEAKER_42, true)), vec![SHOES, SNEAKER, SNEAKER_42]);
        assert_eq!(ids(tree.ancestors(SNEAKER_42, false)), vec![SHOES, SNEAKER]);
        assert!(tree.ancestors(SHOES, false).is_empty());
        assert!(tree.ancestors(NodeId(99), true).is_empty());
    }

    #[test]
    fn test_descendants_preorder_by_name() {
        let tree = shoe_tree();
        // Boots sorts before Sneaker
        assert_eq!(
            ids(tree.descendants(SHOES, true)),
            vec![SHOES, BOOTS, SNEAKER, SNEAKER_42, SNEAKER_43]
        );
        assert_eq!(ids(tree.descendants(SNEAKER, false)), vec![SNEAKER_42, SNEAKER_43]);
        assert!(tree.descendants(SNEAKER_43, false).is_empty());
    }

    #[test]
    fn test_bounds() {
        let tree = shoe_tree();
        assert_eq!(tree.bounds(SHOES), Some(Bounds { lft: 1, rght: 10, level: 0 }));
        assert_eq!(tree.bounds(BOOTS), Some(Bounds { lft: 2, rght: 3, level: 1 }));
        assert_eq!(tree.bounds(SNEAKER), Some(Bounds { lft: 4, rght: 9, level: 1 }));
        assert_eq!(tree.bounds(SNEAKER_42), Some(Bounds { lft: 5, rght: 6, level: 2 }));
        assert_eq!(tree.bounds(SNEAKER).unwrap().descendant_count(), 2);
    }

    #[test]
    fn test_children_and_parent() {
        let tree = shoe_tree();
        assert_eq!(ids(tree.children(SHOES)), vec![BOOTS, SNEAKER]);
        assert_eq!(tree.parent(SNEAKER).unwrap().id, SHOES);
        assert!(tree.parent(SHOES).is_none());
        assert!(tree.is_leaf(BOOTS));
        assert!(!tree.is_leaf(SNEAKER));
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut tree = shoe_tree();
        let now = Utc::now();
        assert!(matches!(
            tree.reparent(SHOES, Some(SNEAKER_42), now),
            Err(CoreError::InvalidParent { .. })
        ));
        assert!(matches!(
            tree.reparent(SNEAKER, Some(SNEAKER), now),
            Err(CoreError::InvalidParent { .. })
        ));
        assert!(matches!(
            tree.reparent(SNEAKER, Some(NodeId(99)), now),
            Err(CoreError::NodeNotFound(_))
        ));
        // unchanged
        assert_eq!(tree.parent(SNEAKER).unwrap().id, SHOES);
    }

    #[test]
    fn test_reparent_rederives_kinds() {
        let mut tree = shoe_tree();
        let now = Utc::now();

        // Boots moved under a product becomes a variation
        tree.reparent(BOOTS, Some(SNEAKER), now).unwrap();
        assert_eq!(tree.node(BOOTS).unwrap().kind, NodeKind::Variation);
        assert_eq!(ids(tree.children(SNEAKER)), vec![BOOTS, SNEAKER_42, SNEAKER_43]);

        // Sneaker moved to the root stays a product, its children stay variations
        tree.reparent(SNEAKER, None, now).unwrap();
        assert_eq!(tree.node(SNEAKER).unwrap().kind, NodeKind::Product);
        assert_eq!(tree.node(SNEAKER_42).unwrap().kind, NodeKind::Variation);
        assert_eq!(ids(tree.roots()), vec![SHOES, SNEAKER]);
        assert_eq!(tree.bounds(SNEAKER).unwrap().level, 0);
    }

    #[test]
    fn test_insert_validates() {
        let mut tree = shoe_tree();
        let now = Utc::now();
        let usd = currency("USD").unwrap();

        let orphan = NodeDraft::category("Hats", "hats", usd).under(NodeId(99));
        assert!(matches!(tree.insert(NodeId(10), orphan, now), Err(CoreError::NodeNotFound(_))));

        let dup_slug = NodeDraft::category("Shoes 2", "shoes", usd);
        assert!(matches!(tree.insert(NodeId(10), dup_slug, now), Err(CoreError::Validation(_))));

        let dup_id = NodeDraft::category("Hats", "hats", usd);
        assert!(matches!(tree.insert(SHOES, dup_id, now), Err(CoreError::Validation(_))));

        let bad_slug = NodeDraft::category("Hats", "Hats & Caps", usd);
        assert!(matches!(tree.insert(NodeId(10), bad_slug, now), Err(CoreError::Validation(_))));

        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_category_requested_under_product_is_variation() {
        let mut tree = shoe_tree();
        let usd = currency("USD").unwrap();
        let draft = NodeDraft::category("Laces", "laces", usd).under(SNEAKER);
        let node = tree.insert(NodeId(10), draft, Utc::now()).unwrap();
        assert_eq!(node.kind, NodeKind::Variation);
    }

    #[test]
    fn test_root_product() {
        let mut tree = CatalogTree::new();
        let draft = NodeDraft::product("Gift Card", "gift-card", "USD 25".parse().unwrap());
        let node = tree.insert(NodeId(1), draft, Utc::now()).unwrap();
        assert_eq!(node.kind, NodeKind::Product);
    }

    #[test]
    fn test_remove_leaf() {
        let mut tree = shoe_tree();
        assert!(matches!(tree.remove_leaf(SNEAKER), Err(CoreError::HasChildren(_))));

        let removed = tree.remove_leaf(SNEAKER_43).unwrap();
        assert_eq!(removed.id, SNEAKER_43);
        assert!(!tree.contains(SNEAKER_43));
        assert_eq!(ids(tree.descendants(SNEAKER, true)), vec![SNEAKER, SNEAKER_42]);
        assert_eq!(tree.bounds(SHOES).unwrap().rght, 8);
    }

    #[test]
    fn test_node_mut_edits_fragments() {
        let mut tree = shoe_tree();
        {
            let edit = tree.node_mut(BOOTS, Utc::now()).unwrap();
            edit.fragments.stock = 40;
            *edit.supplier = Some("Boot Co".to_string());
        }
        let boots = tree.node(BOOTS).unwrap();
        assert_eq!(boots.fragments.stock, 40);
        assert_eq!(boots.supplier(), Some("Boot Co"));
        assert!(tree.node_mut(NodeId(99), Utc::now()).is_err());
    }

    #[test]
    fn test_from_nodes_normalizes_and_rejects() {
        let tree = shoe_tree();
        let mut nodes: Vec<Node> = tree.iter().cloned().collect();

        // a stale kind is corrected on load
        nodes[1].kind = NodeKind::Variation;
        let reloaded = CatalogTree::from_nodes(nodes.clone()).unwrap();
        assert_eq!(reloaded.node(nodes[1].id).unwrap().kind, NodeKind::Product);

        let mut orphaned = nodes.clone();
        orphaned.retain(|n| n.id != SHOES);
        assert!(matches!(
            CatalogTree::from_nodes(orphaned),
            Err(CoreError::NodeNotFound(_))
        ));

        let mut cyclic = nodes;
        for node in &mut cyclic {
            if node.id == SHOES {
                node.parent = Some(SNEAKER_42);
            }
        }
        assert!(matches!(
            CatalogTree::from_nodes(cyclic),
            Err(CoreError::InvalidParent { .. })
        ));
    }

    #[test]
    fn test_find_by_slug() {
        let tree = shoe_tree();
        assert_eq!(tree.find_by_slug("sneaker-42").unwrap().id, SNEAKER_42);
        assert!(tree.find_by_slug("nope").is_none());
    }
}
