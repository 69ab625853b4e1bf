//! B+Tree node representation.
//!
//! A [`Node`] is a tagged union over the two node kinds:
//! - [`InternalNode`] - separator keys routing to owned children
//! - [`LeafNode`] - sorted entries plus the leaf-chain links
//!
//! Operations switch on the tag explicitly; there is no virtual dispatch.
//! All cross-node links ([`NodeId`]) are non-owning indices into the tree's
//! arena - ownership of the node graph rests with the arena alone.

use crate::common::config::{max_keys, min_keys};
use crate::common::NodeId;
use crate::index::btree::entry::Entry;

/// A tree node: either routing (internal) or storing (leaf).
pub(crate) enum Node<K, V> {
    Internal(InternalNode<K>),
    Leaf(LeafNode<K, V>),
}

/// Routing node: `keys.len() + 1` children, where child `i` holds all keys
/// `k` with `keys[i-1] <= k < keys[i]` (unbounded at the edges).
///
/// Separator keys equal the first key of the right subtree they separate at
/// the moment of the split; deletions may leave a separator smaller than the
/// subtree's current first key, which keeps routing correct and is accepted
/// by the invariant checker.
pub(crate) struct InternalNode<K> {
    /// Non-owning back-reference; `None` only for the root.
    pub(crate) parent: Option<NodeId>,
    /// Separator keys, strictly ascending.
    pub(crate) keys: Vec<K>,
    /// Owned children, `keys.len() + 1` of them.
    pub(crate) children: Vec<NodeId>,
}

/// Storing node: entries sorted ascending by key, linked into the leaf chain.
pub(crate) struct LeafNode<K, V> {
    /// Non-owning back-reference; `None` only for the root.
    pub(crate) parent: Option<NodeId>,
    /// Previous leaf in key order.
    pub(crate) prev: Option<NodeId>,
    /// Next leaf in key order.
    pub(crate) next: Option<NodeId>,
    /// Sorted entries.
    pub(crate) entries: Vec<Entry<K, V>>,
}

/// Result of searching a leaf for a key.
pub(crate) enum LeafSearch {
    /// Exact match at this entry index.
    Found(usize),
    /// No match; the key would be inserted at this index.
    Missing(usize),
}

impl<K, V> Node<K, V> {
    pub(crate) fn new_leaf() -> Self {
        Node::Leaf(LeafNode::new())
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Number of keys in this node (entries for a leaf, separators for an
    /// internal node).
    pub(crate) fn key_count(&self) -> usize {
        match self {
            Node::Internal(node) => node.keys.len(),
            Node::Leaf(node) => node.entries.len(),
        }
    }

    pub(crate) fn parent(&self) -> Option<NodeId> {
        match self {
            Node::Internal(node) => node.parent,
            Node::Leaf(node) => node.parent,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        match self {
            Node::Internal(node) => node.parent = parent,
            Node::Leaf(node) => node.parent = parent,
        }
    }

    /// A non-root node below minimum occupancy needs rebalancing.
    pub(crate) fn is_underfull(&self, order: usize) -> bool {
        self.key_count() < min_keys(order)
    }

    /// A node above minimum occupancy can lend to a sibling.
    pub(crate) fn has_surplus(&self, order: usize) -> bool {
        self.key_count() > min_keys(order)
    }

    pub(crate) fn as_leaf(&self) -> &LeafNode<K, V> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }

    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode<K, V> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }

    pub(crate) fn as_internal(&self) -> &InternalNode<K> {
        match self {
            Node::Internal(node) => node,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    pub(crate) fn as_internal_mut(&mut self) -> &mut InternalNode<K> {
        match self {
            Node::Internal(node) => node,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }
}

impl<K: Ord> InternalNode<K> {
    pub(crate) fn new() -> Self {
        Self {
            parent: None,
            keys: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Index of the child subtree that may contain `key`.
    ///
    /// A key equal to a separator routes right: separators are drawn from
    /// the first key of their right subtree.
    #[inline]
    pub(crate) fn route(&self, key: &K) -> usize {
        match self.keys.binary_search(key) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// Position of a direct child within `children`.
    ///
    /// # Panics
    /// Panics if `child` is not a child of this node - the tree's parent
    /// links would be corrupt.
    pub(crate) fn position_of(&self, child: NodeId) -> usize {
        self.children
            .iter()
            .position(|&c| c == child)
            .expect("child not found under its recorded parent")
    }

    /// Insert `key` and the child to its right at separator position `idx`.
    pub(crate) fn insert_separator(&mut self, idx: usize, key: K, right_child: NodeId) {
        self.keys.insert(idx, key);
        self.children.insert(idx + 1, right_child);
    }

    /// Remove separator `idx` and the child to its right.
    pub(crate) fn remove_separator(&mut self, idx: usize) -> (K, NodeId) {
        let key = self.keys.remove(idx);
        let child = self.children.remove(idx + 1);
        (key, child)
    }

    pub(crate) fn is_overfull(&self, order: usize) -> bool {
        self.keys.len() > max_keys(order)
    }

    /// Split an overfull node, promoting (removing) the middle key.
    ///
    /// Returns `(promoted, right)` where `right` holds the upper keys and
    /// children. The split point gives the tie to the right half, so split
    /// results are deterministic across runs. The caller re-parents the
    /// moved children and wires `right` into the tree.
    pub(crate) fn split(&mut self) -> (K, InternalNode<K>) {
        // With `len` keys, the left half keeps (len-1)/2 of them.
        let mid = (self.keys.len() - 1) / 2;

        let right_keys = self.keys.split_off(mid + 1);
        let right_children = self.children.split_off(mid + 1);
        let promoted = self.keys.pop().expect("split of node with no keys");

        let right = InternalNode {
            parent: None,
            keys: right_keys,
            children: right_children,
        };

        (promoted, right)
    }
}

impl<K, V> LeafNode<K, V> {
    // No `Ord` bound: construction orders nothing.
    pub(crate) fn new() -> Self {
        Self {
            parent: None,
            prev: None,
            next: None,
            entries: Vec::new(),
        }
    }
}

impl<K: Ord, V> LeafNode<K, V> {
    /// Binary-search the sorted entries for `key`.
    #[inline]
    pub(crate) fn search(&self, key: &K) -> LeafSearch {
        match self.entries.binary_search_by(|e| e.key().cmp(key)) {
            Ok(idx) => LeafSearch::Found(idx),
            Err(idx) => LeafSearch::Missing(idx),
        }
    }

    /// Index of the first entry with key >= `key`.
    #[inline]
    pub(crate) fn lower_bound(&self, key: &K) -> usize {
        self.entries.partition_point(|e| e.key() < key)
    }

    /// Index of the first entry with key > `key`.
    #[inline]
    pub(crate) fn upper_bound(&self, key: &K) -> usize {
        self.entries.partition_point(|e| e.key() <= key)
    }

    pub(crate) fn is_overfull(&self, order: usize) -> bool {
        self.entries.len() > max_keys(order)
    }

    /// Split an overfull leaf, moving the upper half of its entries right.
    ///
    /// Returns `(separator, right)` where the separator is a *copy* of the
    /// right leaf's first key. The right half gets the tie, matching the
    /// internal split. The caller wires `right` into the leaf chain.
    pub(crate) fn split(&mut self) -> (K, LeafNode<K, V>)
    where
        K: Clone,
    {
        let mid = self.entries.len() / 2;
        let right_entries = self.entries.split_off(mid);
        let separator = right_entries[0].key().clone();

        let right = LeafNode {
            parent: None,
            prev: None,
            next: None,
            entries: right_entries,
        };

        (separator, right)
    }
}
