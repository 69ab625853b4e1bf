//! The B+Tree proper: search, insertion with propagating splits, deletion
//! with borrow-before-merge rebalancing, and ordered range scans.
//!
//! # Architecture
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      BPlusTree                           │
//! │                                                          │
//! │   root ──▶ [ 17 ]                internal: separators    │
//! │            /    \                                        │
//! │       [ 7 12 ]  [ 25 ]                                   │
//! │       /   |   \    |  \                                  │
//! │   [5 6]─[7 10]─[12 16]─[17 20]─[25 30]   leaf chain ──▶  │
//! │                                                          │
//! │   All nodes live in a NodeArena, linked by NodeId.       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation enters at the root, descends by separator comparison to
//! exactly one leaf, applies its change there, and propagates splits or
//! merges back up through parent links. Invariants hold at operation
//! boundaries, never mid-cascade.

use std::ops::{Bound, RangeBounds};

use crate::common::config::{min_keys, MIN_ORDER};
use crate::common::{Error, NodeId, Result};
use crate::index::btree::arena::NodeArena;
use crate::index::btree::cursor::RangeCursor;
use crate::index::btree::entry::Entry;
use crate::index::btree::node::{InternalNode, LeafSearch, Node};
use crate::index::btree::stats::TreeStats;

/// An in-memory B+Tree with bounded fan-out and a linked leaf level.
///
/// - `insert` is an upsert: an existing key has its value replaced.
/// - `get` and `remove` treat a missing key as `None`, not an error.
/// - `range` walks the leaf chain lazily without revisiting internal nodes.
///
/// The tree owns its entire node graph through the arena; nothing is shared
/// between trees. A root always exists - an empty tree is a single empty
/// root leaf.
///
/// # Example
/// ```
/// use branchdb::index::BPlusTree;
///
/// let mut tree = BPlusTree::new(4).unwrap();
/// tree.insert(10, "ten");
/// tree.insert(5, "five");
/// assert_eq!(tree.get(&10), Some(&"ten"));
/// assert_eq!(tree.len(), 2);
///
/// let keys: Vec<i32> = tree.range(5..10).map(|(k, _)| *k).collect();
/// assert_eq!(keys, vec![5]);
/// ```
pub struct BPlusTree<K, V> {
    /// Owns every node; the tree structure is NodeId links on top of it.
    arena: NodeArena<Node<K, V>>,

    /// Sole entry point; reassigned on height changes.
    root: NodeId,

    /// Maximum fan-out, immutable after construction.
    order: usize,

    /// Count of live entries, maintained incrementally.
    len: usize,

    /// Structural event counters.
    stats: TreeStats,
}

impl<K: Ord + Clone, V> BPlusTree<K, V> {
    /// Construct an empty tree with the given order (maximum fan-out).
    ///
    /// # Errors
    /// `Error::InvalidConfiguration` if `order < 3`.
    pub fn new(order: usize) -> Result<Self> {
        if order < MIN_ORDER {
            return Err(Error::InvalidConfiguration(order));
        }

        let mut arena = NodeArena::new();
        let root = arena.alloc(Node::new_leaf());

        Ok(Self {
            arena,
            root,
            order,
            len: 0,
            stats: TreeStats::new(),
        })
    }

    /// The tree's order (maximum fan-out).
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Structural statistics for this tree.
    pub fn stats(&self) -> &TreeStats {
        &self.stats
    }

    /// Number of levels from root to leaf, inclusive.
    ///
    /// An empty tree has height 1 (the root leaf).
    pub fn height(&self) -> usize {
        let mut depth = 1;
        let mut current = self.root;
        while let Node::Internal(node) = self.arena.get(current) {
            current = node.children[0];
            depth += 1;
        }
        depth
    }

    // ========================================================================
    // Public API: Point operations
    // ========================================================================

    /// Look up the value stored under `key`.
    ///
    /// Descends from the root by binary-searching separators, then
    /// binary-searches the one leaf that can hold the key. No side effects;
    /// O(log n) with base `order`.
    pub fn get(&self, key: &K) -> Option<&V> {
        let leaf_id = self.locate_leaf(key);
        let leaf = self.arena.get(leaf_id).as_leaf();

        match leaf.search(key) {
            LeafSearch::Found(idx) => Some(leaf.entries[idx].value()),
            LeafSearch::Missing(_) => None,
        }
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Insert `key` -> `value`, replacing and returning any existing value.
    ///
    /// Equal keys always update in place, never duplicate. A leaf pushed
    /// past `order - 1` entries splits; splits propagate up and may grow the
    /// tree by one level.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let leaf_id = self.locate_leaf(&key);

        let (replaced, overfull) = {
            let leaf = self.arena.get_mut(leaf_id).as_leaf_mut();
            match leaf.search(&key) {
                LeafSearch::Found(idx) => (Some(leaf.entries[idx].replace_value(value)), false),
                LeafSearch::Missing(idx) => {
                    leaf.entries.insert(idx, Entry::new(key, value));
                    (None, leaf.is_overfull(self.order))
                }
            }
        };

        if replaced.is_none() {
            self.len += 1;
        }
        if overfull {
            self.split_leaf(leaf_id);
        }

        replaced
    }

    /// Remove `key`, returning its value if it was present.
    ///
    /// A missing key is not an error. A leaf dropped below minimum occupancy
    /// borrows from a sibling or merges; underflow propagates up and may
    /// shrink the tree by one level. The root leaf of an emptied tree
    /// persists as the entry point.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let leaf_id = self.locate_leaf(key);

        let removed = {
            let leaf = self.arena.get_mut(leaf_id).as_leaf_mut();
            match leaf.search(key) {
                LeafSearch::Found(idx) => leaf.entries.remove(idx),
                LeafSearch::Missing(_) => return None,
            }
        };

        self.len -= 1;

        if leaf_id != self.root && self.arena.get(leaf_id).is_underfull(self.order) {
            self.rebalance_leaf(leaf_id);
        }

        Some(removed.into_parts().1)
    }

    // ========================================================================
    // Public API: Range iteration
    // ========================================================================

    /// Iterate entries within `bounds` in ascending key order.
    ///
    /// The conventional form is half-open (`low..high`); all standard bound
    /// forms work, with `..` as the "no bound" sentinel on either side. The
    /// cursor is lazy and borrows the tree, so the borrow checker rules out
    /// structural mutation while it is live; a fresh call re-descends.
    pub fn range<R: RangeBounds<K>>(&self, bounds: R) -> RangeCursor<'_, K, V> {
        let (leaf, idx) = self.range_start(bounds.start_bound());

        let end = match bounds.end_bound() {
            Bound::Unbounded => Bound::Unbounded,
            Bound::Included(key) => Bound::Included(key.clone()),
            Bound::Excluded(key) => Bound::Excluded(key.clone()),
        };

        RangeCursor::new(self, leaf, idx, end)
    }

    /// Iterate every entry in ascending key order.
    pub fn iter(&self) -> RangeCursor<'_, K, V> {
        self.range(..)
    }

    // ========================================================================
    // Internal: Descent
    // ========================================================================

    /// Resolve a lower range bound to its starting leaf and entry index.
    ///
    /// The index may be one past the leaf's last entry; cursors normalize
    /// that by stepping to the next leaf.
    pub(crate) fn range_start(&self, start: Bound<&K>) -> (NodeId, usize) {
        match start {
            Bound::Unbounded => (self.leftmost_leaf(), 0),
            Bound::Included(key) => {
                let leaf = self.locate_leaf(key);
                (leaf, self.arena.get(leaf).as_leaf().lower_bound(key))
            }
            Bound::Excluded(key) => {
                let leaf = self.locate_leaf(key);
                (leaf, self.arena.get(leaf).as_leaf().upper_bound(key))
            }
        }
    }

    /// The one leaf whose key range covers `key`.
    fn locate_leaf(&self, key: &K) -> NodeId {
        let mut current = self.root;
        loop {
            match self.arena.get(current) {
                Node::Internal(node) => current = node.children[node.route(key)],
                Node::Leaf(_) => return current,
            }
        }
    }

    /// First leaf in key order.
    fn leftmost_leaf(&self) -> NodeId {
        let mut current = self.root;
        while let Node::Internal(node) = self.arena.get(current) {
            current = node.children[0];
        }
        current
    }

    /// Shared node access for the cursor.
    pub(crate) fn node(&self, id: NodeId) -> &Node<K, V> {
        self.arena.get(id)
    }

    // ========================================================================
    // Internal: Insert-side restructuring
    // ========================================================================

    /// Split an overfull leaf and wire the new leaf into the chain.
    fn split_leaf(&mut self, leaf_id: NodeId) {
        TreeStats::bump(&self.stats.leaf_splits);

        let (separator, mut right, old_next, parent) = {
            let leaf = self.arena.get_mut(leaf_id).as_leaf_mut();
            let (separator, right) = leaf.split();
            (separator, right, leaf.next, leaf.parent)
        };

        right.prev = Some(leaf_id);
        right.next = old_next;
        right.parent = parent;
        let right_id = self.arena.alloc(Node::Leaf(right));

        self.arena.get_mut(leaf_id).as_leaf_mut().next = Some(right_id);
        if let Some(next_id) = old_next {
            self.arena.get_mut(next_id).as_leaf_mut().prev = Some(right_id);
        }

        self.insert_into_parent(leaf_id, separator, right_id);
    }

    /// Record a finished split in the parent of `left_id`, creating a new
    /// root if `left_id` was the root.
    fn insert_into_parent(&mut self, left_id: NodeId, separator: K, right_id: NodeId) {
        let parent = self.arena.get(left_id).parent();

        let Some(parent_id) = parent else {
            // Root split: one separator, two children, height + 1.
            let mut root = InternalNode::new();
            root.keys.push(separator);
            root.children.push(left_id);
            root.children.push(right_id);
            let root_id = self.arena.alloc(Node::Internal(root));

            self.arena.get_mut(left_id).set_parent(Some(root_id));
            self.arena.get_mut(right_id).set_parent(Some(root_id));
            self.root = root_id;
            TreeStats::bump(&self.stats.height_increases);
            return;
        };

        let overfull = {
            let node = self.arena.get_mut(parent_id).as_internal_mut();
            let pos = node.position_of(left_id);
            node.insert_separator(pos, separator, right_id);
            node.is_overfull(self.order)
        };
        self.arena.get_mut(right_id).set_parent(Some(parent_id));

        if overfull {
            self.split_internal(parent_id);
        }
    }

    /// Split an overfull internal node, promoting its middle key.
    fn split_internal(&mut self, node_id: NodeId) {
        TreeStats::bump(&self.stats.internal_splits);

        let (promoted, mut right, parent) = {
            let node = self.arena.get_mut(node_id).as_internal_mut();
            let (promoted, right) = node.split();
            (promoted, right, node.parent)
        };

        right.parent = parent;
        let right_id = self.arena.alloc(Node::Internal(right));

        // Children that moved right now answer to the new node.
        let child_count = self.arena.get(right_id).as_internal().children.len();
        for i in 0..child_count {
            let child = self.arena.get(right_id).as_internal().children[i];
            self.arena.get_mut(child).set_parent(Some(right_id));
        }

        self.insert_into_parent(node_id, promoted, right_id);
    }

    // ========================================================================
    // Internal: Delete-side restructuring
    // ========================================================================

    /// Sibling IDs and the position of `child` under `parent_id`.
    fn siblings(&self, parent_id: NodeId, child: NodeId) -> (usize, Option<NodeId>, Option<NodeId>) {
        let parent = self.arena.get(parent_id).as_internal();
        let pos = parent.position_of(child);
        let left = if pos > 0 {
            Some(parent.children[pos - 1])
        } else {
            None
        };
        let right = parent.children.get(pos + 1).copied();
        (pos, left, right)
    }

    /// Restore minimum occupancy of an underfull non-root leaf.
    ///
    /// Borrow from a surplus sibling first (left preferred), updating the
    /// separator to the new boundary; otherwise merge with a sibling, repair
    /// the leaf chain, and push the underflow up.
    fn rebalance_leaf(&mut self, leaf_id: NodeId) {
        let parent_id = self
            .arena
            .get(leaf_id)
            .parent()
            .expect("non-root leaf has a parent");
        let (pos, left_id, right_id) = self.siblings(parent_id, leaf_id);

        // Borrow from the left sibling: its last entry becomes our first.
        if let Some(lid) = left_id {
            if self.arena.get(lid).has_surplus(self.order) {
                TreeStats::bump(&self.stats.borrows);

                let moved = self
                    .arena
                    .get_mut(lid)
                    .as_leaf_mut()
                    .entries
                    .pop()
                    .expect("surplus leaf is non-empty");
                let boundary = moved.key().clone();
                self.arena.get_mut(leaf_id).as_leaf_mut().entries.insert(0, moved);
                self.arena.get_mut(parent_id).as_internal_mut().keys[pos - 1] = boundary;
                return;
            }
        }

        // Borrow from the right sibling: its first entry becomes our last.
        if let Some(rid) = right_id {
            if self.arena.get(rid).has_surplus(self.order) {
                TreeStats::bump(&self.stats.borrows);

                let moved = self.arena.get_mut(rid).as_leaf_mut().entries.remove(0);
                let boundary = self.arena.get(rid).as_leaf().entries[0].key().clone();
                self.arena.get_mut(leaf_id).as_leaf_mut().entries.push(moved);
                self.arena.get_mut(parent_id).as_internal_mut().keys[pos] = boundary;
                return;
            }
        }

        // No surplus anywhere: merge. Fold into the left sibling when one
        // exists, otherwise fold the right sibling into us.
        TreeStats::bump(&self.stats.merges);

        if let Some(lid) = left_id {
            self.merge_leaves(lid, leaf_id, parent_id, pos - 1);
        } else {
            let rid = right_id.expect("non-root node has at least one sibling");
            self.merge_leaves(leaf_id, rid, parent_id, pos);
        }

        self.handle_internal_underflow(parent_id);
    }

    /// Fold leaf `right_id` into `left_id`, drop separator `sep_idx` from
    /// the parent, and splice the absorbed leaf out of the chain.
    fn merge_leaves(&mut self, left_id: NodeId, right_id: NodeId, parent_id: NodeId, sep_idx: usize) {
        let mut absorbed = self.arena.take(right_id);
        let right = absorbed.as_leaf_mut();
        let chain_next = right.next;

        {
            let left = self.arena.get_mut(left_id).as_leaf_mut();
            left.entries.append(&mut right.entries);
            left.next = chain_next;
        }
        if let Some(next_id) = chain_next {
            self.arena.get_mut(next_id).as_leaf_mut().prev = Some(left_id);
        }

        let (_key, child) = self
            .arena
            .get_mut(parent_id)
            .as_internal_mut()
            .remove_separator(sep_idx);
        debug_assert_eq!(child, right_id);
    }

    /// React to a key removed from an internal node: collapse the root or
    /// rebalance a non-root node that dropped below minimum.
    fn handle_internal_underflow(&mut self, node_id: NodeId) {
        if node_id == self.root {
            // An internal root with zero keys has one child left; that child
            // becomes the root. A root leaf is never collapsed away.
            if self.arena.get(node_id).key_count() == 0 && !self.arena.get(node_id).is_leaf() {
                let child = self.arena.get(node_id).as_internal().children[0];
                self.arena.free(node_id);
                self.arena.get_mut(child).set_parent(None);
                self.root = child;
                TreeStats::bump(&self.stats.height_decreases);
            }
            return;
        }

        if self.arena.get(node_id).is_underfull(self.order) {
            self.rebalance_internal(node_id);
        }
    }

    /// Restore minimum occupancy of an underfull non-root internal node by
    /// rotating through the parent separator or merging with a sibling.
    fn rebalance_internal(&mut self, node_id: NodeId) {
        let parent_id = self
            .arena
            .get(node_id)
            .parent()
            .expect("non-root node has a parent");
        let (pos, left_id, right_id) = self.siblings(parent_id, node_id);

        // Borrow from the left sibling: its last key rotates up through the
        // parent, the old separator rotates down to us, its last child moves.
        if let Some(lid) = left_id {
            if self.arena.get(lid).has_surplus(self.order) {
                TreeStats::bump(&self.stats.borrows);

                let (lifted, moved_child) = {
                    let left = self.arena.get_mut(lid).as_internal_mut();
                    let key = left.keys.pop().expect("surplus node has keys");
                    let child = left.children.pop().expect("internal node has children");
                    (key, child)
                };
                let lowered = {
                    let parent = self.arena.get_mut(parent_id).as_internal_mut();
                    std::mem::replace(&mut parent.keys[pos - 1], lifted)
                };
                {
                    let node = self.arena.get_mut(node_id).as_internal_mut();
                    node.keys.insert(0, lowered);
                    node.children.insert(0, moved_child);
                }
                self.arena.get_mut(moved_child).set_parent(Some(node_id));
                return;
            }
        }

        // Borrow from the right sibling, mirrored.
        if let Some(rid) = right_id {
            if self.arena.get(rid).has_surplus(self.order) {
                TreeStats::bump(&self.stats.borrows);

                let (lifted, moved_child) = {
                    let right = self.arena.get_mut(rid).as_internal_mut();
                    let key = right.keys.remove(0);
                    let child = right.children.remove(0);
                    (key, child)
                };
                let lowered = {
                    let parent = self.arena.get_mut(parent_id).as_internal_mut();
                    std::mem::replace(&mut parent.keys[pos], lifted)
                };
                {
                    let node = self.arena.get_mut(node_id).as_internal_mut();
                    node.keys.push(lowered);
                    node.children.push(moved_child);
                }
                self.arena.get_mut(moved_child).set_parent(Some(node_id));
                return;
            }
        }

        // Merge, pulling the parent separator down into the merged node.
        TreeStats::bump(&self.stats.merges);

        if let Some(lid) = left_id {
            self.merge_internals(lid, node_id, parent_id, pos - 1);
        } else {
            let rid = right_id.expect("non-root node has at least one sibling");
            self.merge_internals(node_id, rid, parent_id, pos);
        }

        self.handle_internal_underflow(parent_id);
    }

    /// Fold internal node `right_id` into `left_id`, pulling separator
    /// `sep_idx` down between their key runs.
    fn merge_internals(&mut self, left_id: NodeId, right_id: NodeId, parent_id: NodeId, sep_idx: usize) {
        let (separator, child) = self
            .arena
            .get_mut(parent_id)
            .as_internal_mut()
            .remove_separator(sep_idx);
        debug_assert_eq!(child, right_id);

        let mut absorbed = self.arena.take(right_id);
        let right = absorbed.as_internal_mut();
        let moved_children: Vec<NodeId> = right.children.clone();

        {
            let left = self.arena.get_mut(left_id).as_internal_mut();
            left.keys.push(separator);
            left.keys.append(&mut right.keys);
            left.children.append(&mut right.children);
        }
        for moved in moved_children {
            self.arena.get_mut(moved).set_parent(Some(left_id));
        }
    }

    // ========================================================================
    // Public API: Validation
    // ========================================================================

    /// Verify every structural invariant of the tree.
    ///
    /// Checks uniform leaf depth, occupancy bounds, strict key order within
    /// nodes and across the whole leaf chain, separator/subtree consistency,
    /// parent links, chain symmetry, and the entry count. Any failure is a
    /// programming-contract violation surfaced as `Error::KeyOrderViolation`.
    pub fn check_invariants(&self) -> Result<()> {
        let mut leaf_depth = None;
        let mut walked_leaves = 0;
        self.check_node(self.root, None, 0, None, None, &mut leaf_depth, &mut walked_leaves)?;
        self.check_leaf_chain(walked_leaves)
    }

    #[allow(clippy::too_many_arguments)]
    fn check_node(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        depth: usize,
        low: Option<&K>,
        high: Option<&K>,
        leaf_depth: &mut Option<usize>,
        walked_leaves: &mut usize,
    ) -> Result<()> {
        let node = self.arena.get(id);

        if node.parent() != parent {
            return Err(violation(format!("{} has a wrong parent link", id)));
        }

        let is_root = id == self.root;
        let count = node.key_count();
        if count + 1 > self.order {
            return Err(violation(format!("{} exceeds maximum occupancy", id)));
        }
        let below_min = count < min_keys(self.order);
        match node {
            Node::Leaf(leaf) => {
                if below_min && !is_root {
                    return Err(violation(format!("{} is below minimum occupancy", id)));
                }

                match leaf_depth {
                    None => *leaf_depth = Some(depth),
                    Some(expected) if *expected != depth => {
                        return Err(violation(format!(
                            "{} sits at depth {} but leaves start at depth {}",
                            id, depth, expected
                        )));
                    }
                    Some(_) => {}
                }
                *walked_leaves += 1;

                for pair in leaf.entries.windows(2) {
                    if pair[0].key() >= pair[1].key() {
                        return Err(violation(format!("{} entries are not strictly ascending", id)));
                    }
                }
                if let (Some(low), Some(first)) = (low, leaf.entries.first()) {
                    if first.key() < low {
                        return Err(violation(format!("{} holds a key below its subtree range", id)));
                    }
                }
                if let (Some(high), Some(last)) = (high, leaf.entries.last()) {
                    if last.key() >= high {
                        return Err(violation(format!("{} holds a key above its subtree range", id)));
                    }
                }
                Ok(())
            }
            Node::Internal(internal) => {
                if is_root {
                    if count == 0 {
                        return Err(violation(format!("internal root {} has no keys", id)));
                    }
                } else if below_min {
                    return Err(violation(format!("{} is below minimum occupancy", id)));
                }
                if internal.children.len() != count + 1 {
                    return Err(violation(format!("{} child count does not match key count", id)));
                }

                for pair in internal.keys.windows(2) {
                    if pair[0] >= pair[1] {
                        return Err(violation(format!("{} separators are not strictly ascending", id)));
                    }
                }
                if let (Some(low), Some(first)) = (low, internal.keys.first()) {
                    if first < low {
                        return Err(violation(format!("{} separator below its subtree range", id)));
                    }
                }
                if let (Some(high), Some(last)) = (high, internal.keys.last()) {
                    if last >= high {
                        return Err(violation(format!("{} separator above its subtree range", id)));
                    }
                }

                for (i, &child) in internal.children.iter().enumerate() {
                    let child_low = if i == 0 { low } else { Some(&internal.keys[i - 1]) };
                    let child_high = if i == count { high } else { Some(&internal.keys[i]) };
                    self.check_node(child, Some(id), depth + 1, child_low, child_high, leaf_depth, walked_leaves)?;
                }
                Ok(())
            }
        }
    }

    /// Walk the leaf chain, confirming global key order, `prev` symmetry,
    /// the entry count, and that the chain covers every leaf in the tree.
    fn check_leaf_chain(&self, walked_leaves: usize) -> Result<()> {
        let mut chained_leaves = 0;
        let mut chained_entries = 0;
        let mut prev: Option<NodeId> = None;
        let mut last_key: Option<&K> = None;
        let mut current = Some(self.leftmost_leaf());

        while let Some(id) = current {
            let leaf = self.arena.get(id).as_leaf();
            if leaf.prev != prev {
                return Err(violation(format!("{} has a broken prev link", id)));
            }

            for entry in &leaf.entries {
                if let Some(last) = last_key {
                    if last >= entry.key() {
                        return Err(violation("leaf chain keys are not strictly ascending".into()));
                    }
                }
                last_key = Some(entry.key());
                chained_entries += 1;
            }

            chained_leaves += 1;
            prev = Some(id);
            current = leaf.next;
        }

        if chained_leaves != walked_leaves {
            return Err(violation("leaf chain does not cover every leaf".into()));
        }
        if chained_entries != self.len {
            return Err(violation(format!(
                "tree len is {} but the leaf chain holds {} entries",
                self.len, chained_entries
            )));
        }
        Ok(())
    }
}

fn violation(what: String) -> Error {
    Error::KeyOrderViolation(what)
}
