//! Lazy forward iteration over the leaf chain.

use std::ops::Bound;

use crate::common::NodeId;
use crate::index::btree::node::Node;
use crate::index::btree::tree::BPlusTree;

/// A lazy cursor over a key range of a [`BPlusTree`].
///
/// Produced by [`BPlusTree::range`]: the starting leaf is found by a single
/// search descent, after which the cursor walks `next` links only, yielding
/// entries until the upper bound or the end of the chain.
///
/// The cursor borrows the tree, so the tree cannot be structurally mutated
/// while it is live; this is the compile-time form of cursor invalidation.
/// A cursor is not restartable - a fresh `range` call re-descends - and may
/// be dropped at any point without cleanup.
pub struct RangeCursor<'a, K, V> {
    tree: &'a BPlusTree<K, V>,

    /// Leaf currently being walked; the sentinel once exhausted.
    leaf: NodeId,

    /// Next entry index within `leaf`.
    idx: usize,

    /// Upper bound; owned so the cursor outlives the range expression.
    end: Bound<K>,
}

impl<'a, K: Ord + Clone, V> RangeCursor<'a, K, V> {
    pub(crate) fn new(tree: &'a BPlusTree<K, V>, leaf: NodeId, idx: usize, end: Bound<K>) -> Self {
        Self { tree, leaf, idx, end }
    }

    /// Whether `key` is still inside the upper bound.
    fn in_bound(&self, key: &K) -> bool {
        match &self.end {
            Bound::Unbounded => true,
            Bound::Included(high) => key <= high,
            Bound::Excluded(high) => key < high,
        }
    }
}

impl<'a, K: Ord + Clone, V> Iterator for RangeCursor<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if !self.leaf.is_valid() {
                return None;
            }

            let leaf = match self.tree.node(self.leaf) {
                Node::Leaf(leaf) => leaf,
                Node::Internal(_) => unreachable!("cursor positioned on an internal node"),
            };

            // Step to the next leaf when this one is consumed. The start
            // position may also point one past a leaf's last entry (a lower
            // bound above every key in the leaf), which lands here too.
            if self.idx >= leaf.entries.len() {
                self.leaf = leaf.next.unwrap_or(NodeId::INVALID);
                self.idx = 0;
                continue;
            }

            let entry = &leaf.entries[self.idx];
            if !self.in_bound(entry.key()) {
                self.leaf = NodeId::INVALID;
                return None;
            }

            self.idx += 1;
            return Some((entry.key(), entry.value()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BPlusTree<u32, u32> {
        let mut tree = BPlusTree::new(4).unwrap();
        for k in [10, 20, 5, 6, 12, 30, 7, 17] {
            tree.insert(k, k * 10);
        }
        tree
    }

    #[test]
    fn test_half_open_range() {
        let tree = sample();
        let keys: Vec<u32> = tree.range(6..17).map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![6, 7, 10, 12]);
    }

    #[test]
    fn test_inclusive_range() {
        let tree = sample();
        let keys: Vec<u32> = tree.range(6..=17).map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![6, 7, 10, 12, 17]);
    }

    #[test]
    fn test_unbounded_ends() {
        let tree = sample();

        let from: Vec<u32> = tree.range(12..).map(|(k, _)| *k).collect();
        assert_eq!(from, vec![12, 17, 20, 30]);

        let to: Vec<u32> = tree.range(..12).map(|(k, _)| *k).collect();
        assert_eq!(to, vec![5, 6, 7, 10]);
    }

    #[test]
    fn test_bounds_between_keys() {
        let tree = sample();
        // Neither bound is a stored key.
        let keys: Vec<u32> = tree.range(8..19).map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![10, 12, 17]);
    }

    #[test]
    fn test_range_values_follow_keys() {
        let tree = sample();
        for (k, v) in tree.range(..) {
            assert_eq!(*v, k * 10);
        }
    }

    #[test]
    fn test_empty_tree_range() {
        let tree: BPlusTree<u32, u32> = BPlusTree::new(4).unwrap();
        assert_eq!(tree.range(..).count(), 0);
        assert_eq!(tree.range(1..100).count(), 0);
    }

    #[test]
    fn test_range_beyond_largest_key() {
        let tree = sample();
        assert_eq!(tree.range(31..).count(), 0);
    }

    #[test]
    fn test_partial_consumption_is_safe() {
        let tree = sample();
        let mut cursor = tree.range(..);
        assert_eq!(cursor.next().map(|(k, _)| *k), Some(5));
        assert_eq!(cursor.next().map(|(k, _)| *k), Some(6));
        // Abandon the cursor mid-scan; nothing to clean up.
        drop(cursor);
        assert_eq!(tree.len(), 8);
    }
}
