//! Structural statistics tracking for the tree.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters of structural events in a tree's lifetime.
///
/// All fields are atomic so a [`SharedBPlusTree`](crate::index::SharedBPlusTree)
/// reader can sample them through a shared reference. `Ordering::Relaxed`
/// everywhere: counters only need atomicity, not ordering between each other.
///
/// # Example
/// ```
/// use branchdb::index::BPlusTree;
///
/// let mut tree: BPlusTree<u32, u32> = BPlusTree::new(3).unwrap();
/// for k in 0..10 {
///     tree.insert(k, k);
/// }
/// assert!(tree.stats().snapshot().leaf_splits > 0);
/// ```
#[derive(Debug, Default)]
pub struct TreeStats {
    /// Leaf nodes split by inserts.
    pub leaf_splits: AtomicU64,

    /// Internal nodes split by propagating inserts.
    pub internal_splits: AtomicU64,

    /// Entries or separators borrowed from a sibling during deletes.
    pub borrows: AtomicU64,

    /// Node pairs merged during deletes.
    pub merges: AtomicU64,

    /// Times the tree grew a level (root split).
    pub height_increases: AtomicU64,

    /// Times the tree lost a level (root collapse).
    pub height_decreases: AtomicU64,
}

impl TreeStats {
    /// Create a stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a non-atomic snapshot for display or assertions.
    pub fn snapshot(&self) -> TreeStatsSnapshot {
        TreeStatsSnapshot {
            leaf_splits: self.leaf_splits.load(Ordering::Relaxed),
            internal_splits: self.internal_splits.load(Ordering::Relaxed),
            borrows: self.borrows.load(Ordering::Relaxed),
            merges: self.merges.load(Ordering::Relaxed),
            height_increases: self.height_increases.load(Ordering::Relaxed),
            height_decreases: self.height_decreases.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`TreeStats`], safe to print and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStatsSnapshot {
    pub leaf_splits: u64,
    pub internal_splits: u64,
    pub borrows: u64,
    pub merges: u64,
    pub height_increases: u64,
    pub height_decreases: u64,
}

impl fmt::Display for TreeStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TreeStats {{ splits: {}+{}, borrows: {}, merges: {}, height: +{}/-{} }}",
            self.leaf_splits,
            self.internal_splits,
            self.borrows,
            self.merges,
            self.height_increases,
            self.height_decreases
        )
    }
}
