//! Exclusive-lock concurrency wrapper for the tree.
//!
//! [`SharedBPlusTree`] guards a [`BPlusTree`] with one `parking_lot::RwLock`:
//! every operation acquires the lock for its own duration (scoped guards, so
//! release happens on every exit path) and no operation suspends
//! mid-mutation. Readers share; writers exclude everyone.
//!
//! Range scans get a versioned cursor instead of a long-held lock: see
//! [`SharedRangeCursor`].

use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::{Error, NodeId, Result};
use crate::index::btree::node::Node;
use crate::index::btree::stats::TreeStatsSnapshot;
use crate::index::btree::tree::BPlusTree;

/// Tree state plus a mutation stamp, guarded together.
struct Versioned<K, V> {
    tree: BPlusTree<K, V>,
    /// Bumped by every write; cursors compare against it to detect staleness.
    version: u64,
}

/// A cloneable, thread-safe handle to a B+Tree.
///
/// Values are returned by clone rather than by reference - a reference could
/// not outlive the lock guard.
///
/// # Example
/// ```
/// use branchdb::index::SharedBPlusTree;
///
/// let tree: SharedBPlusTree<u32, String> = SharedBPlusTree::new(16).unwrap();
/// let writer = tree.clone();
/// writer.insert(1, "one".to_string());
/// assert_eq!(tree.get(&1), Some("one".to_string()));
/// ```
pub struct SharedBPlusTree<K, V> {
    inner: Arc<RwLock<Versioned<K, V>>>,
}

impl<K, V> Clone for SharedBPlusTree<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Ord + Clone, V: Clone> SharedBPlusTree<K, V> {
    /// Construct an empty shared tree.
    ///
    /// # Errors
    /// `Error::InvalidConfiguration` if `order < 3`.
    pub fn new(order: usize) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(RwLock::new(Versioned {
                tree: BPlusTree::new(order)?,
                version: 0,
            })),
        })
    }

    /// Look up `key` under the read lock.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.read().tree.get(key).cloned()
    }

    /// Insert `key` -> `value` under the write lock, returning any replaced
    /// value. Invalidates live cursors.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let mut guard = self.inner.write();
        guard.version += 1;
        guard.tree.insert(key, value)
    }

    /// Remove `key` under the write lock, returning its value if present.
    /// Invalidates live cursors.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.write();
        guard.version += 1;
        guard.tree.remove(key)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.read().tree.len()
    }

    /// Whether the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.read().tree.is_empty()
    }

    /// Structural statistics snapshot.
    pub fn stats(&self) -> TreeStatsSnapshot {
        self.inner.read().tree.stats().snapshot()
    }

    /// Verify tree invariants under the read lock.
    pub fn check_invariants(&self) -> Result<()> {
        self.inner.read().tree.check_invariants()
    }

    /// Start a range scan over `bounds`.
    ///
    /// The cursor holds no lock between yields; each step re-acquires the
    /// read lock and first checks that the tree has not been mutated since
    /// the scan began.
    pub fn range<R: RangeBounds<K>>(&self, bounds: R) -> SharedRangeCursor<K, V> {
        let guard = self.inner.read();
        let (leaf, idx) = guard.tree.range_start(bounds.start_bound());
        let end = match bounds.end_bound() {
            Bound::Unbounded => Bound::Unbounded,
            Bound::Included(key) => Bound::Included(key.clone()),
            Bound::Excluded(key) => Bound::Excluded(key.clone()),
        };

        SharedRangeCursor {
            shared: self.clone(),
            version: guard.version,
            leaf,
            idx,
            end,
            done: false,
        }
    }
}

/// A range cursor over a [`SharedBPlusTree`].
///
/// Holds no lock between yields, so non-conflicting operations can proceed
/// during a scan. The trade-off: any structural mutation of the tree while
/// the cursor is live **invalidates** it, and the next step yields
/// `Err(Error::InvalidatedCursor)` instead of silently wrong data. Recover
/// by re-issuing the range call. Abandoning a cursor at any point releases
/// nothing but its own allocation.
pub struct SharedRangeCursor<K, V> {
    shared: SharedBPlusTree<K, V>,
    /// Tree version this cursor was opened against.
    version: u64,
    leaf: NodeId,
    idx: usize,
    end: Bound<K>,
    done: bool,
}

impl<K: Ord + Clone, V: Clone> SharedRangeCursor<K, V> {
    fn in_bound(&self, key: &K) -> bool {
        match &self.end {
            Bound::Unbounded => true,
            Bound::Included(high) => key <= high,
            Bound::Excluded(high) => key < high,
        }
    }

    /// Yield the next entry, or `None` at the end of the range.
    ///
    /// # Errors
    /// `Error::InvalidatedCursor` if the tree was mutated since the cursor
    /// was opened.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<(K, V)>> {
        if self.done {
            return Ok(None);
        }

        let guard = self.shared.inner.read();
        if guard.version != self.version {
            self.done = true;
            return Err(Error::InvalidatedCursor);
        }

        loop {
            if !self.leaf.is_valid() {
                self.done = true;
                return Ok(None);
            }

            let leaf = match guard.tree.node(self.leaf) {
                Node::Leaf(leaf) => leaf,
                Node::Internal(_) => unreachable!("cursor positioned on an internal node"),
            };

            if self.idx >= leaf.entries.len() {
                self.leaf = leaf.next.unwrap_or(NodeId::INVALID);
                self.idx = 0;
                continue;
            }

            let entry = &leaf.entries[self.idx];
            if !self.in_bound(entry.key()) {
                self.done = true;
                return Ok(None);
            }

            self.idx += 1;
            return Ok(Some((entry.key().clone(), entry.value().clone())));
        }
    }

    /// Drain the remaining range into a vector.
    ///
    /// # Errors
    /// `Error::InvalidatedCursor` as for [`next`](Self::next).
    pub fn collect_remaining(&mut self) -> Result<Vec<(K, V)>> {
        let mut out = Vec::new();
        while let Some(pair) = self.next()? {
            out.push(pair);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SharedBPlusTree<u32, u32> {
        let tree = SharedBPlusTree::new(4).unwrap();
        for k in [10, 20, 5, 6, 12, 30, 7, 17] {
            tree.insert(k, k * 10);
        }
        tree
    }

    #[test]
    fn test_shared_point_operations() {
        let tree = sample();

        assert_eq!(tree.get(&6), Some(60));
        assert_eq!(tree.remove(&6), Some(60));
        assert_eq!(tree.get(&6), None);
        assert_eq!(tree.len(), 7);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_cursor_yields_range() {
        let tree = sample();
        let mut cursor = tree.range(6..17);

        let got = cursor.collect_remaining().unwrap();
        let keys: Vec<u32> = got.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![6, 7, 10, 12]);
    }

    #[test]
    fn test_cursor_invalidated_by_write() {
        let tree = sample();
        let mut cursor = tree.range(..);

        assert_eq!(cursor.next().unwrap(), Some((5, 50)));

        // A structural mutation between yields invalidates the cursor.
        tree.insert(8, 80);

        match cursor.next() {
            Err(Error::InvalidatedCursor) => {}
            other => panic!("expected InvalidatedCursor, got {:?}", other),
        }
        // An invalidated cursor stays finished rather than erroring forever.
        assert!(matches!(cursor.next(), Ok(None)));

        // Recovery: re-issue the range call.
        let keys: Vec<u32> = tree
            .range(..)
            .collect_remaining()
            .unwrap()
            .iter()
            .map(|(k, _)| *k)
            .collect();
        assert!(keys.contains(&8));
    }

    #[test]
    fn test_cursor_survives_reads() {
        let tree = sample();
        let mut cursor = tree.range(..);

        assert_eq!(cursor.next().unwrap(), Some((5, 50)));
        // Reads do not bump the version.
        assert_eq!(tree.get(&10), Some(100));
        assert_eq!(cursor.next().unwrap(), Some((6, 60)));
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        use std::thread;

        let tree: SharedBPlusTree<u32, u32> = SharedBPlusTree::new(8).unwrap();
        for k in 0..100 {
            tree.insert(k, k);
        }

        let mut handles = vec![];

        for _ in 0..4 {
            let reader = tree.clone();
            handles.push(thread::spawn(move || {
                for k in 0..100u32 {
                    assert_eq!(reader.get(&k), Some(k));
                }
            }));
        }

        let writer = tree.clone();
        handles.push(thread::spawn(move || {
            for k in 100..200u32 {
                writer.insert(k, k);
            }
        }));

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tree.len(), 200);
        tree.check_invariants().unwrap();
    }
}
