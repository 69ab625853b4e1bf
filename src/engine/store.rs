//! The key-value store facade.

use std::io::{Read, Write};
use std::ops::RangeBounds;

use crate::common::config::DEFAULT_ORDER;
use crate::common::Result;
use crate::engine::snapshot;
use crate::index::{BPlusTree, RangeCursor};

/// A byte-keyed store over the B+Tree index.
///
/// This is deliberately thin glue: every operation maps one-to-one onto the
/// tree. Keys and values are owned byte strings; callers pass anything
/// `AsRef<[u8]>`.
///
/// # Example
/// ```
/// use branchdb::engine::KvStore;
///
/// let mut store = KvStore::new();
/// store.put("JimZuoLin", "Hello Jim!");
/// assert_eq!(store.get("JimZuoLin"), Some(&b"Hello Jim!"[..]));
/// assert!(store.delete("JimZuoLin"));
/// ```
pub struct KvStore {
    tree: BPlusTree<Vec<u8>, Vec<u8>>,
}

impl KvStore {
    /// Create an empty store with the default tree order.
    pub fn new() -> Self {
        Self {
            // DEFAULT_ORDER >= MIN_ORDER holds by definition.
            tree: BPlusTree::new(DEFAULT_ORDER).expect("default order is valid"),
        }
    }

    /// Create an empty store with an explicit tree order.
    ///
    /// # Errors
    /// `Error::InvalidConfiguration` if `order < 3`.
    pub fn with_order(order: usize) -> Result<Self> {
        Ok(Self {
            tree: BPlusTree::new(order)?,
        })
    }

    /// Store `value` under `key`, returning any replaced value.
    pub fn put(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Option<Vec<u8>> {
        self.tree.insert(key.as_ref().to_vec(), value.as_ref().to_vec())
    }

    /// Fetch the value stored under `key`.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&[u8]> {
        self.tree.get(&key.as_ref().to_vec()).map(Vec::as_slice)
    }

    /// Delete `key`. Returns whether it was present.
    pub fn delete(&mut self, key: impl AsRef<[u8]>) -> bool {
        self.tree.remove(&key.as_ref().to_vec()).is_some()
    }

    /// Iterate entries within `bounds` in ascending key order.
    pub fn scan<R: RangeBounds<Vec<u8>>>(&self, bounds: R) -> RangeCursor<'_, Vec<u8>, Vec<u8>> {
        self.tree.range(bounds)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Serialize the full store, in key order, into `writer`.
    ///
    /// The snapshot carries a CRC32 trailer; see the `snapshot` module for
    /// the format.
    ///
    /// # Errors
    /// I/O errors from `writer`.
    pub fn snapshot_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        snapshot::write_snapshot(&self.tree, writer)
    }

    /// Rebuild a store from a snapshot previously written by
    /// [`snapshot_to`](Self::snapshot_to).
    ///
    /// # Errors
    /// - `Error::CorruptSnapshot` on bad magic, truncation, or checksum
    ///   mismatch
    /// - I/O errors from `reader`
    pub fn load_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            tree: snapshot::read_snapshot(reader, DEFAULT_ORDER)?,
        })
    }
}

impl Default for KvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_roundtrip() {
        let mut store = KvStore::new();

        assert_eq!(store.put("alpha", "1"), None);
        assert_eq!(store.get("alpha"), Some(&b"1"[..]));
        assert_eq!(store.get("beta"), None);
    }

    #[test]
    fn test_put_replaces() {
        let mut store = KvStore::new();
        store.put("k", "old");

        assert_eq!(store.put("k", "new"), Some(b"old".to_vec()));
        assert_eq!(store.get("k"), Some(&b"new"[..]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete() {
        let mut store = KvStore::new();
        store.put("k", "v");

        assert!(store.delete("k"));
        assert!(!store.delete("k"));
        assert_eq!(store.get("k"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_scan_is_key_ordered() {
        let mut store = KvStore::new();
        for key in ["pear", "apple", "fig", "date"] {
            store.put(key, "x");
        }

        let keys: Vec<&[u8]> = store.scan(..).map(|(k, _)| k.as_slice()).collect();
        assert_eq!(
            keys,
            vec![&b"apple"[..], &b"date"[..], &b"fig"[..], &b"pear"[..]]
        );
    }
}
