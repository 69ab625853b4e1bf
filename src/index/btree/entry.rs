//! Key-value entry - the atomic unit stored in leaf nodes.

/// An immutable pairing of one key and one value.
///
/// Entries are never mutated in place once stored in a leaf: an upsert on an
/// existing key replaces the whole entry, so the key field of a live entry
/// can never drift out of its sorted position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<K, V> {
    key: K,
    value: V,
}

impl<K, V> Entry<K, V> {
    /// Create a new entry.
    #[inline]
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    /// The entry's key.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The entry's value.
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consume the entry, yielding its parts.
    #[inline]
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }

    /// Replace the value, returning the old one.
    ///
    /// `pub(crate)`: only the tree's upsert path may do this, and only for a
    /// matching key, so the sorted order of the containing leaf is preserved.
    pub(crate) fn replace_value(&mut self, value: V) -> V {
        std::mem::replace(&mut self.value, value)
    }
}
