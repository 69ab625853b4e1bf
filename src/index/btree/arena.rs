//! Slot arena holding every node of a tree.
//!
//! The arena owns all nodes; the tree structure on top of it is expressed
//! purely through [`NodeId`] links. Freed slots are recycled through a free
//! list, so a long-lived tree under churn does not grow its slot vector
//! unboundedly.

use crate::common::NodeId;

/// Arena of node slots addressed by [`NodeId`].
///
/// Allocation returns the ID of a recycled slot when one is available,
/// otherwise appends a new slot. `get`/`get_mut` panic on a stale or invalid
/// ID - every ID the tree holds must name a live slot, so a miss here is a
/// tree bug, not a caller error.
pub(crate) struct NodeArena<T> {
    /// Slot storage; `None` marks a freed slot awaiting reuse.
    slots: Vec<Option<T>>,

    /// IDs of freed slots (LIFO for locality).
    free: Vec<NodeId>,
}

impl<T> NodeArena<T> {
    /// Create an empty arena.
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Number of live (allocated, not freed) slots.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Allocate a slot for `node`, reusing a freed slot when possible.
    ///
    /// # Panics
    /// Panics if the arena would exceed `u32::MAX - 1` slots (the `NodeId`
    /// sentinel must stay unused).
    pub(crate) fn alloc(&mut self, node: T) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Some(node);
            return id;
        }

        assert!(
            self.slots.len() < NodeId::INVALID.index(),
            "node arena is at maximum capacity"
        );
        self.slots.push(Some(node));
        NodeId::new((self.slots.len() - 1) as u32)
    }

    /// Shared access to a live slot.
    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &T {
        self.slots[id.index()]
            .as_ref()
            .expect("NodeArena::get: stale node ID")
    }

    /// Exclusive access to a live slot.
    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut T {
        self.slots[id.index()]
            .as_mut()
            .expect("NodeArena::get_mut: stale node ID")
    }

    /// Remove and return the node in a slot, marking the slot for reuse.
    pub(crate) fn take(&mut self, id: NodeId) -> T {
        let node = self.slots[id.index()]
            .take()
            .expect("NodeArena::take: stale node ID");
        self.free.push(id);
        node
    }

    /// Free a slot, dropping its node.
    pub(crate) fn free(&mut self, id: NodeId) {
        drop(self.take(id));
    }
}
