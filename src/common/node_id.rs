//! Node identifier type.

use std::fmt;

/// Identifies a node slot in the tree's node arena.
///
/// Nodes refer to each other by `NodeId` rather than by reference: child
/// links, leaf-chain links, and parent back-references are all non-owning
/// indices into the arena, so the parent/child relationship never forms an
/// ownership cycle.
///
/// # Example
/// ```
/// use branchdb::common::NodeId;
///
/// let id = NodeId::new(42);
/// assert!(id.is_valid());
/// assert_eq!(id.0, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Invalid/sentinel node ID.
    ///
    /// Used to represent "no node" in contexts where `Option<NodeId>` would
    /// be awkward (e.g. an exhausted cursor).
    pub const INVALID: NodeId = NodeId(u32::MAX);

    /// Create a new NodeId.
    #[inline]
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }

    /// Check if this node ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// The arena slot index this ID names.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Node(INVALID)")
        } else {
            write!(f, "Node({})", self.0)
        }
    }
}
