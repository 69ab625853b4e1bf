//! Index structures.
//!
//! The only index today is the B+Tree; the engine layer depends on this
//! module rather than on the tree directly so alternate index structures
//! can slot in beside it.

pub mod btree;

pub use btree::{
    BPlusTree, Entry, RangeCursor, SharedBPlusTree, SharedRangeCursor, TreeStats,
    TreeStatsSnapshot,
};
