//! B+Tree index implementation.
//!
//! # Structure
//! - `entry` - the key-value pairing stored in leaves
//! - `arena` - slot arena owning every node
//! - `node` - the Leaf/Internal tagged union
//! - `tree` - [`BPlusTree`]: search, insert/split, remove/merge, ranges
//! - `cursor` - lazy leaf-chain iteration
//! - `shared` - [`SharedBPlusTree`]: the exclusive-lock concurrent wrapper
//! - `stats` - structural event counters

mod arena;
mod cursor;
mod entry;
mod node;
mod shared;
mod stats;
mod tree;

pub use cursor::RangeCursor;
pub use entry::Entry;
pub use shared::{SharedBPlusTree, SharedRangeCursor};
pub use stats::{TreeStats, TreeStatsSnapshot};
pub use tree::BPlusTree;
