//! The key-value engine layer.
//!
//! Glue over the index: [`KvStore`] exposes put/get/delete/scan on byte
//! keys, and the `snapshot` module serializes a full ordered traversal with
//! a CRC32 trailer. No algorithmic content lives here - that is the point.

mod snapshot;
mod store;

pub use store::KvStore;
