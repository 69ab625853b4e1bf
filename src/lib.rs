//! branchdb - An embedded key-value store built on an in-memory B+Tree index.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         branchdb                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │             Engine Layer (engine/)                   │   │
//! │  │     KvStore: put/get/delete/scan + snapshots         │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! │                            ↓                                │
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │             Index Layer (index/)                     │   │
//! │  │  ┌───────────────────────────────────────────────┐  │   │
//! │  │  │ BPlusTree: search | insert/split |            │  │   │
//! │  │  │            remove/merge | range cursors       │  │   │
//! │  │  └───────────────────────────────────────────────┘  │   │
//! │  │     SharedBPlusTree: exclusive-lock concurrency      │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! │                            ↓                                │
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │        Common primitives (common/)                   │   │
//! │  │          NodeId + Error + order config               │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (NodeId, Error, order constants)
//! - [`index`] - The B+Tree and its concurrent wrapper
//! - [`engine`] - The thin key-value store facade and snapshots
//!
//! # Quick Start
//! ```
//! use branchdb::engine::KvStore;
//!
//! let mut store = KvStore::new();
//! store.put("JimZuoLin", "Hello Jim!");
//! assert_eq!(store.get("JimZuoLin"), Some(&b"Hello Jim!"[..]));
//! ```

pub mod common;
pub mod engine;
pub mod index;

// Re-export commonly used items at crate root for convenience
pub use common::config::{DEFAULT_ORDER, MIN_ORDER};
pub use common::{Error, NodeId, Result};

pub use engine::KvStore;
pub use index::{BPlusTree, Entry, RangeCursor, SharedBPlusTree, SharedRangeCursor};
