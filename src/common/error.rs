//! Error types for branchdb.

use thiserror::Error;

use crate::common::config::MIN_ORDER;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in branchdb.
///
/// By having a single error type, error handling stays consistent across the
/// index and engine layers.
///
/// A missing key is deliberately *not* an error: lookups return `Option` and
/// removals return `Option`/`false`-like results, because an absent key is an
/// expected outcome, not a fault.
#[derive(Debug, Error)]
pub enum Error {
    /// Tree constructed with an order below [`MIN_ORDER`].
    ///
    /// Fatal at construction; there is no tree to recover.
    #[error("invalid tree order {0}: order must be at least {MIN_ORDER}")]
    InvalidConfiguration(usize),

    /// A shared range cursor was used after the tree was structurally
    /// mutated by another handle.
    ///
    /// Recoverable: re-issue the range call against the current tree state.
    #[error("range cursor invalidated by a concurrent tree mutation")]
    InvalidatedCursor,

    /// An internal consistency check failed.
    ///
    /// This indicates a programming-contract violation (for example a key
    /// type whose `Ord` is not a strict total order). It is surfaced
    /// immediately and never retried.
    #[error("tree invariant violated: {0}")]
    KeyOrderViolation(String),

    /// A snapshot failed checksum or format validation on reload.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// I/O error while writing or reading a snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
