//! Error types for the commitment tree crate.

use cloak_core::hasher::HasherError;

use crate::zeros::MAX_TREE_HEIGHT;

/// Errors that can occur when building or querying a commitment tree.
///
/// All failures are local and deterministic; none leaves the tree partially
/// mutated.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The requested height is outside the supported range.
    #[error("invalid tree height {0} (supported: 1..={MAX_TREE_HEIGHT})")]
    InvalidHeight(usize),

    /// The tree already holds `2^height` leaves.
    #[error("tree is full: capacity {0} reached")]
    TreeFull(u64),

    /// The index does not refer to an inserted leaf.
    #[error("leaf index {index} out of range (leaf count {count})")]
    IndexOutOfRange {
        /// The requested leaf index.
        index: u64,
        /// The number of leaves currently in the tree.
        count: u64,
    },

    /// The shared zero cache was poisoned by a panicking thread.
    #[error("zero cache poisoned")]
    CachePoisoned,

    /// Hashing a node pair failed.
    #[error(transparent)]
    Hasher(#[from] HasherError),
}
