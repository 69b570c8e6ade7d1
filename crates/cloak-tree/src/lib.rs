//! Incremental commitment accumulator.
//!
//! A fixed-height, append-only Merkle tree over note commitments. Inserting
//! a commitment recomputes only the O(height) nodes on its path; every
//! never-populated node is answered from a precomputed zero cache. Roots and
//! inclusion proofs are bit-for-bit compatible with the external circuit's
//! Merkle-path gadget.

mod error;
mod tree;
mod zeros;

pub use error::TreeError;
pub use tree::{CommitmentTree, InclusionProof};
pub use zeros::{MAX_TREE_HEIGHT, ZeroCache, empty_leaf};
