//! Append-only fixed-height Merkle tree of note commitments.
//!
//! Each level is a sparse map from node index to hash; only the O(height)
//! nodes touched by an insertion are ever stored, and everything else reads
//! from the [`ZeroCache`]. For height 20 a dense layout would reserve up to
//! 2^20 slots per level while holding a handful of values.

use std::collections::HashMap;
use std::sync::Arc;

use cloak_core::field::Field;
use cloak_core::hasher::{HasherError, PoseidonHasher};

use crate::error::TreeError;
use crate::zeros::{ZeroCache, empty_leaf};

/// The sibling path from one leaf to the root.
///
/// `path_indices[l] == 0` means the path node at level `l` is the left
/// child (the sibling supplied is its right neighbour); `1` means it is the
/// right child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionProof {
    /// The root this path folds up to.
    pub root: Field,
    /// Sibling hash per level, bottom-up.
    pub path_elements: Vec<Field>,
    /// Left/right indicator per level, bottom-up.
    pub path_indices: Vec<u8>,
}

/// An append-only commitment accumulator of fixed height.
///
/// One writer at a time: [`Self::insert`] takes `&mut self`, so the borrow
/// checker serialises writers, while [`Self::root`] and [`Self::proof`] are
/// pure `&self` reads.
#[derive(Debug, Clone)]
pub struct CommitmentTree {
    height: usize,
    hasher: Arc<PoseidonHasher>,
    zeros: Arc<ZeroCache>,
    /// `layers[l]` maps node index to hash at level `l`; leaves live in
    /// `layers[0]`, the root candidate in `layers[height]`.
    layers: Vec<HashMap<u64, Field>>,
    next_index: u64,
}

impl CommitmentTree {
    /// Create an empty tree of the given height.
    ///
    /// The hasher capability is shared, not owned; the zero cache is taken
    /// from the process-wide memo.
    ///
    /// # Errors
    /// - [`TreeError::InvalidHeight`] if `height` is `0` or exceeds
    ///   [`crate::zeros::MAX_TREE_HEIGHT`].
    /// - [`TreeError::Hasher`] / [`TreeError::CachePoisoned`] from zero
    ///   cache construction.
    pub fn new(hasher: Arc<PoseidonHasher>, height: usize) -> Result<Self, TreeError> {
        let zeros = ZeroCache::shared(&hasher, height)?;
        Ok(Self {
            height,
            hasher,
            zeros,
            layers: vec![HashMap::new(); height.saturating_add(1)],
            next_index: 0,
        })
    }

    /// Rebuild a tree by replaying an ordered commitment sequence.
    ///
    /// Replaying the same sequence into the same height always reproduces
    /// the same root and proofs.
    ///
    /// # Errors
    /// As for [`Self::new`] and [`Self::insert`].
    pub fn from_commitments(
        hasher: Arc<PoseidonHasher>,
        height: usize,
        commitments: &[Field],
    ) -> Result<Self, TreeError> {
        let mut tree = Self::new(hasher, height)?;
        for commitment in commitments {
            tree.insert(*commitment)?;
        }
        Ok(tree)
    }

    /// Append a commitment at the next free index and return that index.
    ///
    /// Walks the insertion path level by level, hashing the new node with
    /// its sibling (stored if a descendant leaf was inserted there, the
    /// level's zero hash otherwise). All-or-nothing: the path updates are
    /// staged and applied only once every hash has succeeded.
    ///
    /// # Errors
    /// - [`TreeError::TreeFull`] once `2^height` leaves are present; the
    ///   tree is unchanged.
    /// - [`TreeError::Hasher`] if a node hash fails; the tree is unchanged.
    #[allow(
        clippy::arithmetic_side_effects,
        reason = "Node positions are halved per level and levels are bounded by the height"
    )]
    pub fn insert(&mut self, leaf: Field) -> Result<u64, TreeError> {
        let index = self.next_index;
        if index >= self.capacity() {
            return Err(TreeError::TreeFull(self.capacity()));
        }

        let mut staged = Vec::with_capacity(self.height.saturating_add(1));
        staged.push((0_usize, index, leaf));

        let mut current = leaf;
        let mut position = index;
        for level in 0..self.height {
            let sibling = self.node(level, position ^ 1);
            let (left, right) = if position & 1 == 0 {
                (current, sibling)
            } else {
                (sibling, current)
            };
            current = self.hasher.hash_two(left, right)?;
            position >>= 1;
            staged.push((level + 1, position, current));
        }

        for (level, node_index, value) in staged {
            if let Some(layer) = self.layers.get_mut(level) {
                layer.insert(node_index, value);
            }
        }
        self.next_index = self.next_index.saturating_add(1);
        Ok(index)
    }

    /// The current root: `layers[height][0]`, or the empty root before any
    /// insertion. O(1).
    #[must_use]
    pub fn root(&self) -> Field {
        self.layers
            .get(self.height)
            .and_then(|layer| layer.get(&0))
            .copied()
            .unwrap_or_else(|| self.zeros.empty_root())
    }

    /// Produce the inclusion proof for an inserted leaf.
    ///
    /// # Errors
    /// Returns [`TreeError::IndexOutOfRange`] if `index` was never inserted.
    #[allow(
        clippy::arithmetic_side_effects,
        reason = "Node positions are halved per level and levels are bounded by the height"
    )]
    pub fn proof(&self, index: u64) -> Result<InclusionProof, TreeError> {
        if index >= self.next_index {
            return Err(TreeError::IndexOutOfRange {
                index,
                count: self.next_index,
            });
        }

        let mut path_elements = Vec::with_capacity(self.height);
        let mut path_indices = Vec::with_capacity(self.height);
        let mut position = index;
        for level in 0..self.height {
            path_indices.push(if position & 1 == 0 { 0_u8 } else { 1_u8 });
            path_elements.push(self.node(level, position ^ 1));
            position >>= 1;
        }

        Ok(InclusionProof {
            root: self.root(),
            path_elements,
            path_indices,
        })
    }

    /// Fold an inclusion proof bottom-up from `leaf` and compare the result
    /// against the proof's root.
    ///
    /// # Errors
    /// Propagates hash failures.
    pub fn verify_proof(
        hasher: &PoseidonHasher,
        leaf: Field,
        proof: &InclusionProof,
    ) -> Result<bool, HasherError> {
        let mut current = leaf;
        for (sibling, side) in proof.path_elements.iter().zip(&proof.path_indices) {
            let (left, right) = if *side == 0 {
                (current, *sibling)
            } else {
                (*sibling, current)
            };
            current = hasher.hash_two(left, right)?;
        }
        Ok(current == proof.root)
    }

    /// The leaf stored at `index`.
    ///
    /// # Errors
    /// Returns [`TreeError::IndexOutOfRange`] if `index` was never inserted.
    pub fn leaf(&self, index: u64) -> Result<Field, TreeError> {
        if index >= self.next_index {
            return Err(TreeError::IndexOutOfRange {
                index,
                count: self.next_index,
            });
        }
        Ok(self.node(0, index))
    }

    /// Number of inserted leaves.
    #[must_use]
    pub const fn leaf_count(&self) -> u64 {
        self.next_index
    }

    /// The fixed height of the tree.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Maximum number of leaves, `2^height`.
    #[must_use]
    #[allow(
        clippy::arithmetic_side_effects,
        reason = "Height is bounded by MAX_TREE_HEIGHT (32), so the shift cannot overflow"
    )]
    pub fn capacity(&self) -> u64 {
        1_u64 << self.height
    }

    /// Whether the tree reached capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.next_index >= self.capacity()
    }

    /// The node at (`level`, `position`): stored if an insertion wrote it,
    /// the level's zero hash otherwise.
    fn node(&self, level: usize, position: u64) -> Field {
        self.layers
            .get(level)
            .and_then(|layer| layer.get(&position))
            .copied()
            .or_else(|| self.zeros.level(level))
            // Levels are bounded by the height; the fallback is never taken.
            .unwrap_or_else(empty_leaf)
    }
}
