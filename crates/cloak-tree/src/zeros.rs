//! Precomputed empty-subtree hashes.
//!
//! `zeros[0]` is the empty-leaf constant and `zeros[i] = H(zeros[i-1],
//! zeros[i-1])`, so `zeros[i]` is the root of a fully empty subtree of
//! height `i`. Any tree node that was never written is answered from this
//! table instead of being stored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use ark_ff::Zero;
use cloak_core::field::Field;
use cloak_core::hasher::PoseidonHasher;

use crate::error::TreeError;

/// Largest supported tree height.
///
/// Indices are tracked as `u64`, so heights beyond 32 would only inflate
/// the anonymity set past anything the deployed circuits accept.
pub const MAX_TREE_HEIGHT: usize = 32;

/// The empty-leaf constant hashed into every unpopulated position.
#[must_use]
pub fn empty_leaf() -> Field {
    Field::zero()
}

/// The per-level empty-subtree hash table for one tree height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroCache {
    zeros: Vec<Field>,
}

impl ZeroCache {
    /// Compute the table from scratch: O(height) hash calls.
    ///
    /// # Errors
    /// - [`TreeError::InvalidHeight`] if `height` is `0` or exceeds
    ///   [`MAX_TREE_HEIGHT`].
    /// - [`TreeError::Hasher`] if a level hash fails.
    pub fn build(hasher: &PoseidonHasher, height: usize) -> Result<Self, TreeError> {
        if !(1..=MAX_TREE_HEIGHT).contains(&height) {
            return Err(TreeError::InvalidHeight(height));
        }

        let mut zeros = Vec::with_capacity(height.saturating_add(1));
        let mut current = empty_leaf();
        zeros.push(current);
        for _ in 0..height {
            current = hasher.hash_two(current, current)?;
            zeros.push(current);
        }
        Ok(Self { zeros })
    }

    /// Fetch the memoised table for `height`, computing it on first use.
    ///
    /// The table is cached for the life of the process; repeated calls
    /// after the first return immediately with the shared value.
    ///
    /// # Errors
    /// - [`TreeError::InvalidHeight`] / [`TreeError::Hasher`] as for
    ///   [`Self::build`].
    /// - [`TreeError::CachePoisoned`] if the cache mutex is poisoned.
    pub fn shared(hasher: &PoseidonHasher, height: usize) -> Result<Arc<Self>, TreeError> {
        static CACHE: OnceLock<Mutex<HashMap<usize, Arc<ZeroCache>>>> = OnceLock::new();
        let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));

        if let Some(zeros) = cache
            .lock()
            .map_err(|_| TreeError::CachePoisoned)?
            .get(&height)
            .cloned()
        {
            return Ok(zeros);
        }

        let built = Arc::new(Self::build(hasher, height)?);
        cache
            .lock()
            .map_err(|_| TreeError::CachePoisoned)?
            .insert(height, Arc::clone(&built));
        Ok(built)
    }

    /// The height this table was built for.
    #[must_use]
    pub fn height(&self) -> usize {
        self.zeros.len().saturating_sub(1)
    }

    /// The empty-subtree hash at `level`, if `level <= height`.
    #[must_use]
    pub fn level(&self, level: usize) -> Option<Field> {
        self.zeros.get(level).copied()
    }

    /// The root of a fully empty tree, `zeros[height]`.
    #[must_use]
    pub fn empty_root(&self) -> Field {
        // The table always holds height + 1 entries; the fallback is never
        // taken.
        self.zeros.last().copied().unwrap_or_else(empty_leaf)
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::indexing_slicing,
        clippy::arithmetic_side_effects,
        reason = "Test values are small and bounded"
    )]

    use super::*;

    fn hasher() -> PoseidonHasher {
        PoseidonHasher::new().expect("hasher init failed")
    }

    #[test]
    fn rejects_invalid_heights() {
        let hasher = hasher();
        assert!(matches!(
            ZeroCache::build(&hasher, 0),
            Err(TreeError::InvalidHeight(0))
        ));
        assert!(matches!(
            ZeroCache::build(&hasher, MAX_TREE_HEIGHT + 1),
            Err(TreeError::InvalidHeight(_))
        ));
    }

    #[test]
    fn each_level_doubles_the_previous() {
        let hasher = hasher();
        let cache = ZeroCache::build(&hasher, 4).expect("build failed");

        assert_eq!(cache.height(), 4);
        assert_eq!(cache.level(0), Some(empty_leaf()));
        for level in 1..=4 {
            let below = cache.level(level - 1).expect("missing level");
            let expected = hasher.hash_two(below, below).expect("hash failed");
            assert_eq!(cache.level(level), Some(expected));
        }
        assert_eq!(cache.empty_root(), cache.level(4).expect("missing root"));
        assert_eq!(cache.level(5), None);
    }

    #[test]
    fn matches_naive_full_tree_of_empty_leaves() {
        let hasher = hasher();
        let cache = ZeroCache::build(&hasher, 3).expect("build failed");

        // Hash a complete binary tree of 2^3 empty leaves bottom-up.
        let mut level = vec![empty_leaf(); 8];
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| hasher.hash_two(pair[0], pair[1]).expect("hash failed"))
                .collect();
        }
        assert_eq!(level[0], cache.empty_root());
    }

    #[test]
    fn shared_memoises_per_height() {
        let hasher = hasher();

        let first = ZeroCache::shared(&hasher, 6).expect("shared failed");
        let second = ZeroCache::shared(&hasher, 6).expect("shared failed");
        assert!(Arc::ptr_eq(&first, &second));

        // Memoised state matches a from-scratch rebuild.
        let rebuilt = ZeroCache::build(&hasher, 6).expect("build failed");
        assert_eq!(*first, rebuilt);

        let other = ZeroCache::shared(&hasher, 7).expect("shared failed");
        assert!(!Arc::ptr_eq(&first, &other));
    }
}
