//! Deterministic tree rebuild from an external ledger.
//!
//! The ledger (an on-chain contract, an indexer dump) is the authority on
//! which commitments were accepted and in which order. Replaying that
//! sequence locally must reproduce the ledger's registered root exactly; a
//! mismatched rebuild must never be used for proof generation.

use std::sync::Arc;

use cloak_core::field::{Field, encode_decimal};
use cloak_core::hasher::PoseidonHasher;
use cloak_tree::{CommitmentTree, TreeError};

/// Errors from rebuilding a tree against a ledger root.
#[derive(Debug, thiserror::Error)]
pub enum RebuildError {
    /// Replaying the ledger produced a different root.
    #[error("rebuilt root {actual} does not match ledger root {expected}")]
    RootMismatch {
        /// The root the ledger registered (decimal).
        expected: String,
        /// The root the replay produced (decimal).
        actual: String,
    },

    /// Tree construction or insertion failed.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Replay the ledger's ordered commitments and check the resulting root.
///
/// # Errors
/// - [`RebuildError::RootMismatch`] if the replayed root differs from
///   `expected_root`.
/// - [`RebuildError::Tree`] if construction or an insertion fails (for
///   example when the ledger holds more commitments than `2^height`).
pub fn rebuild_from_ledger(
    hasher: Arc<PoseidonHasher>,
    height: usize,
    commitments: &[Field],
    expected_root: Field,
) -> Result<CommitmentTree, RebuildError> {
    tracing::debug!(
        height,
        commitments = commitments.len(),
        "replaying ledger commitments"
    );

    let tree = CommitmentTree::from_commitments(hasher, height, commitments)?;
    let actual = tree.root();
    if actual != expected_root {
        tracing::warn!(
            expected = %encode_decimal(&expected_root),
            actual = %encode_decimal(&actual),
            "rebuilt tree does not match the ledger root"
        );
        return Err(RebuildError::RootMismatch {
            expected: encode_decimal(&expected_root),
            actual: encode_decimal(&actual),
        });
    }

    tracing::info!(leaves = tree.leaf_count(), "local tree matches the ledger");
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Arc<PoseidonHasher> {
        Arc::new(PoseidonHasher::new().expect("hasher init failed"))
    }

    #[test]
    fn reproduces_a_recorded_root() {
        let hasher = hasher();
        let commitments: Vec<Field> = (1_u64..=5).map(Field::from).collect();

        let original = CommitmentTree::from_commitments(Arc::clone(&hasher), 4, &commitments)
            .expect("tree creation failed");
        let recorded_root = original.root();

        let rebuilt = rebuild_from_ledger(Arc::clone(&hasher), 4, &commitments, recorded_root)
            .expect("rebuild failed");
        assert_eq!(rebuilt.root(), recorded_root);
        assert_eq!(rebuilt.leaf_count(), 5);
    }

    #[test]
    fn mismatched_roots_are_rejected() {
        let hasher = hasher();
        let commitments: Vec<Field> = (1_u64..=3).map(Field::from).collect();

        let result =
            rebuild_from_ledger(Arc::clone(&hasher), 4, &commitments, Field::from(42_u64));
        assert!(matches!(result, Err(RebuildError::RootMismatch { .. })));
    }

    #[test]
    fn oversized_ledgers_fail_as_tree_errors() {
        let hasher = hasher();
        let commitments: Vec<Field> = (1_u64..=5).map(Field::from).collect();

        let result = rebuild_from_ledger(
            Arc::clone(&hasher),
            2,
            &commitments,
            Field::from(0_u64),
        );
        assert!(matches!(
            result,
            Err(RebuildError::Tree(TreeError::TreeFull(4)))
        ));
    }
}
