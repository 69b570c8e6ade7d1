//! Deposit-note derivation.
//!
//! A note is the private record behind one deposit: two uniformly random
//! field elements (`secret`, `nullifier`) and the deposited amount, plus the
//! two public values derived from them. The note is created once, owned
//! exclusively by its creator, and leaves the process only as explicit
//! private circuit inputs.

use std::fmt;

use rand_core::{OsRng, RngCore};

use crate::field::{Field, field_from_bytes_be};
use crate::hasher::{HasherError, PoseidonHasher};

/// Errors from deriving or updating a note.
#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    /// The secure random source could not be read.
    #[error("secure randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    /// The leaf index was already recorded for this note.
    #[error("leaf index already assigned")]
    LeafIndexAssigned,

    /// Hashing the note contents failed.
    #[error(transparent)]
    Hasher(#[from] HasherError),
}

/// A private deposit record and its public derivatives.
///
/// Invariants: `commitment = H(nullifier, secret, amount)` and
/// `nullifier_hash = H(nullifier)`. The commitment is published when the
/// deposit is accepted; everything else stays private.
#[derive(Clone)]
pub struct Note {
    secret: Field,
    nullifier: Field,
    amount: Field,
    commitment: Field,
    nullifier_hash: Field,
    leaf_index: Option<u64>,
}

impl Note {
    /// Derive a fresh note for the given deposit amount.
    ///
    /// `secret` and `nullifier` are drawn independently from the OS entropy
    /// source as 256-bit values reduced into the field.
    ///
    /// # Errors
    /// - [`NoteError::RandomnessUnavailable`] if the entropy source fails.
    /// - [`NoteError::Hasher`] if commitment derivation fails.
    pub fn derive(hasher: &PoseidonHasher, amount: Field) -> Result<Self, NoteError> {
        let secret = random_field_element()?;
        let nullifier = random_field_element()?;
        Self::from_parts(hasher, secret, nullifier, amount)
    }

    /// Rebuild a note from its private parts.
    ///
    /// Deterministic: the same `(secret, nullifier, amount)` always yields
    /// the same commitment and nullifier hash. Used when restoring a note
    /// the caller persisted elsewhere.
    ///
    /// # Errors
    /// Returns [`NoteError::Hasher`] if commitment derivation fails.
    pub fn from_parts(
        hasher: &PoseidonHasher,
        secret: Field,
        nullifier: Field,
        amount: Field,
    ) -> Result<Self, NoteError> {
        let commitment = hasher.hash(&[nullifier, secret, amount])?;
        let nullifier_hash = hasher.hash(&[nullifier])?;
        Ok(Self {
            secret,
            nullifier,
            amount,
            commitment,
            nullifier_hash,
            leaf_index: None,
        })
    }

    /// The private spending secret.
    #[must_use]
    pub const fn secret(&self) -> Field {
        self.secret
    }

    /// The private nullifier preimage.
    #[must_use]
    pub const fn nullifier(&self) -> Field {
        self.nullifier
    }

    /// The deposited amount.
    #[must_use]
    pub const fn amount(&self) -> Field {
        self.amount
    }

    /// The public commitment, `H(nullifier, secret, amount)`.
    #[must_use]
    pub const fn commitment(&self) -> Field {
        self.commitment
    }

    /// The public nullifier hash, `H(nullifier)`.
    #[must_use]
    pub const fn nullifier_hash(&self) -> Field {
        self.nullifier_hash
    }

    /// The leaf index assigned when the commitment entered the tree.
    #[must_use]
    pub const fn leaf_index(&self) -> Option<u64> {
        self.leaf_index
    }

    /// Record the tree index this note's commitment was inserted at.
    ///
    /// A note enters exactly one tree exactly once.
    ///
    /// # Errors
    /// Returns [`NoteError::LeafIndexAssigned`] if an index was already
    /// recorded.
    pub fn assign_leaf_index(&mut self, index: u64) -> Result<(), NoteError> {
        if self.leaf_index.is_some() {
            return Err(NoteError::LeafIndexAssigned);
        }
        self.leaf_index = Some(index);
        Ok(())
    }
}

impl fmt::Debug for Note {
    /// Redacts the private fields; a note must never leak through logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("secret", &"<redacted>")
            .field("nullifier", &"<redacted>")
            .field("amount", &self.amount)
            .field("commitment", &self.commitment)
            .field("nullifier_hash", &self.nullifier_hash)
            .field("leaf_index", &self.leaf_index)
            .finish()
    }
}

fn random_field_element() -> Result<Field, NoteError> {
    let mut bytes = [0_u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|source| NoteError::RandomnessUnavailable(source.to_string()))?;
    Ok(field_from_bytes_be(&bytes))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::field::encode_decimal;

    fn hasher() -> PoseidonHasher {
        PoseidonHasher::new().expect("hasher init failed")
    }

    #[test]
    fn from_parts_is_reproducible() {
        let hasher = hasher();
        let secret = Field::from(111_u64);
        let nullifier = Field::from(222_u64);
        let amount = Field::from(1_000_000_u64);

        let a = Note::from_parts(&hasher, secret, nullifier, amount).expect("derive failed");
        let b = Note::from_parts(&hasher, secret, nullifier, amount).expect("derive failed");

        assert_eq!(a.commitment(), b.commitment());
        assert_eq!(a.nullifier_hash(), b.nullifier_hash());
        assert_eq!(
            encode_decimal(&a.commitment()),
            encode_decimal(&b.commitment())
        );
    }

    #[test]
    fn commitment_binds_all_three_inputs() {
        let hasher = hasher();
        let base = Note::from_parts(
            &hasher,
            Field::from(1_u64),
            Field::from(2_u64),
            Field::from(3_u64),
        )
        .expect("derive failed");

        let other_secret = Note::from_parts(
            &hasher,
            Field::from(9_u64),
            Field::from(2_u64),
            Field::from(3_u64),
        )
        .expect("derive failed");
        let other_amount = Note::from_parts(
            &hasher,
            Field::from(1_u64),
            Field::from(2_u64),
            Field::from(9_u64),
        )
        .expect("derive failed");

        assert_ne!(base.commitment(), other_secret.commitment());
        assert_ne!(base.commitment(), other_amount.commitment());
        // The nullifier hash ignores secret and amount.
        assert_eq!(base.nullifier_hash(), other_secret.nullifier_hash());
    }

    #[test]
    fn derived_notes_do_not_collide() {
        let hasher = hasher();
        let amount = Field::from(100_u64);
        let mut commitments = HashSet::new();
        let mut nullifier_hashes = HashSet::new();

        for _ in 0..10_000 {
            let note = Note::derive(&hasher, amount).expect("derive failed");
            assert!(commitments.insert(encode_decimal(&note.commitment())));
            assert!(nullifier_hashes.insert(encode_decimal(&note.nullifier_hash())));
        }
    }

    #[test]
    fn leaf_index_is_assigned_once() {
        let hasher = hasher();
        let mut note = Note::derive(&hasher, Field::from(5_u64)).expect("derive failed");
        assert_eq!(note.leaf_index(), None);

        note.assign_leaf_index(7).expect("first assignment failed");
        assert_eq!(note.leaf_index(), Some(7));

        assert!(matches!(
            note.assign_leaf_index(8),
            Err(NoteError::LeafIndexAssigned)
        ));
        assert_eq!(note.leaf_index(), Some(7));
    }

    #[test]
    fn debug_output_redacts_private_fields() {
        let hasher = hasher();
        let secret = Field::from(987_654_321_987_654_321_u64);
        let nullifier = Field::from(123_456_789_123_456_789_u64);
        let note =
            Note::from_parts(&hasher, secret, nullifier, Field::from(1_u64)).expect("derive failed");

        let rendered = format!("{note:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("987654321987654321"));
        assert!(!rendered.contains("123456789123456789"));
    }
}
