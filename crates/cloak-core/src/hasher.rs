//! The Poseidon hash capability.
//!
//! The circuit verifies Merkle paths and note openings with the circom
//! parameterisation of Poseidon over BN254, so the host side must hash with
//! exactly the same primitive. Loading the round constants is the only
//! expensive step; it happens once in [`PoseidonHasher::new`] and the
//! resulting value is shared (by `Arc`) with every consumer rather than read
//! from ambient state.

use std::fmt;
use std::sync::Mutex;

use light_poseidon::{Poseidon, PoseidonHasher as _};

use crate::field::Field;

/// Largest input count the capability supports.
///
/// The protocol only ever hashes one input (nullifier hash), two (tree
/// nodes) or three (note commitments).
pub const MAX_HASH_ARITY: usize = 3;

/// Errors from constructing or evaluating the hash capability.
#[derive(Debug, thiserror::Error)]
pub enum HasherError {
    /// Loading the circom round constants failed.
    #[error("poseidon initialization failed for arity {arity}: {message}")]
    InitializationFailed {
        /// The arity whose parameters could not be loaded.
        arity: usize,
        /// The underlying parameter error.
        message: String,
    },

    /// The input count has no matching parameter set.
    #[error("unsupported hash arity {0} (supported: 1..={MAX_HASH_ARITY})")]
    UnsupportedArity(usize),

    /// Poseidon evaluation failed.
    #[error("poseidon evaluation failed: {0}")]
    Evaluation(String),

    /// A hasher mutex was poisoned by a panicking thread.
    #[error("poseidon state poisoned")]
    StatePoisoned,
}

/// A process-wide Poseidon hash capability over [`Field`].
///
/// Construct once, share by reference. Hashing takes `&self` and is safe
/// from concurrent readers; each arity's sponge state sits behind its own
/// mutex.
pub struct PoseidonHasher {
    unary: Mutex<Poseidon<Field>>,
    binary: Mutex<Poseidon<Field>>,
    ternary: Mutex<Poseidon<Field>>,
}

impl PoseidonHasher {
    /// Load circom Poseidon parameters for arities `1..=3`.
    ///
    /// # Errors
    /// Returns [`HasherError::InitializationFailed`] if any parameter set
    /// cannot be constructed.
    pub fn new() -> Result<Self, HasherError> {
        Ok(Self {
            unary: Mutex::new(new_circom_instance(1)?),
            binary: Mutex::new(new_circom_instance(2)?),
            ternary: Mutex::new(new_circom_instance(3)?),
        })
    }

    /// Hash an ordered sequence of field elements.
    ///
    /// Pure with respect to its inputs: the same sequence always produces
    /// the same output, matching the circuit's hash gadget bit-for-bit.
    ///
    /// # Errors
    /// - [`HasherError::UnsupportedArity`] for input counts outside `1..=3`.
    /// - [`HasherError::StatePoisoned`] if a previous caller panicked while
    ///   hashing.
    pub fn hash(&self, inputs: &[Field]) -> Result<Field, HasherError> {
        let cell = match inputs.len() {
            1 => &self.unary,
            2 => &self.binary,
            3 => &self.ternary,
            arity => return Err(HasherError::UnsupportedArity(arity)),
        };
        let mut poseidon = cell.lock().map_err(|_| HasherError::StatePoisoned)?;
        poseidon
            .hash(inputs)
            .map_err(|source| HasherError::Evaluation(source.to_string()))
    }

    /// Hash a `(left, right)` node pair — the tree's combiner.
    ///
    /// # Errors
    /// See [`Self::hash`].
    pub fn hash_two(&self, left: Field, right: Field) -> Result<Field, HasherError> {
        self.hash(&[left, right])
    }
}

impl fmt::Debug for PoseidonHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoseidonHasher").finish_non_exhaustive()
    }
}

fn new_circom_instance(arity: usize) -> Result<Poseidon<Field>, HasherError> {
    Poseidon::<Field>::new_circom(arity).map_err(|source| HasherError::InitializationFailed {
        arity,
        message: source.to_string(),
    })
}
