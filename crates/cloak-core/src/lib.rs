//! Cloak base primitives.
//!
//! This crate holds the pieces every other Cloak crate builds on: the BN254
//! scalar-field codec used on the circuit boundary, the Poseidon hash
//! capability, and deposit-note derivation.

/// BN254 scalar-field type and its decimal-string codec.
pub mod field;
/// The Poseidon hash capability shared by notes and trees.
pub mod hasher;
/// Deposit-note derivation and lifecycle.
pub mod note;

pub use field::{DecimalStr, Field, FieldError, decode_decimal, encode_decimal};
pub use hasher::{HasherError, PoseidonHasher};
pub use note::{Note, NoteError};
