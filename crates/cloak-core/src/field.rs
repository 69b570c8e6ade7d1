//! The prime-field domain shared with the external circuit.
//!
//! Every value Cloak stores, hashes or hands to the prover is a residue in
//! `[0, p)` where `p` is the BN254 scalar-field modulus. On the circuit
//! boundary residues travel as decimal strings of their canonical
//! representative; this module owns that codec.

use std::str::FromStr;

use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use serde::Deserialize;

/// The circuit's scalar field.
///
/// The choice of BN254 is a compatibility contract with the external proving
/// system, not a tunable parameter.
pub type Field = ark_bn254::Fr;

/// Errors from decoding a field element.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// The input is not a decimal integer.
    #[error("invalid decimal field encoding: {0}")]
    Parse(#[from] num_bigint::ParseBigIntError),

    /// The input is a well-formed integer but not a canonical residue.
    #[error("value is not a canonical residue: {0} >= field modulus")]
    NotCanonical(String),
}

/// Encode a field element as the decimal string of its canonical residue.
#[must_use]
pub fn encode_decimal(value: &Field) -> String {
    BigUint::from_bytes_be(&value.into_bigint().to_bytes_be()).to_str_radix(10)
}

/// Decode a decimal string into a field element.
///
/// Only canonical residues are accepted: the external verifier compares
/// residues bit-for-bit, so a non-canonical encoding of the same class must
/// be rejected rather than silently reduced.
///
/// # Errors
/// - [`FieldError::Parse`] if the input is not a decimal integer.
/// - [`FieldError::NotCanonical`] if the value is `>=` the field modulus.
pub fn decode_decimal(text: &str) -> Result<Field, FieldError> {
    let value = BigUint::from_str(text)?;
    if value >= field_modulus() {
        return Err(FieldError::NotCanonical(text.to_owned()));
    }
    Ok(Field::from_be_bytes_mod_order(&value.to_bytes_be()))
}

/// Reduce a big-endian byte draw into the field.
///
/// A 256-bit draw against the ~254-bit modulus carries negligible modulo
/// bias, which is the accepted trade-off for note randomness.
#[must_use]
pub fn field_from_bytes_be(bytes: &[u8]) -> Field {
    Field::from_be_bytes_mod_order(bytes)
}

fn field_modulus() -> BigUint {
    BigUint::from_bytes_be(&<Field as PrimeField>::MODULUS.to_bytes_be())
}

/// A `serde_as` adapter serialising a [`Field`] as its decimal string.
///
/// This is the wire form the proof-input bundle uses.
pub struct DecimalStr;

impl serde_with::SerializeAs<Field> for DecimalStr {
    fn serialize_as<S>(value: &Field, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&encode_decimal(value))
    }
}

impl<'de> serde_with::DeserializeAs<'de, Field> for DecimalStr {
    fn deserialize_as<D>(deserializer: D) -> Result<Field, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        decode_decimal(&text).map_err(serde::de::Error::custom)
    }
}
