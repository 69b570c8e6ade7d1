//! The proof-input bundle handed to the external prover.
//!
//! The shape, field names and value encodings of [`WithdrawProofInputs`]
//! are a fixed contract with the withdrawal circuit: field elements travel
//! as decimal strings of their canonical residue, path indicators as `0`/`1`
//! integers. Do not reorder or rename.

use cloak_core::field::{DecimalStr, Field};
use cloak_core::note::Note;
use cloak_tree::InclusionProof;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

/// Errors from assembling a proof-input bundle.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// The note was never accepted into a tree.
    #[error("note has no leaf index; insert its commitment before proving")]
    NoteNotInserted,
}

/// Public withdrawal parameters chosen by the caller.
///
/// `recipient` and `relayer` are addresses already mapped into the field by
/// the caller (the mapping is chain-specific and out of scope here).
#[derive(Debug, Clone, Copy)]
pub struct WithdrawRequest {
    /// Withdrawal recipient.
    pub recipient: Field,
    /// Relayer submitting the transaction, zero when self-relaying.
    pub relayer: Field,
    /// Fee paid to the relayer.
    pub relayer_fee: Field,
    /// Minimum swap output the withdrawal insists on.
    pub swap_amount_out: Field,
}

/// Everything the external prover needs to build a withdrawal proof.
///
/// Contains the note's private fields; treat a serialized bundle with the
/// same care as the note itself.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawProofInputs {
    /// Root of the anonymity-set tree the proof is anchored to.
    #[serde_as(as = "DecimalStr")]
    pub merkle_root: Field,
    /// Public nullifier hash, `H(nullifier)`.
    #[serde_as(as = "DecimalStr")]
    pub nullifier_hash: Field,
    /// Withdrawal recipient.
    #[serde_as(as = "DecimalStr")]
    pub recipient: Field,
    /// Relayer address.
    #[serde_as(as = "DecimalStr")]
    pub relayer: Field,
    /// Relayer fee.
    #[serde_as(as = "DecimalStr")]
    pub relayer_fee: Field,
    /// Minimum swap output.
    #[serde_as(as = "DecimalStr")]
    pub swap_amount_out: Field,
    /// Private spending secret.
    #[serde_as(as = "DecimalStr")]
    pub secret: Field,
    /// Private nullifier preimage.
    #[serde_as(as = "DecimalStr")]
    pub nullifier: Field,
    /// Deposited amount.
    #[serde_as(as = "DecimalStr")]
    pub deposit_amount: Field,
    /// Sibling hashes from leaf to root.
    #[serde_as(as = "Vec<DecimalStr>")]
    pub path_elements: Vec<Field>,
    /// Left/right indicators from leaf to root.
    pub path_indices: Vec<u8>,
}

impl WithdrawProofInputs {
    /// Pair a note's private fields with its inclusion proof and the public
    /// withdrawal parameters.
    ///
    /// # Errors
    /// Returns [`BundleError::NoteNotInserted`] if the note's commitment
    /// has not been accepted into a tree yet.
    pub fn assemble(
        note: &Note,
        proof: &InclusionProof,
        request: &WithdrawRequest,
    ) -> Result<Self, BundleError> {
        if note.leaf_index().is_none() {
            return Err(BundleError::NoteNotInserted);
        }

        Ok(Self {
            merkle_root: proof.root,
            nullifier_hash: note.nullifier_hash(),
            recipient: request.recipient,
            relayer: request.relayer,
            relayer_fee: request.relayer_fee,
            swap_amount_out: request.swap_amount_out,
            secret: note.secret(),
            nullifier: note.nullifier(),
            deposit_amount: note.amount(),
            path_elements: proof.path_elements.clone(),
            path_indices: proof.path_indices.clone(),
        })
    }
}
