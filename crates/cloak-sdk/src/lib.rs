//! Workflow glue over the Cloak core crates.
//!
//! Assembles the proof-input bundle handed to the external prover and
//! validates local tree state against an authoritative ledger. Everything
//! on-chain (deposits, root registration, proof verification) and the
//! proving subsystem itself live behind external collaborators.

/// Proof-input bundle assembly.
pub mod bundle;
/// Deterministic tree rebuild from ledger state.
pub mod rebuild;

pub use bundle::{BundleError, WithdrawProofInputs, WithdrawRequest};
pub use rebuild::{RebuildError, rebuild_from_ledger};
