//! Core of the shielded vault: commitment scheme, circuit family, public
//! signals and the proof pipeline.
//!
//! `no_std` so the same constraint code runs inside the zkVM guest programs
//! and on the host.

#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod circuit;
pub mod commitment;
pub mod field;
pub mod mock;
pub mod pipeline;
pub mod signals;

pub use circuit::{
    synthesize, CircuitInput, CircuitVariant, ConstraintError, DepositWitness, Slot, SpendWitness,
    Witness, DEPOSIT_SLOTS, RANGE_BITS,
};
pub use commitment::{commit, keccak256, Note};
pub use field::Fr;
pub use mock::MockBackend;
pub use pipeline::{to_verifier_call_data, CallData, Pipeline, Proof, ProofError, ProvingBackend};
pub use signals::{decode_public_values, encode_public_values, PublicSignals};
