//! Proof pipeline: witness -> (proof, public signals) -> verification.
//!
//! The proving system itself is a black box behind [`ProvingBackend`]. The
//! pipeline runs the constraint system before handing anything to the
//! backend, so an unsatisfiable witness fails fast and never produces a proof.

use alloc::string::String;
use alloc::vec::Vec;
use alloy_primitives::{Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::circuit::{synthesize, CircuitVariant, ConstraintError, Witness};
use crate::field::Fr;
use crate::signals::PublicSignals;

/// Opaque proof bytes. Their layout belongs to the backend that made them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Proof(pub Vec<u8>);

impl Proof {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProofError {
    /// The witness does not satisfy the circuit.
    Constraint(ConstraintError),
    /// The proving backend failed for a reason of its own.
    Backend(String),
}

impl From<ConstraintError> for ProofError {
    fn from(err: ConstraintError) -> Self {
        ProofError::Constraint(err)
    }
}

impl fmt::Display for ProofError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofError::Constraint(err) => write!(f, "unsatisfiable witness: {err}"),
            ProofError::Backend(msg) => write!(f, "proving backend: {msg}"),
        }
    }
}

impl core::error::Error for ProofError {}

/// Capability interface of a proving system.
///
/// `prove_witness` receives the public signals the pipeline derived so that a
/// backend executing the circuit itself can check it arrived at the same
/// vector. `verify_proof` must be pure and deterministic.
pub trait ProvingBackend {
    fn prove_witness(
        &self,
        variant: CircuitVariant,
        witness: &Witness,
        signals: &PublicSignals,
    ) -> Result<Proof, ProofError>;

    fn verify_proof(&self, variant: CircuitVariant, proof: &Proof, signals: &PublicSignals)
        -> bool;
}

impl<B: ProvingBackend + ?Sized> ProvingBackend for &B {
    fn prove_witness(
        &self,
        variant: CircuitVariant,
        witness: &Witness,
        signals: &PublicSignals,
    ) -> Result<Proof, ProofError> {
        (**self).prove_witness(variant, witness, signals)
    }

    fn verify_proof(
        &self,
        variant: CircuitVariant,
        proof: &Proof,
        signals: &PublicSignals,
    ) -> bool {
        (**self).verify_proof(variant, proof, signals)
    }
}

/// Stateless glue between the circuit family and a backend.
#[derive(Clone, Debug, Default)]
pub struct Pipeline<B> {
    backend: B,
}

impl<B: ProvingBackend> Pipeline<B> {
    pub fn new(backend: B) -> Self {
        Pipeline { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Produce a proof for `witness` under `variant`.
    pub fn prove(
        &self,
        witness: &Witness,
        variant: CircuitVariant,
    ) -> Result<(Proof, PublicSignals), ProofError> {
        let signals = synthesize(variant, witness)?;
        let proof = self.backend.prove_witness(variant, witness, &signals)?;
        Ok((proof, signals))
    }

    /// True iff `proof` attests that some satisfying witness of `variant`
    /// yields exactly `signals`.
    pub fn verify(&self, proof: &Proof, signals: &PublicSignals, variant: CircuitVariant) -> bool {
        if signals.len() != variant.signal_count() {
            return false;
        }
        self.backend.verify_proof(variant, proof, signals)
    }

    /// Verify arguments laid out for the verifier entry point.
    pub fn verify_call_data(&self, variant: CircuitVariant, call: &CallData) -> bool {
        match call.public_signals() {
            Some(signals) => self.verify(&call.proof(), &signals, variant),
            None => false,
        }
    }
}

// =============================================================================
//                          VERIFIER CALL DATA
// =============================================================================

sol! {
    /// Verifier entry point shared by every circuit variant.
    function verifyProof(bytes proof, uint256[] public_signals) external view returns (bool);
}

/// Proof and signals in the argument layout of `verifyProof(bytes,uint256[])`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallData {
    pub proof: Bytes,
    pub public_signals: Vec<U256>,
}

impl CallData {
    pub fn proof(&self) -> Proof {
        Proof(self.proof.to_vec())
    }

    /// `None` if any word is not a canonical field element.
    pub fn public_signals(&self) -> Option<PublicSignals> {
        self.public_signals
            .iter()
            .map(|w| Fr::from_canonical(*w))
            .collect::<Option<Vec<_>>>()
            .map(PublicSignals::new)
    }

    /// ABI-encoded call including the 4-byte selector.
    pub fn abi_encode(&self) -> Vec<u8> {
        verifyProofCall {
            proof: self.proof.clone(),
            public_signals: self.public_signals.clone(),
        }
        .abi_encode()
    }
}

/// Reformat a proof and its signals for the verifier. No cryptography here.
pub fn to_verifier_call_data(proof: &Proof, signals: &PublicSignals) -> CallData {
    CallData {
        proof: Bytes::copy_from_slice(proof.as_bytes()),
        public_signals: signals.as_slice().iter().map(Fr::value).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::Note;
    use crate::mock::MockBackend;

    fn note(amount: u64, seed: u64) -> Note {
        Note::new(amount, Fr::from(seed))
    }

    #[test]
    fn test_prove_then_verify() {
        let pipeline = Pipeline::new(MockBackend::default());
        let witness = Witness::spend(&[note(1010, 1)], &[note(1000, 2)], 10u64);
        let (proof, signals) = pipeline.prove(&witness, CircuitVariant::Spend11).unwrap();
        assert!(pipeline.verify(&proof, &signals, CircuitVariant::Spend11));
        // verification is repeatable
        assert!(pipeline.verify(&proof, &signals, CircuitVariant::Spend11));
    }

    #[test]
    fn test_unsatisfiable_witness_yields_no_proof() {
        let pipeline = Pipeline::new(MockBackend::default());
        let witness = Witness::spend(&[note(1000, 1)], &[note(1000, 2)], 10u64);
        assert_eq!(
            pipeline.prove(&witness, CircuitVariant::Spend11),
            Err(ProofError::Constraint(ConstraintError::SumMismatch))
        );
    }

    #[test]
    fn test_verify_rejects_wrong_signal_count() {
        let pipeline = Pipeline::new(MockBackend::default());
        let witness = Witness::spend(&[note(1010, 1)], &[note(1000, 2)], 10u64);
        let (proof, signals) = pipeline.prove(&witness, CircuitVariant::Spend11).unwrap();
        assert!(!pipeline.verify(&proof, &signals, CircuitVariant::Spend12));
        assert!(!pipeline.verify(&proof, &PublicSignals::default(), CircuitVariant::Spend11));
    }

    #[test]
    fn test_call_data_round_trip() {
        let pipeline = Pipeline::new(MockBackend::default());
        let witness = Witness::deposit(&[note(1, 1), note(2, 2), note(3, 3)]);
        let (proof, signals) = pipeline.prove(&witness, CircuitVariant::Deposit).unwrap();
        let call = to_verifier_call_data(&proof, &signals);
        assert_eq!(call.public_signals.len(), 4);
        assert_eq!(call.public_signals[3], U256::from(6u64));
        assert!(pipeline.verify_call_data(CircuitVariant::Deposit, &call));

        let encoded = call.abi_encode();
        assert_eq!(&encoded[..4], verifyProofCall::SELECTOR.as_slice());
    }

    #[test]
    fn test_call_data_rejects_non_canonical_signal() {
        let pipeline = Pipeline::new(MockBackend::default());
        let witness = Witness::deposit(&[note(1, 1), note(2, 2), note(3, 3)]);
        let (proof, signals) = pipeline.prove(&witness, CircuitVariant::Deposit).unwrap();
        let mut call = to_verifier_call_data(&proof, &signals);
        call.public_signals[3] += crate::field::MODULUS;
        assert!(!pipeline.verify_call_data(CircuitVariant::Deposit, &call));
    }
}
