//! Keccak-based mock of a proving backend for tests and local runs.
//!
//! A "proof" is a keyed keccak transcript over the variant tag and the
//! committed public values. The backend re-executes the constraint system
//! before attesting, exactly as a zkVM guest would, so it never attests to an
//! unsatisfiable witness. It hides nothing and its soundness is only as good
//! as the secrecy of the setup key; do not use it outside development.

use alloc::format;
use alloc::vec::Vec;

use crate::circuit::{synthesize, CircuitVariant, Witness};
use crate::commitment::keccak256;
use crate::pipeline::{Proof, ProofError, ProvingBackend};
use crate::signals::{encode_public_values, PublicSignals};

const DOMAIN: &[u8] = b"shielded-vault.mock-proof.v1";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockBackend {
    setup_key: [u8; 32],
}

impl MockBackend {
    pub fn new(setup_key: [u8; 32]) -> Self {
        MockBackend { setup_key }
    }

    fn attest(&self, variant: CircuitVariant, signals: &PublicSignals) -> [u8; 32] {
        let public_values = encode_public_values(variant, signals);
        let mut transcript = Vec::with_capacity(DOMAIN.len() + 32 + public_values.len());
        transcript.extend_from_slice(DOMAIN);
        transcript.extend_from_slice(&self.setup_key);
        transcript.extend_from_slice(&public_values);
        keccak256(&transcript)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        MockBackend::new(keccak256(b"shielded-vault.mock-setup"))
    }
}

impl ProvingBackend for MockBackend {
    fn prove_witness(
        &self,
        variant: CircuitVariant,
        witness: &Witness,
        signals: &PublicSignals,
    ) -> Result<Proof, ProofError> {
        let executed = synthesize(variant, witness)?;
        if &executed != signals {
            return Err(ProofError::Backend(format!(
                "{variant}: executed public signals differ from the requested ones"
            )));
        }
        Ok(Proof(self.attest(variant, &executed).to_vec()))
    }

    fn verify_proof(
        &self,
        variant: CircuitVariant,
        proof: &Proof,
        signals: &PublicSignals,
    ) -> bool {
        let expected = self.attest(variant, signals);
        // constant-time comparison
        proof.as_bytes().len() == expected.len()
            && proof
                .as_bytes()
                .iter()
                .zip(expected.iter())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}
