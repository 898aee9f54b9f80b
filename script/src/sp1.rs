//! SP1 zkVM backend: the deposit and spend guests run the constraint system
//! and commit the encoded public values; proofs are Groth16-wrapped.

use shielded_vault_lib::{
    decode_public_values, encode_public_values, CircuitInput, CircuitVariant, Proof, ProofError,
    ProvingBackend, PublicSignals, Witness,
};
use sp1_sdk::{
    include_elf, EnvProver, HashableKey, ProverClient, SP1ProofWithPublicValues, SP1ProvingKey,
    SP1Stdin, SP1VerifyingKey,
};
use std::fmt;
use tracing::{debug, info};

use crate::backend::Execution;

pub const DEPOSIT_ELF: &[u8] = include_elf!("deposit-program");
pub const SPEND_ELF: &[u8] = include_elf!("spend-program");

struct Keys {
    pk: SP1ProvingKey,
    vk: SP1VerifyingKey,
}

pub struct Sp1Backend {
    client: EnvProver,
    deposit: Keys,
    spend: Keys,
}

fn backend_error(err: impl fmt::Display) -> ProofError {
    ProofError::Backend(err.to_string())
}

fn elf(variant: CircuitVariant) -> &'static [u8] {
    if variant.is_deposit() {
        DEPOSIT_ELF
    } else {
        SPEND_ELF
    }
}

fn stdin(variant: CircuitVariant, witness: &Witness) -> SP1Stdin {
    let mut stdin = SP1Stdin::new();
    stdin.write(&CircuitInput {
        variant,
        witness: witness.clone(),
    });
    stdin
}

impl Sp1Backend {
    /// Client configured by `SP1_PROVER` and friends; sets up both guests.
    pub fn from_env() -> Self {
        let client = ProverClient::from_env();
        let (pk, vk) = client.setup(DEPOSIT_ELF);
        let deposit = Keys { pk, vk };
        let (pk, vk) = client.setup(SPEND_ELF);
        let spend = Keys { pk, vk };
        info!(
            deposit_vkey = %deposit.vk.bytes32(),
            spend_vkey = %spend.vk.bytes32(),
            "sp1 guests set up"
        );
        Sp1Backend {
            client,
            deposit,
            spend,
        }
    }

    fn keys(&self, variant: CircuitVariant) -> &Keys {
        if variant.is_deposit() {
            &self.deposit
        } else {
            &self.spend
        }
    }

    pub fn vkey(&self, variant: CircuitVariant) -> String {
        self.keys(variant).vk.bytes32()
    }

    /// Execute the guest without proving.
    pub fn execute(&self, input: &CircuitInput) -> Result<Execution, ProofError> {
        let (public_values, report) = self
            .client
            .execute(elf(input.variant), &stdin(input.variant, &input.witness))
            .run()
            .map_err(backend_error)?;
        let (variant, signals) = decode_public_values(public_values.as_slice())
            .ok_or_else(|| backend_error("guest committed malformed public values"))?;
        if variant != input.variant {
            return Err(backend_error(format!("guest committed {variant}")));
        }
        Ok(Execution {
            signals,
            cycles: Some(report.total_instruction_count()),
        })
    }
}

impl ProvingBackend for Sp1Backend {
    fn prove_witness(
        &self,
        variant: CircuitVariant,
        witness: &Witness,
        signals: &PublicSignals,
    ) -> Result<Proof, ProofError> {
        debug!(circuit = variant.name(), "generating groth16 proof");
        let proof = self
            .client
            .prove(&self.keys(variant).pk, &stdin(variant, witness))
            .groth16()
            .run()
            .map_err(backend_error)?;
        if proof.public_values.as_slice() != encode_public_values(variant, signals).as_slice() {
            return Err(backend_error("guest committed different public values"));
        }
        let bytes = bincode::serialize(&proof).map_err(backend_error)?;
        Ok(Proof(bytes))
    }

    fn verify_proof(&self, variant: CircuitVariant, proof: &Proof, signals: &PublicSignals) -> bool {
        let Ok(proof) = bincode::deserialize::<SP1ProofWithPublicValues>(proof.as_bytes()) else {
            return false;
        };
        if proof.public_values.as_slice() != encode_public_values(variant, signals).as_slice() {
            return false;
        }
        self.client.verify(&proof, &self.keys(variant).vk).is_ok()
    }
}

impl fmt::Debug for Sp1Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sp1Backend")
            .field("deposit_vkey", &self.deposit.vk.bytes32())
            .field("spend_vkey", &self.spend.vk.bytes32())
            .finish()
    }
}
