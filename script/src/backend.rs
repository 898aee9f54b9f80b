use shielded_vault_lib::{
    synthesize, CircuitInput, CircuitVariant, MockBackend, Proof, ProofError, ProvingBackend,
    PublicSignals, Witness,
};

/// The backend picked at runtime.
#[derive(Debug)]
pub enum Backend {
    Mock(MockBackend),
    #[cfg(feature = "sp1")]
    Sp1(Box<crate::sp1::Sp1Backend>),
}

/// Result of running a circuit without proving it.
#[derive(Debug, Clone)]
pub struct Execution {
    pub signals: PublicSignals,
    /// zkVM cycles, when the backend executes a guest
    pub cycles: Option<u64>,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Mock(_) => "mock",
            #[cfg(feature = "sp1")]
            Backend::Sp1(_) => "sp1",
        }
    }

    /// Run the circuit for `input` and return its public signals.
    pub fn execute(&self, input: &CircuitInput) -> Result<Execution, ProofError> {
        match self {
            Backend::Mock(_) => Ok(Execution {
                signals: synthesize(input.variant, &input.witness)?,
                cycles: None,
            }),
            #[cfg(feature = "sp1")]
            Backend::Sp1(sp1) => sp1.execute(input),
        }
    }

    /// Verification key of `variant`, when the backend has one.
    #[cfg_attr(not(feature = "sp1"), allow(unused_variables))]
    pub fn vkey(&self, variant: CircuitVariant) -> Option<String> {
        match self {
            Backend::Mock(_) => None,
            #[cfg(feature = "sp1")]
            Backend::Sp1(sp1) => Some(sp1.vkey(variant)),
        }
    }
}

impl ProvingBackend for Backend {
    fn prove_witness(
        &self,
        variant: CircuitVariant,
        witness: &Witness,
        signals: &PublicSignals,
    ) -> Result<Proof, ProofError> {
        match self {
            Backend::Mock(mock) => mock.prove_witness(variant, witness, signals),
            #[cfg(feature = "sp1")]
            Backend::Sp1(sp1) => sp1.prove_witness(variant, witness, signals),
        }
    }

    fn verify_proof(&self, variant: CircuitVariant, proof: &Proof, signals: &PublicSignals) -> bool {
        match self {
            Backend::Mock(mock) => mock.verify_proof(variant, proof, signals),
            #[cfg(feature = "sp1")]
            Backend::Sp1(sp1) => sp1.verify_proof(variant, proof, signals),
        }
    }
}
