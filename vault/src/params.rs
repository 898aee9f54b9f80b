use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use shielded_vault_lib::{CircuitVariant, Fr, PublicSignals};

/// One note created by a deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositCommitmentParams {
    pub poseidon_hash: Fr,
    /// Account the note is announced to
    pub owner: Address,
    /// Opaque payload for the owner (e.g. the encrypted note opening)
    pub metadata: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositParams {
    pub token: Address,
    pub total_deposit_amount: U256,
    pub deposit_commitment_params: Vec<DepositCommitmentParams>,
    pub fee: U256,
    pub fee_recipient: Address,
}

impl DepositParams {
    pub fn commitments(&self) -> impl Iterator<Item = Fr> + '_ {
        self.deposit_commitment_params
            .iter()
            .map(|p| p.poseidon_hash)
    }

    /// Public signals the deposit proof must attest to. `None` if the total
    /// cannot be a field element, in which case no proof can match.
    pub fn public_signals(&self) -> Option<PublicSignals> {
        let total = Fr::from_canonical(self.total_deposit_amount)?;
        let hashes: Vec<Fr> = self.commitments().collect();
        Some(PublicSignals::deposit(&hashes, total))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendParams {
    pub token: Address,
    pub inputs_hashes: Vec<Fr>,
    pub outputs_hashes: Vec<Fr>,
    pub fee: U256,
    pub fee_recipient: Address,
}

impl SpendParams {
    pub fn public_signals(&self) -> Option<PublicSignals> {
        let fee = Fr::from_canonical(self.fee)?;
        Some(PublicSignals::spend(
            &self.inputs_hashes,
            &self.outputs_hashes,
            fee,
        ))
    }

    /// The compiled variant matching this arity, if any.
    pub fn variant(&self) -> Option<CircuitVariant> {
        CircuitVariant::spend(self.inputs_hashes.len(), self.outputs_hashes.len())
    }
}

/// Fixed-arity arguments of the `spend_<N><M>` entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendArgs<const N: usize, const M: usize> {
    pub inputs_hashes: [Fr; N],
    pub outputs_hashes: [Fr; M],
    pub fee: U256,
}

impl<const N: usize, const M: usize> SpendArgs<N, M> {
    pub fn into_params(self, token: Address, fee_recipient: Address) -> SpendParams {
        SpendParams {
            token,
            inputs_hashes: self.inputs_hashes.to_vec(),
            outputs_hashes: self.outputs_hashes.to_vec(),
            fee: self.fee,
            fee_recipient,
        }
    }
}

// =============================================================================
//                               EVENTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VaultEvent {
    Deposit {
        token: Address,
        depositor: Address,
        total_deposit_amount: U256,
        fee: U256,
        fee_recipient: Address,
    },
    CommitmentCreated {
        token: Address,
        commitment: Fr,
        owner: Address,
        metadata: Bytes,
    },
    Spend {
        token: Address,
        variant: CircuitVariant,
        inputs_hashes: Vec<Fr>,
        outputs_hashes: Vec<Fr>,
        fee: U256,
        fee_recipient: Address,
    },
}

/// Events emitted by one accepted operation, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub events: Vec<VaultEvent>,
}
