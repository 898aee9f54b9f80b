//! The vault state machine.
//!
//! Every operation runs all of its checks before its first mutation, so a
//! rejected call leaves balances and the commitment set exactly as they were.

use alloy_primitives::Address;
use shielded_vault_lib::{CallData, CircuitVariant, Fr, Pipeline, Proof, ProvingBackend};
use std::collections::{BTreeSet, HashMap};
use tracing::{error, info, warn};

use crate::error::VaultError;
use crate::params::{DepositParams, Receipt, SpendArgs, SpendParams, VaultEvent};
use crate::registry::{CommitmentRegistry, CommitmentState};
use crate::token::TokenLedger;

macro_rules! spend_entry_points {
    ($($name:ident => $variant:ident, $n:literal, $m:literal;)*) => {
        $(
            #[doc = concat!("`", stringify!($name), "`: spend ", stringify!($n), " notes into ", stringify!($m), ".")]
            pub fn $name(
                &mut self,
                token: Address,
                fee_recipient: Address,
                args: SpendArgs<$n, $m>,
                proof: &Proof,
            ) -> Result<Receipt, VaultError> {
                self.spend(
                    CircuitVariant::$variant,
                    &args.into_params(token, fee_recipient),
                    proof,
                )
            }
        )*
    };
}

pub struct Vault<B, T> {
    /// Custody account holding the pooled tokens
    address: Address,
    pipeline: Pipeline<B>,
    tokens: HashMap<Address, T>,
    registry: CommitmentRegistry,
}

impl<B: ProvingBackend, T: TokenLedger> Vault<B, T> {
    pub fn new(address: Address, pipeline: Pipeline<B>) -> Self {
        Self::with_registry(address, pipeline, CommitmentRegistry::new())
    }

    /// Resume from a persisted commitment set.
    pub fn with_registry(
        address: Address,
        pipeline: Pipeline<B>,
        registry: CommitmentRegistry,
    ) -> Self {
        Vault {
            address,
            pipeline,
            tokens: HashMap::new(),
            registry,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Accept deposits of `token`. The zero address is never a token.
    pub fn register_token(&mut self, token: Address, ledger: T) -> Result<(), VaultError> {
        if token == Address::ZERO {
            return Err(VaultError::InvalidToken);
        }
        self.tokens.insert(token, ledger);
        info!(%token, "token registered");
        Ok(())
    }

    pub fn token(&self, token: Address) -> Option<&T> {
        self.tokens.get(&token)
    }

    pub fn token_mut(&mut self, token: Address) -> Option<&mut T> {
        self.tokens.get_mut(&token)
    }

    pub fn pipeline(&self) -> &Pipeline<B> {
        &self.pipeline
    }

    pub fn registry(&self) -> &CommitmentRegistry {
        &self.registry
    }

    pub fn commitment_state(&self, token: Address, commitment: Fr) -> CommitmentState {
        self.registry.state(token, commitment)
    }

    pub fn is_registered(&self, token: Address, commitment: Fr) -> bool {
        self.commitment_state(token, commitment) == CommitmentState::Registered
    }

    pub fn is_spent(&self, token: Address, commitment: Fr) -> bool {
        self.commitment_state(token, commitment) == CommitmentState::Spent
    }

    /// Standalone verifier entry point for `variant`; touches no state.
    pub fn verify(&self, variant: CircuitVariant, call: &CallData) -> bool {
        self.pipeline.verify_call_data(variant, call)
    }

    // =========================================================================
    //                              DEPOSIT
    // =========================================================================

    /// Pull `total + fee` from `caller`, pay the fee and register the new
    /// commitments.
    pub fn deposit(
        &mut self,
        caller: Address,
        params: &DepositParams,
        proof: &Proof,
    ) -> Result<Receipt, VaultError> {
        let result = self.try_deposit(caller, params, proof);
        match &result {
            Ok(_) => info!(
                token = %params.token,
                %caller,
                total = %params.total_deposit_amount,
                fee = %params.fee,
                "deposit accepted"
            ),
            Err(err) => warn!(token = %params.token, %caller, %err, "deposit rejected"),
        }
        result
    }

    fn try_deposit(
        &mut self,
        caller: Address,
        params: &DepositParams,
        proof: &Proof,
    ) -> Result<Receipt, VaultError> {
        // 1. Business rules, cheapest first
        if params.total_deposit_amount.is_zero() {
            return Err(VaultError::ZeroAmount);
        }
        let pulled = params
            .total_deposit_amount
            .checked_add(params.fee)
            .ok_or(VaultError::AmountOverflow)?;
        if !self.tokens.contains_key(&params.token) {
            return Err(VaultError::InvalidToken);
        }
        self.ensure_absent(params.token, params.commitments())?;

        // 2. Proof over signals re-derived from the plaintext parameters
        let signals = params
            .public_signals()
            .ok_or(VaultError::InvalidProof)?;
        if !self.pipeline.verify(proof, &signals, CircuitVariant::Deposit) {
            return Err(VaultError::InvalidProof);
        }

        // 3. Effects
        let token = self
            .tokens
            .get_mut(&params.token)
            .ok_or(VaultError::InvalidToken)?;
        token.transfer_in(caller, pulled)?;
        if !params.fee.is_zero() {
            // refund restores balances; the spent allowance stays spent
            if let Err(err) = token.transfer_out(params.fee_recipient, params.fee) {
                if let Err(refund) = token.transfer_out(caller, pulled) {
                    error!(%caller, %refund, "refund after failed fee payment failed");
                }
                return Err(err.into());
            }
        }

        let mut events = vec![VaultEvent::Deposit {
            token: params.token,
            depositor: caller,
            total_deposit_amount: params.total_deposit_amount,
            fee: params.fee,
            fee_recipient: params.fee_recipient,
        }];
        for note in &params.deposit_commitment_params {
            self.registry.register(params.token, note.poseidon_hash);
            events.push(VaultEvent::CommitmentCreated {
                token: params.token,
                commitment: note.poseidon_hash,
                owner: note.owner,
                metadata: note.metadata.clone(),
            });
        }
        Ok(Receipt { events })
    }

    // =========================================================================
    //                               SPEND
    // =========================================================================

    /// Consume `inputs_hashes`, create `outputs_hashes` and pay `fee` from the
    /// pool. `variant` must be the spend circuit of exactly this arity.
    pub fn spend(
        &mut self,
        variant: CircuitVariant,
        params: &SpendParams,
        proof: &Proof,
    ) -> Result<Receipt, VaultError> {
        let result = self.try_spend(variant, params, proof);
        match &result {
            Ok(_) => info!(
                token = %params.token,
                circuit = variant.name(),
                fee = %params.fee,
                "spend accepted"
            ),
            Err(err) => warn!(
                token = %params.token,
                circuit = variant.name(),
                %err,
                "spend rejected"
            ),
        }
        result
    }

    fn try_spend(
        &mut self,
        variant: CircuitVariant,
        params: &SpendParams,
        proof: &Proof,
    ) -> Result<Receipt, VaultError> {
        // 1. Business rules
        if variant.is_deposit() || params.variant() != Some(variant) {
            return Err(VaultError::UnsupportedArity);
        }
        if !self.tokens.contains_key(&params.token) {
            return Err(VaultError::InvalidToken);
        }
        let mut seen = BTreeSet::new();
        for commitment in &params.inputs_hashes {
            if !seen.insert(*commitment) {
                return Err(VaultError::CommitmentAlreadyUsed);
            }
            match self.registry.state(params.token, *commitment) {
                CommitmentState::Registered => {}
                CommitmentState::Absent => return Err(VaultError::UnknownCommitment),
                CommitmentState::Spent => return Err(VaultError::CommitmentAlreadyUsed),
            }
        }
        self.ensure_absent_with(params.token, params.outputs_hashes.iter().copied(), seen)?;

        // 2. Proof
        let signals = params
            .public_signals()
            .ok_or(VaultError::InvalidProof)?;
        if !self.pipeline.verify(proof, &signals, variant) {
            return Err(VaultError::InvalidProof);
        }

        // 3. Effects
        if !params.fee.is_zero() {
            let token = self
                .tokens
                .get_mut(&params.token)
                .ok_or(VaultError::InvalidToken)?;
            token.transfer_out(params.fee_recipient, params.fee)?;
        }
        for commitment in &params.inputs_hashes {
            self.registry.mark_spent(params.token, *commitment);
        }
        for commitment in &params.outputs_hashes {
            self.registry.register(params.token, *commitment);
        }

        Ok(Receipt {
            events: vec![VaultEvent::Spend {
                token: params.token,
                variant,
                inputs_hashes: params.inputs_hashes.clone(),
                outputs_hashes: params.outputs_hashes.clone(),
                fee: params.fee,
                fee_recipient: params.fee_recipient,
            }],
        })
    }

    spend_entry_points! {
        spend_11 => Spend11, 1, 1;
        spend_12 => Spend12, 1, 2;
        spend_13 => Spend13, 1, 3;
        spend_21 => Spend21, 2, 1;
        spend_22 => Spend22, 2, 2;
        spend_23 => Spend23, 2, 3;
        spend_31 => Spend31, 3, 1;
        spend_32 => Spend32, 3, 2;
        spend_161 => Spend161, 16, 1;
    }

    // =========================================================================
    //                              HELPERS
    // =========================================================================

    fn ensure_absent(
        &self,
        token: Address,
        commitments: impl Iterator<Item = Fr>,
    ) -> Result<(), VaultError> {
        self.ensure_absent_with(token, commitments, BTreeSet::new())
    }

    /// Every commitment must be unknown to the registry and appear only once,
    /// also counting those already in `seen`.
    fn ensure_absent_with(
        &self,
        token: Address,
        commitments: impl Iterator<Item = Fr>,
        mut seen: BTreeSet<Fr>,
    ) -> Result<(), VaultError> {
        for commitment in commitments {
            if !seen.insert(commitment)
                || self.registry.state(token, commitment) != CommitmentState::Absent
            {
                return Err(VaultError::CommitmentAlreadyUsed);
            }
        }
        Ok(())
    }
}

impl<B, T> std::fmt::Debug for Vault<B, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("address", &self.address)
            .field("tokens", &self.tokens.keys().collect::<Vec<_>>())
            .field("commitments", &self.registry.len())
            .finish()
    }
}
