use alloy_primitives::Address;
use shielded_vault_lib::{CircuitVariant, Proof, ProvingBackend};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::VaultError;
use crate::params::{DepositParams, Receipt, SpendParams};
use crate::token::TokenLedger;
use crate::vault::Vault;

/// A vault shared between threads. State-changing calls are applied one at a
/// time, so two spends racing on one commitment cannot both succeed.
pub struct SharedVault<B, T> {
    inner: Arc<Mutex<Vault<B, T>>>,
}

impl<B, T> Clone for SharedVault<B, T> {
    fn clone(&self) -> Self {
        SharedVault {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: ProvingBackend, T: TokenLedger> SharedVault<B, T> {
    pub fn new(vault: Vault<B, T>) -> Self {
        SharedVault {
            inner: Arc::new(Mutex::new(vault)),
        }
    }

    pub fn deposit(
        &self,
        caller: Address,
        params: &DepositParams,
        proof: &Proof,
    ) -> Result<Receipt, VaultError> {
        self.lock().deposit(caller, params, proof)
    }

    pub fn spend(
        &self,
        variant: CircuitVariant,
        params: &SpendParams,
        proof: &Proof,
    ) -> Result<Receipt, VaultError> {
        self.lock().spend(variant, params, proof)
    }

    /// Run `f` with exclusive access to the vault.
    pub fn with<R>(&self, f: impl FnOnce(&mut Vault<B, T>) -> R) -> R {
        f(&mut self.lock())
    }

    // vault calls never panic between their first and last write
    fn lock(&self) -> MutexGuard<'_, Vault<B, T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
