//! Fungible-token collaborator.
//!
//! The vault only needs atomic debit/credit against its own custody account;
//! everything else about the token is out of its hands.

use alloy_primitives::{Address, U256};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: U256, required: U256 },
    #[error("insufficient allowance: have {available}, need {required}")]
    InsufficientAllowance { available: U256, required: U256 },
}

/// A token as seen from the vault's custody account. Each call either applies
/// completely or fails without changing any balance.
///
/// Allowance spent by `transfer_in` is not restored by a later `transfer_out`
/// to the same account: when a deposit pulls funds and then fails to pay its
/// fee, the caller gets the funds back but must re-approve before retrying.
pub trait TokenLedger {
    /// Pull `amount` from `from` into custody, spending `from`'s allowance.
    fn transfer_in(&mut self, from: Address, amount: U256) -> Result<(), TokenError>;

    /// Pay `amount` out of custody to `to`.
    fn transfer_out(&mut self, to: Address, amount: U256) -> Result<(), TokenError>;

    fn balance_of(&self, account: Address) -> U256;
}

/// In-memory ERC20-style token whose allowances all point at one custodian.
#[derive(Debug, Clone, Default)]
pub struct MockToken {
    custodian: Address,
    balances: HashMap<Address, U256>,
    /// owner -> amount the custodian may pull
    allowances: HashMap<Address, U256>,
}

impl MockToken {
    pub fn new(custodian: Address) -> Self {
        MockToken {
            custodian,
            ..Default::default()
        }
    }

    pub fn custodian(&self) -> Address {
        self.custodian
    }

    pub fn mint(&mut self, to: Address, amount: U256) {
        *self.balances.entry(to).or_default() += amount;
    }

    /// `owner` lets the custodian pull up to `amount`; replaces any previous value.
    pub fn approve(&mut self, owner: Address, amount: U256) {
        self.allowances.insert(owner, amount);
    }

    pub fn allowance(&self, owner: Address) -> U256 {
        self.allowances.get(&owner).copied().unwrap_or_default()
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        self.balances.insert(from, available - amount);
        *self.balances.entry(to).or_default() += amount;
        Ok(())
    }
}

impl TokenLedger for MockToken {
    fn transfer_in(&mut self, from: Address, amount: U256) -> Result<(), TokenError> {
        let allowed = self.allowance(from);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                available: allowed,
                required: amount,
            });
        }
        self.move_balance(from, self.custodian, amount)?;
        self.allowances.insert(from, allowed - amount);
        Ok(())
    }

    fn transfer_out(&mut self, to: Address, amount: U256) -> Result<(), TokenError> {
        self.move_balance(self.custodian, to, amount)
    }

    fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }
}
