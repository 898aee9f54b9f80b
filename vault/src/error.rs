use thiserror::Error;

use crate::token::TokenError;

/// Rejection reasons of the vault. The messages are stable: callers and tests
/// match on them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("Vault: Amount must be greater than 0")]
    ZeroAmount,
    #[error("Vault: Amount overflow")]
    AmountOverflow,
    #[error("Vault: Invalid token address")]
    InvalidToken,
    #[error("Vault: Commitment already used")]
    CommitmentAlreadyUsed,
    #[error("Vault: Commitment not found")]
    UnknownCommitment,
    #[error("Vault: Unsupported circuit arity")]
    UnsupportedArity,
    #[error("Vault: Invalid ZK proof")]
    InvalidProof,
    #[error("Vault: {0}")]
    Token(#[from] TokenError),
}
