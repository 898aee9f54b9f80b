//! Ledger side of the shielded vault: token custody, the commitment registry
//! and the deposit / spend entry points that gate every state change on a
//! verified proof.

pub mod error;
pub mod params;
pub mod registry;
pub mod shared;
pub mod token;
pub mod vault;

pub use error::VaultError;
pub use params::{
    DepositCommitmentParams, DepositParams, Receipt, SpendArgs, SpendParams, VaultEvent,
};
pub use registry::{CommitmentEntry, CommitmentRegistry, CommitmentState};
pub use shared::SharedVault;
pub use token::{MockToken, TokenError, TokenLedger};
pub use vault::Vault;
