use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

use crate::field::Fr;

// =============================================================================
//                          KECCAK256 HELPERS
// =============================================================================

/// Compute keccak256 hash. This matches Solidity's keccak256() opcode.
/// Note: tiny_keccak::Keccak is the original Keccak-256 (NOT SHA3-256).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

// =============================================================================
//                          COMMITMENT SCHEME
// =============================================================================

/// Bind an amount and a blinding value into one public field element.
///
/// commitment = keccak256(amount_be_32bytes || entropy_be_32bytes) mod p
///
/// No range check happens here: an out-of-range amount still commits, and it
/// is the circuit that refuses to accept it.
pub fn commit(amount: Fr, entropy: Fr) -> Fr {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(&amount.to_be_bytes());
    preimage[32..].copy_from_slice(&entropy.to_be_bytes());
    Fr::from_be_bytes_reduced(keccak256(&preimage))
}

// =============================================================================
//                              NOTE TYPE
// =============================================================================

/// The private opening of a commitment. Whoever knows it owns the value.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    /// Token amount, expected to fit in `RANGE_BITS`
    pub amount: Fr,
    /// Random blinding factor for hiding
    pub entropy: Fr,
}

impl Note {
    pub fn new(amount: impl Into<Fr>, entropy: Fr) -> Self {
        Note {
            amount: amount.into(),
            entropy,
        }
    }

    pub fn commitment(&self) -> Fr {
        commit(self.amount, self.entropy)
    }
}
