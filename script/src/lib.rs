//! Host-side tooling for the shielded vault: backend selection, configuration,
//! note bookkeeping and the proof file format shared by the binaries.

pub mod backend;
pub mod config;
#[cfg(feature = "sp1")]
pub mod sp1;
pub mod wallet;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use shielded_vault_lib::{decode_public_values, CircuitVariant, Proof, PublicSignals};

/// Proof file written by `prove` and read by `verify` / `calldata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofOutput {
    pub circuit: CircuitVariant,
    /// Hex-encoded backend proof bytes
    pub proof: String,
    /// Hex-encoded public values (variant tag word, then one word per signal)
    pub public_values: String,
    /// Decoded public signals, for humans
    pub public_signals: PublicSignals,
    /// Hex-encoded verification key, when the backend has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vkey: Option<String>,
}

impl ProofOutput {
    /// Proof bytes and signals, checked against the encoded public values.
    pub fn decode(&self) -> Result<(Proof, PublicSignals)> {
        let proof = decode_hex(&self.proof).context("invalid proof hex")?;
        let values = decode_hex(&self.public_values).context("invalid public values hex")?;
        let (variant, signals) =
            decode_public_values(&values).context("malformed public values")?;
        ensure!(
            variant == self.circuit,
            "public values are for {variant}, file says {}",
            self.circuit
        );
        ensure!(
            signals == self.public_signals,
            "public_signals do not match public_values"
        );
        Ok((Proof(proof), signals))
    }
}

/// Decode a hex string with or without `0x` prefix.
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    Ok(hex::decode(s)?)
}

/// Decode a 32-byte hex string (with or without 0x prefix) into [u8; 32].
pub fn decode_hex_32(s: &str) -> Result<[u8; 32]> {
    let bytes = decode_hex(s)?;
    ensure!(bytes.len() == 32, "expected 32 bytes, got {}", bytes.len());
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}
