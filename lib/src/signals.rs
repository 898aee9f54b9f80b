//! Public signal vectors.
//!
//! The order is fixed per circuit variant and must be reproduced exactly by
//! the ledger when it re-derives the signals from plaintext parameters:
//!
//!   deposit: [hashes[0], hashes[1], hashes[2], total]
//!   spend:   [inputs_hashes[0..N], outputs_hashes[0..M], fee]

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::circuit::CircuitVariant;
use crate::field::Fr;

/// Ordered public outputs of one circuit instance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicSignals(Vec<Fr>);

impl PublicSignals {
    pub fn new(signals: Vec<Fr>) -> Self {
        PublicSignals(signals)
    }

    pub fn deposit(hashes: &[Fr], total: Fr) -> Self {
        let mut signals = Vec::with_capacity(hashes.len() + 1);
        signals.extend_from_slice(hashes);
        signals.push(total);
        PublicSignals(signals)
    }

    pub fn spend(inputs_hashes: &[Fr], outputs_hashes: &[Fr], fee: Fr) -> Self {
        let mut signals = Vec::with_capacity(inputs_hashes.len() + outputs_hashes.len() + 1);
        signals.extend_from_slice(inputs_hashes);
        signals.extend_from_slice(outputs_hashes);
        signals.push(fee);
        PublicSignals(signals)
    }

    pub fn as_slice(&self) -> &[Fr] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Spent commitments; empty for deposit.
    pub fn input_hashes(&self, variant: CircuitVariant) -> &[Fr] {
        self.0.get(..variant.inputs()).unwrap_or(&[])
    }

    /// Created commitments (for deposit, the note hashes).
    pub fn output_hashes(&self, variant: CircuitVariant) -> &[Fr] {
        let start = variant.inputs();
        self.0
            .get(start..start + variant.outputs())
            .unwrap_or(&[])
    }

    /// Trailing scalar: fee for spends, total amount for deposit.
    fn trailing(&self, variant: CircuitVariant) -> Option<Fr> {
        if self.0.len() != variant.signal_count() {
            return None;
        }
        self.0.last().copied()
    }

    pub fn fee(&self, variant: CircuitVariant) -> Option<Fr> {
        if variant.is_deposit() {
            return None;
        }
        self.trailing(variant)
    }

    pub fn total(&self, variant: CircuitVariant) -> Option<Fr> {
        if !variant.is_deposit() {
            return None;
        }
        self.trailing(variant)
    }

    /// One 32-byte big-endian word per signal.
    pub fn to_words(&self) -> Vec<[u8; 32]> {
        self.0.iter().map(Fr::to_be_bytes).collect()
    }

    /// Inverse of [`to_words`](Self::to_words). Rejects non-canonical words.
    pub fn from_words(words: &[[u8; 32]]) -> Option<Self> {
        words
            .iter()
            .map(|w| Fr::from_canonical(alloy_primitives::U256::from_be_bytes(*w)))
            .collect::<Option<Vec<_>>>()
            .map(PublicSignals)
    }
}

// =============================================================================
//                        COMMITTED PUBLIC VALUES
// =============================================================================

/// Encode what a guest program commits: a 32-byte word whose last byte is the
/// variant tag, followed by one word per signal.
///
/// Arity alone does not identify a variant (1-in/2-out and 2-in/1-out both
/// carry four signals), so the tag is part of what the proof attests.
pub fn encode_public_values(variant: CircuitVariant, signals: &PublicSignals) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 * (signals.len() + 1));
    let mut tag = [0u8; 32];
    tag[31] = variant.id();
    out.extend_from_slice(&tag);
    for word in signals.to_words() {
        out.extend_from_slice(&word);
    }
    out
}

/// Inverse of [`encode_public_values`].
pub fn decode_public_values(bytes: &[u8]) -> Option<(CircuitVariant, PublicSignals)> {
    if bytes.len() % 32 != 0 || bytes.len() < 32 {
        return None;
    }
    let mut words = bytes.chunks_exact(32).map(|chunk| {
        let mut word = [0u8; 32];
        word.copy_from_slice(chunk);
        word
    });
    let tag = words.next()?;
    if tag[..31].iter().any(|b| *b != 0) {
        return None;
    }
    let variant = CircuitVariant::from_id(tag[31])?;
    let signals = PublicSignals::from_words(&words.collect::<Vec<_>>())?;
    if signals.len() != variant.signal_count() {
        return None;
    }
    Some((variant, signals))
}
