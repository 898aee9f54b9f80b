//! SP1 Deposit Circuit: split a public total into three shielded notes.
//!
//! Proves:
//! - Each note hash == commit(amount, entropy)
//! - Each amount and the total fit in RANGE_BITS (no wrapped negatives)
//! - Sum of note amounts == total deposit amount
//!
//! Public values committed (160 bytes = 5 x 32-byte words):
//!   [variant tag, hash0, hash1, hash2, total]

#![no_main]
sp1_zkvm::entrypoint!(main);

use shielded_vault_lib::{encode_public_values, synthesize, CircuitInput};

pub fn main() {
    // 1. Read the witness from the prover (host)
    let input = sp1_zkvm::io::read::<CircuitInput>();
    assert!(input.variant.is_deposit(), "deposit program got {}", input.variant);

    // 2. Enforce the constraint system
    let signals = match synthesize(input.variant, &input.witness) {
        Ok(signals) => signals,
        Err(err) => panic!("unsatisfiable deposit witness: {err}"),
    };

    // 3. Commit public values
    sp1_zkvm::io::commit_slice(&encode_public_values(input.variant, &signals));
}
